use crate::{models::Parameters, Context};

use super::{list, Strategy};

/// Active for the users listed in the comma-separated `userIds` parameter.
pub struct UserWithIdStrategy;

impl Strategy for UserWithIdStrategy {
    fn name(&self) -> &str {
        "userWithId"
    }

    fn is_enabled(&self, parameters: &Parameters, context: &Context) -> bool {
        let Some(user_id) = context.user_id.as_deref() else {
            return false;
        };
        list(parameters, "userIds").any(|id| id == user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> Context {
        Context {
            user_id: Some(id.to_owned()),
            ..Context::default()
        }
    }

    #[test]
    fn matches_listed_users() {
        let parameters: Parameters = [("userIds".to_owned(), "u1, u2,u3".to_owned())].into();

        assert!(UserWithIdStrategy.is_enabled(&parameters, &user("u1")));
        assert!(UserWithIdStrategy.is_enabled(&parameters, &user("u2")));
        assert!(UserWithIdStrategy.is_enabled(&parameters, &user("u3")));
        assert!(!UserWithIdStrategy.is_enabled(&parameters, &user("u9")));
        assert!(!UserWithIdStrategy.is_enabled(&parameters, &Context::default()));
    }

    #[test]
    fn missing_parameter() {
        assert!(!UserWithIdStrategy.is_enabled(&Parameters::new(), &user("u1")));
    }
}
