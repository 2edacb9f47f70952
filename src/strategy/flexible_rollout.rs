use std::borrow::Cow;

use rand::Rng;

use crate::{models::Parameters, sharder::normalized_strategy_value, Context};

use super::{parameter, percentage, Strategy};

type RandomGenerator = Box<dyn Fn() -> String + Send + Sync>;

/// Percentage rollout with configurable stickiness.
///
/// Parameters: `rollout` (0-100), `stickiness` (`default`, `random` or a context field name) and
/// `groupId` (defaults to the feature name).
pub struct FlexibleRolloutStrategy {
    random: RandomGenerator,
}

impl FlexibleRolloutStrategy {
    pub fn new() -> Self {
        Self::with_random_generator(|| rand::thread_rng().gen_range(1..=10_000).to_string())
    }

    /// Use `random` whenever stickiness falls back to a random identity.
    pub fn with_random_generator(random: impl Fn() -> String + Send + Sync + 'static) -> Self {
        FlexibleRolloutStrategy {
            random: Box::new(random),
        }
    }

    fn resolve_stickiness<'a>(&self, stickiness: &str, context: &'a Context) -> Option<Cow<'a, str>> {
        match stickiness {
            "default" => context
                .resolve("userId")
                .or_else(|| context.resolve("sessionId"))
                .or_else(|| Some(Cow::Owned((self.random)()))),
            "random" => Some(Cow::Owned((self.random)())),
            field => context.resolve(field),
        }
    }
}

impl Default for FlexibleRolloutStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for FlexibleRolloutStrategy {
    fn name(&self) -> &str {
        "flexibleRollout"
    }

    fn is_enabled(&self, parameters: &Parameters, context: &Context) -> bool {
        let group_id = parameter(parameters, "groupId")
            .or(context.feature_toggle.as_deref())
            .unwrap_or_default();
        let rollout = percentage(parameters, "rollout");
        let stickiness = parameter(parameters, "stickiness").unwrap_or("default");

        let Some(identity) = self
            .resolve_stickiness(stickiness, context)
            .filter(|identity| !identity.is_empty())
        else {
            return false;
        };

        rollout > 0.0 && f64::from(normalized_strategy_value(&identity, group_id)) <= rollout
    }
}
