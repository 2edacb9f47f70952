use crate::{models::Parameters, sharder::normalized_strategy_value, Context};

use super::{parameter, percentage, Strategy};

/// Percentage rollout by session id. Not registered by default.
pub struct GradualRolloutSessionIdStrategy;

impl Strategy for GradualRolloutSessionIdStrategy {
    fn name(&self) -> &str {
        "gradualRolloutSessionId"
    }

    fn is_enabled(&self, parameters: &Parameters, context: &Context) -> bool {
        let Some(session_id) = context.resolve("sessionId") else {
            return false;
        };
        let percentage = percentage(parameters, "percentage");
        let group_id = parameter(parameters, "groupId").unwrap_or_default();

        percentage > 0.0 && f64::from(normalized_strategy_value(&session_id, group_id)) <= percentage
    }
}
