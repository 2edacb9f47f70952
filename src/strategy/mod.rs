//! Strategies decide, from parameters and context, whether a feature is active.
//!
//! Implement [`Strategy`] and register it with
//! [`ClientConfig::strategy`](crate::ClientConfig::strategy) to add custom strategies.
use std::sync::Arc;

use crate::{
    constraints::ConstraintSource,
    models::{Parameters, VariantDefinition},
    variant::{select_variant_definition, Variant},
    Context,
};

mod application_hostname;
mod default;
mod flexible_rollout;
mod gradual_rollout_session_id;
mod remote_address;
mod user_with_id;

pub use application_hostname::ApplicationHostnameStrategy;
pub use default::DefaultStrategy;
pub use flexible_rollout::FlexibleRolloutStrategy;
pub use gradual_rollout_session_id::GradualRolloutSessionIdStrategy;
pub use remote_address::RemoteAddressStrategy;
pub use user_with_id::UserWithIdStrategy;

/// Outcome of one strategy.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StrategyResult {
    pub enabled: bool,
    /// Variant selected from the strategy-scoped variants, if any.
    pub variant: Option<Variant>,
}

impl StrategyResult {
    pub fn enabled() -> StrategyResult {
        StrategyResult {
            enabled: true,
            variant: None,
        }
    }

    pub fn disabled() -> StrategyResult {
        StrategyResult::default()
    }
}

/// A named predicate over strategy parameters and the request context.
pub trait Strategy: Send + Sync {
    /// Name features use to reference this strategy. Must not be empty.
    fn name(&self) -> &str;

    /// Return `true` if the strategy is active for `context`. Missing parameters must be treated
    /// as `0` or empty rather than causing a panic.
    fn is_enabled(&self, parameters: &Parameters, context: &Context) -> bool;

    /// Evaluate constraints, then the predicate, then pick a strategy-scoped variant.
    ///
    /// A single `None` among the constraints (an unresolvable segment) fails the strategy.
    fn get_result(
        &self,
        parameters: &Parameters,
        context: &Context,
        constraints: ConstraintSource<'_>,
        variants: &[VariantDefinition],
    ) -> StrategyResult {
        if !constraints.all_satisfied(context) || !self.is_enabled(parameters, context) {
            return StrategyResult::disabled();
        }

        let Some(first) = variants.first() else {
            return StrategyResult::enabled();
        };

        let group_id = parameter(parameters, "groupId")
            .or(context.feature_toggle.as_deref())
            .unwrap_or_default();
        let stickiness = first
            .stickiness
            .as_deref()
            .or_else(|| parameter(parameters, "stickiness"));

        StrategyResult {
            enabled: true,
            variant: select_variant_definition(group_id, stickiness, variants, context)
                .map(|definition| Variant::from_definition(definition, true)),
        }
    }
}

/// Strategies every client supports out of the box.
pub fn default_strategies() -> Vec<Arc<dyn Strategy>> {
    vec![
        Arc::new(DefaultStrategy),
        Arc::new(ApplicationHostnameStrategy::new()),
        Arc::new(UserWithIdStrategy),
        Arc::new(RemoteAddressStrategy),
        Arc::new(FlexibleRolloutStrategy::new()),
    ]
}

/// Non-empty parameter value.
pub(crate) fn parameter<'a>(parameters: &'a Parameters, name: &str) -> Option<&'a str> {
    parameters
        .get(name)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

/// Numeric parameter value, `0` when missing or unparsable.
pub(crate) fn percentage(parameters: &Parameters, name: &str) -> f64 {
    parameter(parameters, name)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0.0)
}

/// Non-empty entries of a comma-separated parameter value, trimmed.
pub(crate) fn list<'a>(parameters: &'a Parameters, name: &str) -> impl Iterator<Item = &'a str> {
    parameter(parameters, name)
        .into_iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
}
