//! Events emitted to the host application's observability collaborator.
use std::{collections::HashSet, sync::Mutex};

use derive_more::From;
use serde::{Deserialize, Serialize};

use crate::Context;

/// An observable outcome of evaluation.
#[derive(Debug, Clone, PartialEq, From)]
pub enum Event {
    /// Recoverable reference problem. Emitted once per key for the lifetime of the client.
    Warning(Warning),
    /// Malformed feature data. The affected feature evaluates as disabled.
    Error(EvaluationError),
    /// One evaluation of a feature that opted into impression data.
    Impression(ImpressionEvent),
}

/// Reference problems that are skipped (missing strategy) or fail closed (missing dependency or
/// segment).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Warning {
    #[error(
        "Missing strategy \"{strategy}\" for toggle \"{feature}\". Ensure that \"{}\" are supported before using this toggle",
        .strategies.join(", ")
    )]
    MissingStrategy {
        strategy: String,
        feature: String,
        /// Names of all strategies the feature references.
        strategies: Vec<String>,
    },

    #[error("Missing dependency \"{parent}\" for toggle \"{feature}\"")]
    MissingDependency { parent: String, feature: String },

    #[error("Missing segment {segment} for toggle \"{feature}\"")]
    MissingSegment { segment: u64, feature: String },
}

/// Malformed feature data.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum EvaluationError {
    /// The feature's strategies field is not a list.
    #[error("Malformed feature \"{feature}\", strategies not an array, is {found}")]
    MalformedFeature { feature: String, found: String },
}

/// Kind of call that produced an impression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImpressionKind {
    IsEnabled,
    GetVariant,
}

/// Audit record of one `is_enabled`/`get_variant` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpressionEvent {
    pub event_type: ImpressionKind,
    pub feature_name: String,
    pub context: Context,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

/// Receives [`Event`]s. Called synchronously from the evaluating thread, so implementations
/// should hand events off rather than perform I/O.
///
/// Closures implement this trait:
/// ```
/// # use toggle_engine::{ClientConfig, Event};
/// let client = ClientConfig::new()
///     .event_listener(|event: Event| println!("{event:?}"))
///     .to_client();
/// ```
pub trait EventListener {
    fn on_event(&self, event: Event);
}

pub(crate) struct NoopEventListener;
impl EventListener for NoopEventListener {
    fn on_event(&self, _event: Event) {}
}

impl<T: Fn(Event)> EventListener for T {
    fn on_event(&self, event: Event) {
        self(event);
    }
}

/// Set of keys already warned about. Entries are never evicted.
#[derive(Debug, Default)]
pub(crate) struct WarnOnce {
    seen: Mutex<HashSet<String>>,
}

impl WarnOnce {
    /// Record `key`, returning `true` the first time it is seen.
    pub(crate) fn first_time(&self, key: String) -> bool {
        match self.seen.lock() {
            Ok(mut seen) => seen.insert(key),
            // A poisoned lock only means a listener panicked mid-warning; warning again is
            // harmless.
            Err(poisoned) => poisoned.into_inner().insert(key),
        }
    }
}
