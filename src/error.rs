use std::sync::Arc;

/// Represents a result type for fallible setup operations of the engine.
///
/// Evaluation itself never fails: data-quality problems degrade to the safest default and are
/// reported as [`Event`](crate::Event)s instead.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while setting up the engine.
#[derive(thiserror::Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// A strategy was registered without a name. This is a programming error in the host
    /// application and is reported at construction time.
    #[error("invalid strategy registration: strategy name must not be empty (got {name:?})")]
    InvalidStrategy {
        /// The offending name.
        name: String,
    },

    /// Feature definitions could not be parsed.
    #[error("error parsing feature definitions")]
    // serde_json::Error is not clonable, so we're wrapping it in an Arc.
    Json(#[source] Arc<serde_json::Error>),
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(Arc::new(value))
    }
}
