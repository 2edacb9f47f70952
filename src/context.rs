use std::{borrow::Cow, collections::HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request-scoped input to evaluation.
///
/// Well-known fields are resolved first; anything else is looked up in `properties`. Empty
/// strings are treated the same as absent values.
///
/// # Examples
/// ```
/// # use toggle_engine::Context;
/// let context = Context {
///     user_id: Some("user-1".into()),
///     ..Context::default()
/// }
/// .with_property("tenant", "acme");
///
/// assert_eq!(context.resolve("userId").as_deref(), Some("user-1"));
/// assert_eq!(context.resolve("tenant").as_deref(), Some("acme"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    /// Time used by date constraints. Defaults to the time of evaluation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_time: Option<DateTime<Utc>>,
    /// Name of the feature being evaluated. Filled in by the client when not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_toggle: Option<String>,
    /// Custom fields.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, String>,
}

impl Context {
    /// Add a custom property.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Resolve a context field by name, falling back to the custom properties.
    pub fn resolve(&self, field: &str) -> Option<Cow<'_, str>> {
        let well_known = match field {
            "userId" => self.user_id.as_deref(),
            "sessionId" => self.session_id.as_deref(),
            "remoteAddress" => self.remote_address.as_deref(),
            "environment" => self.environment.as_deref(),
            "appName" => self.app_name.as_deref(),
            "featureToggle" => self.feature_toggle.as_deref(),
            "currentTime" => {
                if let Some(time) = self.current_time {
                    return Some(Cow::Owned(time.to_rfc3339()));
                }
                None
            }
            _ => None,
        };

        well_known
            .or_else(|| self.properties.get(field).map(String::as_str))
            .filter(|value| !value.is_empty())
            .map(Cow::Borrowed)
    }

    /// Return a context that carries `feature_name` as the `featureToggle` field.
    ///
    /// Borrows `self` when the field is already set.
    pub(crate) fn for_feature(&self, feature_name: &str) -> Cow<'_, Context> {
        if self.feature_toggle.is_some() {
            Cow::Borrowed(self)
        } else {
            let mut context = self.clone();
            context.feature_toggle = Some(feature_name.to_owned());
            Cow::Owned(context)
        }
    }
}
