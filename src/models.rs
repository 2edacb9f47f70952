//! Feature definitions as served by the feature API.
//!
//! The engine only ever reads these. They are owned by a [`Snapshot`](crate::Snapshot) and are
//! immutable once published.
use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a [`Segment`].
pub type SegmentId = u64;

/// Strategy parameters. Scalar values are normalized to strings on deserialization.
pub type Parameters = HashMap<String, String>;

/// Full set of feature definitions and segments, as served by the feature API.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClientFeatures {
    #[serde(default = "default_version")]
    pub version: u32,
    pub features: Vec<FeatureDefinition>,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

fn default_version() -> u32 {
    1
}

/// `TryParse` allows the subfield to fail parsing without failing the parsing of the whole
/// structure.
///
/// Used for a feature's strategy list: a malformed list disables that one feature instead of
/// rejecting the whole snapshot.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum TryParse<T> {
    /// Successfully parsed.
    Parsed(T),
    /// Parsing failed.
    ParseFailed(serde_json::Value),
}

impl<T> From<T> for TryParse<T> {
    fn from(value: T) -> Self {
        TryParse::Parsed(value)
    }
}

/// A named, independently evaluable feature toggle.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeatureDefinition {
    pub name: String,
    pub enabled: bool,
    /// Strategies in precedence order. A missing or non-list value parses as
    /// [`TryParse::ParseFailed`].
    #[serde(default = "missing_strategies")]
    pub strategies: TryParse<Vec<StrategySelector>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variants: Option<Vec<VariantDefinition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<ParentDependency>>,
    #[serde(default)]
    pub impression_data: bool,
}

fn missing_strategies() -> TryParse<Vec<StrategySelector>> {
    TryParse::ParseFailed(serde_json::Value::Null)
}

impl FeatureDefinition {
    /// Create an enabled feature without strategies.
    pub fn new(name: impl Into<String>) -> FeatureDefinition {
        FeatureDefinition {
            name: name.into(),
            enabled: true,
            strategies: TryParse::Parsed(Vec::new()),
            variants: None,
            dependencies: None,
            impression_data: false,
        }
    }

    pub(crate) fn has_dependencies(&self) -> bool {
        self.dependencies.as_ref().is_some_and(|d| !d.is_empty())
    }
}

/// Reference from a feature to a strategy implementation, with its configuration.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StrategySelector {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_parameters")]
    pub parameters: Parameters,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    #[serde(default)]
    pub segments: Vec<SegmentId>,
    /// Strategy-scoped variants, selected as part of strategy success.
    #[serde(default)]
    pub variants: Vec<VariantDefinition>,
}

impl StrategySelector {
    /// Create a selector for the named strategy with the given parameters.
    pub fn new<K, V>(name: impl Into<String>, parameters: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        StrategySelector {
            name: name.into(),
            parameters: parameters
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..StrategySelector::default()
        }
    }
}

/// Accepts strings, numbers and booleans as parameter values. Nulls are dropped.
fn deserialize_parameters<'de, D>(deserializer: D) -> Result<Parameters, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<HashMap<String, serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| {
            let value = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => return None,
                other => other.to_string(),
            };
            Some((key, value))
        })
        .collect())
}

/// A reusable, named bundle of constraints.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: SegmentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

/// `Constraint` is a check that the given context field matches `values` (or `value`) under the
/// given `operator`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    pub context_name: String,
    pub operator: Operator,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub case_insensitive: bool,
    #[serde(default)]
    pub inverted: bool,
}

impl Constraint {
    /// Create a constraint matching against a list of values.
    pub fn new<S: Into<String>>(
        context_name: impl Into<String>,
        operator: Operator,
        values: impl IntoIterator<Item = S>,
    ) -> Constraint {
        Constraint {
            context_name: context_name.into(),
            operator,
            values: values.into_iter().map(Into::into).collect(),
            value: None,
            case_insensitive: false,
            inverted: false,
        }
    }

    /// Create a constraint matching against a single value (numeric, date and semver operators).
    pub fn single(
        context_name: impl Into<String>,
        operator: Operator,
        value: impl Into<String>,
    ) -> Constraint {
        Constraint {
            value: Some(value.into()),
            ..Constraint::new(context_name, operator, Vec::<String>::new())
        }
    }
}

/// Possible constraint operators.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    /// Context value is one of `values`.
    In,
    /// Context value is not one of `values`. Absent values are never in the list.
    NotIn,
    StrStartsWith,
    StrEndsWith,
    StrContains,
    NumEq,
    NumGt,
    NumGte,
    NumLt,
    NumLte,
    /// Current time is after the RFC 3339 `value`.
    DateAfter,
    /// Current time is before the RFC 3339 `value`.
    DateBefore,
    SemverEq,
    SemverGt,
    SemverLt,
    /// An operator this version does not know. Never matches.
    #[serde(other)]
    Unknown,
}

/// Requirement on a parent feature.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParentDependency {
    pub feature: String,
    /// `Some(false)` requires the parent to be disabled. Anything else requires it enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// If non-empty, the parent must resolve to one of these variants.
    #[serde(default)]
    pub variants: Vec<String>,
}

/// One weighted variant option of a feature or strategy.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VariantDefinition {
    pub name: String,
    pub weight: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stickiness: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    #[serde(default)]
    pub overrides: Vec<Override>,
}

impl VariantDefinition {
    /// Create a variant without payload, stickiness or overrides.
    pub fn new(name: impl Into<String>, weight: u32) -> VariantDefinition {
        VariantDefinition {
            name: name.into(),
            weight,
            stickiness: None,
            payload: None,
            overrides: Vec::new(),
        }
    }
}

/// Forces a variant when the context field has one of `values`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Override {
    pub context_name: String,
    pub values: Vec<String>,
}

/// Typed value attached to a variant.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Payload {
    #[serde(rename = "type")]
    pub payload_type: PayloadType,
    pub value: String,
}

/// Type of a [`Payload`] value. The value itself is always transported as a string.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PayloadType {
    String,
    Json,
    Csv,
    Number,
}
