//! Weighted, sticky variant selection.
use std::borrow::Cow;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    models::{FeatureDefinition, Override, Payload, VariantDefinition},
    sharder::normalized_variant_value,
    Context,
};

/// Context fields tried, in order, by the `default` stickiness.
const DEFAULT_STICKINESS_FIELDS: [&str; 3] = ["userId", "sessionId", "remoteAddress"];

/// Result of variant evaluation.
///
/// `enabled` tells whether a real variant was selected; `feature_enabled` carries the state of
/// the feature itself. The two differ when an enabled feature falls back to the disabled variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub name: String,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    #[serde(default)]
    pub feature_enabled: bool,
}

impl Variant {
    /// The default fallback variant.
    pub fn disabled() -> Variant {
        Variant {
            name: "disabled".to_owned(),
            enabled: false,
            payload: None,
            feature_enabled: false,
        }
    }

    pub(crate) fn from_definition(definition: &VariantDefinition, feature_enabled: bool) -> Variant {
        Variant {
            name: definition.name.clone(),
            enabled: true,
            payload: definition.payload.clone(),
            feature_enabled,
        }
    }

    /// Copy of this variant annotated with the feature's state.
    pub(crate) fn with_feature_enabled(&self, feature_enabled: bool) -> Variant {
        Variant {
            feature_enabled,
            ..self.clone()
        }
    }
}

impl Default for Variant {
    fn default() -> Self {
        Variant::disabled()
    }
}

/// Select one of the feature-level variants of `feature`, using the stickiness declared by the
/// first variant.
pub fn select_variant<'a>(
    feature: &'a FeatureDefinition,
    context: &Context,
) -> Option<&'a VariantDefinition> {
    let variants = feature.variants.as_deref().unwrap_or_default();
    let stickiness = variants.first().and_then(|v| v.stickiness.as_deref());
    select_variant_definition(&feature.name, stickiness, variants, context)
}

/// Select a variant: an override matching `context` wins, otherwise the weighted bucket of the
/// stickiness seed within `group_id`.
///
/// Returns `None` when the total weight is zero.
pub fn select_variant_definition<'a>(
    group_id: &str,
    stickiness: Option<&str>,
    variants: &'a [VariantDefinition],
    context: &Context,
) -> Option<&'a VariantDefinition> {
    let total_weight: u64 = variants.iter().map(|v| u64::from(v.weight)).sum();
    if total_weight == 0 {
        return None;
    }

    if let Some(variant) = find_override(variants, context) {
        return Some(variant);
    }

    let seed = seed(context, stickiness.unwrap_or("default"));
    let target = normalized_variant_value(&seed, group_id, total_weight);

    let mut counter = 0;
    variants.iter().filter(|v| v.weight > 0).find(|v| {
        counter += u64::from(v.weight);
        counter >= target
    })
}

fn find_override<'a>(
    variants: &'a [VariantDefinition],
    context: &Context,
) -> Option<&'a VariantDefinition> {
    variants.iter().find(|variant| {
        variant
            .overrides
            .iter()
            .any(|o| override_matches(o, context))
    })
}

fn override_matches(o: &Override, context: &Context) -> bool {
    let Some(value) = context.resolve(&o.context_name) else {
        return false;
    };
    o.values.iter().any(|v| *v == value)
}

fn seed<'a>(context: &'a Context, stickiness: &str) -> Cow<'a, str> {
    let resolved = if stickiness == "default" {
        DEFAULT_STICKINESS_FIELDS
            .iter()
            .find_map(|field| context.resolve(field))
    } else {
        context.resolve(stickiness)
    };
    resolved.unwrap_or_else(random_seed)
}

fn random_seed<'a>() -> Cow<'a, str> {
    Cow::Owned(rand::thread_rng().gen_range(0..=100_000).to_string())
}
