use std::{collections::HashMap, sync::Arc};

use crate::{
    constraints::ConstraintSource,
    events::{
        EvaluationError, Event, EventListener, ImpressionEvent, ImpressionKind, WarnOnce, Warning,
    },
    models::{FeatureDefinition, StrategySelector, TryParse},
    repository::{FeatureStore, Repository},
    strategy::{Strategy, StrategyResult},
    variant::{select_variant, Variant},
    ClientConfig, Context, Error, Result,
};

/// Evaluates features against the snapshot currently published in its [`FeatureStore`].
///
/// Every public call reads the snapshot once and evaluates entirely against it. Evaluation never
/// blocks and never fails; problems with feature data are reported as [`Event`]s and degrade to
/// the feature being disabled.
///
/// # Examples
/// ```
/// # use toggle_engine::{ClientConfig, ClientFeatures, Context, FeatureDefinition, Snapshot, StrategySelector};
/// let client = ClientConfig::new().to_client().unwrap();
/// client.store().set_snapshot(Snapshot::new(ClientFeatures {
///     features: vec![FeatureDefinition {
///         strategies: vec![StrategySelector::new("userWithId", [("userIds", "u1,u2")])].into(),
///         ..FeatureDefinition::new("X")
///     }],
///     ..ClientFeatures::default()
/// }));
///
/// let user = |id: &str| Context { user_id: Some(id.into()), ..Context::default() };
/// assert!(client.is_enabled("X", &user("u1"), || false));
/// assert!(!client.is_enabled("X", &user("u9"), || false));
/// assert!(client.is_enabled("missing", &Context::default(), || true));
/// ```
pub struct Client {
    store: Arc<FeatureStore>,
    strategies: HashMap<String, Arc<dyn Strategy>>,
    event_listener: Box<dyn EventListener + Send + Sync>,
    warned_strategies: WarnOnce,
    warned_dependencies: WarnOnce,
    warned_segments: WarnOnce,
}

impl Client {
    /// Create a new `Client` using the specified configuration.
    ///
    /// Fails if a registered strategy has an empty name.
    pub fn new(config: ClientConfig) -> Result<Client> {
        let ClientConfig {
            strategies: registered,
            event_listener,
            store,
        } = config;

        let mut strategies = HashMap::with_capacity(registered.len());
        for strategy in registered {
            let name = strategy.name();
            if name.trim().is_empty() {
                return Err(Error::InvalidStrategy {
                    name: name.to_owned(),
                });
            }
            strategies.insert(name.to_owned(), strategy);
        }

        Ok(Client {
            store: store.unwrap_or_default(),
            strategies,
            event_listener,
            warned_strategies: WarnOnce::default(),
            warned_dependencies: WarnOnce::default(),
            warned_segments: WarnOnce::default(),
        })
    }

    /// Store the client reads feature definitions from. Publish new snapshots here.
    pub fn store(&self) -> &Arc<FeatureStore> {
        &self.store
    }

    /// Return `true` if the feature is enabled for `context`.
    ///
    /// `fallback` is only called when the feature is unknown.
    pub fn is_enabled(&self, name: &str, context: &Context, fallback: impl FnOnce() -> bool) -> bool {
        let snapshot = self.store.snapshot();
        let feature = snapshot.get_toggle(name);

        let enabled = self
            .feature_result(snapshot.as_ref(), feature, context, fallback)
            .enabled;

        log::trace!(target: "toggle_engine", feature = name, enabled = enabled; "evaluated a feature");

        if feature.is_some_and(|f| f.impression_data) {
            self.emit(Event::from(ImpressionEvent {
                event_type: ImpressionKind::IsEnabled,
                feature_name: name.to_owned(),
                context: context.clone(),
                enabled,
                variant: None,
            }));
        }

        enabled
    }

    /// Return the variant of the feature for `context`, or `fallback` (defaults to
    /// [`Variant::disabled`]) if the feature is unknown, disabled or has no selectable variant.
    ///
    /// The feature's enabled state is evaluated exactly once and returned in
    /// [`Variant::feature_enabled`].
    pub fn get_variant(&self, name: &str, context: &Context, fallback: Option<&Variant>) -> Variant {
        let snapshot = self.store.snapshot();
        let feature = snapshot.get_toggle(name);

        let variant = self.resolve_variant(snapshot.as_ref(), feature, context, true, fallback);

        log::trace!(target: "toggle_engine",
                    feature = name,
                    variant = variant.name.as_str(),
                    feature_enabled = variant.feature_enabled;
                    "evaluated a variant");

        if feature.is_some_and(|f| f.impression_data) {
            self.emit(Event::from(ImpressionEvent {
                event_type: ImpressionKind::GetVariant,
                feature_name: name.to_owned(),
                context: context.clone(),
                enabled: variant.enabled,
                variant: Some(variant.name.clone()),
            }));
        }

        variant
    }

    /// Same as [`get_variant`](Self::get_variant) but never emits impression events.
    ///
    /// Intended for intermediaries (e.g., proxies) that evaluate on behalf of another client.
    /// Prefer `get_variant`.
    pub fn force_get_variant(
        &self,
        name: &str,
        context: &Context,
        fallback: Option<&Variant>,
    ) -> Variant {
        let snapshot = self.store.snapshot();
        let feature = snapshot.get_toggle(name);
        self.resolve_variant(snapshot.as_ref(), feature, context, true, fallback)
    }

    /// Select a feature-level variant without evaluating the feature's strategies.
    ///
    /// For callers that already know the feature is enabled (e.g., from
    /// [`is_enabled`](Self::is_enabled)). The result always reports `feature_enabled` as `true`
    /// for known features, and strategy-scoped variants are not considered.
    pub fn get_variant_skip_toggle_check(
        &self,
        name: &str,
        context: &Context,
        fallback: Option<&Variant>,
    ) -> Variant {
        let snapshot = self.store.snapshot();
        let feature = snapshot.get_toggle(name);
        self.resolve_variant(snapshot.as_ref(), feature, context, false, fallback)
    }

    /// Definition of the named feature in the current snapshot.
    pub fn feature_toggle_definition(&self, name: &str) -> Option<FeatureDefinition> {
        self.store.snapshot().get_toggle(name).cloned()
    }

    /// All feature definitions in the current snapshot.
    pub fn feature_toggle_definitions(&self) -> Vec<FeatureDefinition> {
        self.store.snapshot().features().cloned().collect()
    }

    /// Evaluate the feature's strategies in order, returning the first success.
    ///
    /// `fallback` decides unknown features. Nothing else calls it.
    pub(crate) fn feature_result(
        &self,
        repository: &dyn Repository,
        feature: Option<&FeatureDefinition>,
        context: &Context,
        fallback: impl FnOnce() -> bool,
    ) -> StrategyResult {
        let Some(feature) = feature else {
            return StrategyResult {
                enabled: fallback(),
                variant: None,
            };
        };

        if !self.is_parent_dependency_satisfied(repository, feature, context) || !feature.enabled {
            return StrategyResult::disabled();
        }

        let selectors = match &feature.strategies {
            TryParse::Parsed(selectors) => selectors,
            TryParse::ParseFailed(value) => {
                let error = EvaluationError::MalformedFeature {
                    feature: feature.name.clone(),
                    found: describe_json(value).to_owned(),
                };
                log::error!(target: "toggle_engine", feature = feature.name.as_str(); "{error}");
                self.emit(error.into());
                return StrategyResult::disabled();
            }
        };

        if selectors.is_empty() {
            return StrategyResult {
                enabled: feature.enabled,
                variant: None,
            };
        }

        let context = context.for_feature(&feature.name);

        for selector in selectors {
            let Some(strategy) = self.strategies.get(&selector.name) else {
                self.warn_strategy_once(feature, selector, selectors);
                continue;
            };

            self.warn_missing_segments_once(repository, feature, selector);

            let result = strategy.get_result(
                &selector.parameters,
                &context,
                ConstraintSource::new(selector, repository),
                &selector.variants,
            );
            if result.enabled {
                return result;
            }
        }

        StrategyResult::disabled()
    }

    /// Resolve the variant of `feature`.
    ///
    /// With `check_toggle`, the strategies are evaluated once: a strategy-scoped variant of the
    /// winning strategy is returned as-is, a disabled feature returns the fallback.
    pub(crate) fn resolve_variant(
        &self,
        repository: &dyn Repository,
        feature: Option<&FeatureDefinition>,
        context: &Context,
        check_toggle: bool,
        fallback: Option<&Variant>,
    ) -> Variant {
        let fallback_with = |feature_enabled: bool| match fallback {
            Some(variant) => variant.with_feature_enabled(feature_enabled),
            None => Variant::disabled().with_feature_enabled(feature_enabled),
        };

        let Some(feature) = feature else {
            return fallback_with(false);
        };

        let mut feature_enabled = true;
        if check_toggle {
            let result = self.feature_result(repository, Some(feature), context, || {
                fallback.is_some_and(|variant| variant.enabled)
            });
            feature_enabled = result.enabled;

            if !feature_enabled {
                return fallback_with(false);
            }
            if let Some(variant) = result.variant {
                return variant.with_feature_enabled(feature_enabled);
            }
        }

        match select_variant(feature, context) {
            Some(definition) => Variant::from_definition(definition, feature_enabled),
            None => fallback_with(feature_enabled),
        }
    }

    pub(crate) fn warn_dependency_once(&self, parent: &str, feature: &str) {
        if self.warned_dependencies.first_time(warn_key(parent, feature)) {
            let warning = Warning::MissingDependency {
                parent: parent.to_owned(),
                feature: feature.to_owned(),
            };
            log::warn!(target: "toggle_engine", feature = feature, parent = parent; "{warning}");
            self.emit(warning.into());
        }
    }

    fn warn_strategy_once(
        &self,
        feature: &FeatureDefinition,
        selector: &StrategySelector,
        selectors: &[StrategySelector],
    ) {
        if self
            .warned_strategies
            .first_time(warn_key(&selector.name, &feature.name))
        {
            let warning = Warning::MissingStrategy {
                strategy: selector.name.clone(),
                feature: feature.name.clone(),
                strategies: selectors.iter().map(|s| s.name.clone()).collect(),
            };
            log::warn!(target: "toggle_engine",
                       feature = feature.name.as_str(),
                       strategy = selector.name.as_str();
                       "{warning}");
            self.emit(warning.into());
        }
    }

    fn warn_missing_segments_once(
        &self,
        repository: &dyn Repository,
        feature: &FeatureDefinition,
        selector: &StrategySelector,
    ) {
        for &segment in &selector.segments {
            if repository.get_segment(segment).is_some() {
                continue;
            }
            if self
                .warned_segments
                .first_time(warn_key(&segment.to_string(), &feature.name))
            {
                let warning = Warning::MissingSegment {
                    segment,
                    feature: feature.name.clone(),
                };
                log::warn!(target: "toggle_engine", feature = feature.name.as_str(), segment = segment; "{warning}");
                self.emit(warning.into());
            }
        }
    }

    fn emit(&self, event: Event) {
        self.event_listener.on_event(event);
    }
}

fn warn_key(missing: &str, feature: &str) -> String {
    format!("{missing}\u{0}{feature}")
}

fn describe_json(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a list of invalid strategies",
        serde_json::Value::Object(_) => "an object",
    }
}
