//! Parent-feature prerequisites.
//!
//! Dependencies are resolved one hop deep: a parent that itself declares dependencies never
//! satisfies a child. This bounds evaluation and rules out cycles.
use crate::{
    models::{FeatureDefinition, ParentDependency},
    repository::Repository,
    Client, Context,
};

impl Client {
    /// Return `true` if every dependency of `feature` is satisfied for `context`.
    ///
    /// Parents are evaluated without emitting impressions.
    pub(crate) fn is_parent_dependency_satisfied(
        &self,
        repository: &dyn Repository,
        feature: &FeatureDefinition,
        context: &Context,
    ) -> bool {
        let Some(dependencies) = feature.dependencies.as_deref() else {
            return true;
        };

        dependencies
            .iter()
            .all(|dependency| self.is_dependency_satisfied(repository, feature, dependency, context))
    }

    fn is_dependency_satisfied(
        &self,
        repository: &dyn Repository,
        feature: &FeatureDefinition,
        dependency: &ParentDependency,
        context: &Context,
    ) -> bool {
        let Some(parent) = repository.get_toggle(&dependency.feature) else {
            self.warn_dependency_once(&dependency.feature, &feature.name);
            return false;
        };

        if parent.has_dependencies() {
            log::trace!(target: "toggle_engine",
                        feature = feature.name.as_str(),
                        parent = parent.name.as_str();
                        "parent has dependencies of its own, dependency not satisfied");
            return false;
        }

        if dependency.enabled == Some(false) {
            return !self
                .feature_result(repository, Some(parent), context, || false)
                .enabled;
        }

        if dependency.variants.is_empty() {
            return self
                .feature_result(repository, Some(parent), context, || false)
                .enabled;
        }

        let variant = self.resolve_variant(repository, Some(parent), context, true, None);
        variant.feature_enabled && dependency.variants.contains(&variant.name)
    }
}
