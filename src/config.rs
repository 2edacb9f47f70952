use std::sync::Arc;

use crate::{
    events::NoopEventListener,
    repository::FeatureStore,
    strategy::{default_strategies, Strategy},
    Client, EventListener, Result,
};

/// Configuration for [`Client`].
pub struct ClientConfig {
    pub(crate) strategies: Vec<Arc<dyn Strategy>>,
    pub(crate) event_listener: Box<dyn EventListener + Send + Sync>,
    pub(crate) store: Option<Arc<FeatureStore>>,
}

impl ClientConfig {
    /// Create a configuration with the built-in strategies, no event listener and a fresh, empty
    /// [`FeatureStore`].
    ///
    /// ```
    /// # use toggle_engine::ClientConfig;
    /// let client = ClientConfig::new().to_client().unwrap();
    /// ```
    pub fn new() -> Self {
        ClientConfig {
            strategies: default_strategies(),
            event_listener: Box::new(NoopEventListener),
            store: None,
        }
    }

    /// Create a configuration without any strategies registered.
    pub fn without_default_strategies() -> Self {
        ClientConfig {
            strategies: Vec::new(),
            ..ClientConfig::new()
        }
    }

    /// Register a custom strategy. A strategy registered later replaces an earlier one with the
    /// same name, including built-in strategies.
    ///
    /// ```
    /// # use toggle_engine::{ClientConfig, Context, models::Parameters, strategy::Strategy};
    /// struct Beta;
    ///
    /// impl Strategy for Beta {
    ///     fn name(&self) -> &str {
    ///         "beta"
    ///     }
    ///
    ///     fn is_enabled(&self, _parameters: &Parameters, context: &Context) -> bool {
    ///         context.resolve("beta").is_some_and(|v| v == "true")
    ///     }
    /// }
    ///
    /// let client = ClientConfig::new().strategy(Beta).to_client().unwrap();
    /// ```
    pub fn strategy(mut self, strategy: impl Strategy + 'static) -> Self {
        self.strategies.push(Arc::new(strategy));
        self
    }

    /// Set the listener receiving warnings, errors and impressions.
    ///
    /// ```
    /// # use toggle_engine::{ClientConfig, Event};
    /// let config = ClientConfig::new().event_listener(|event: Event| {
    ///     println!("{:?}", event);
    /// });
    /// ```
    pub fn event_listener(
        mut self,
        event_listener: impl EventListener + Send + Sync + 'static,
    ) -> Self {
        self.event_listener = Box::new(event_listener);
        self
    }

    /// Read feature definitions from an existing store, e.g. one shared between clients.
    pub fn store(mut self, store: Arc<FeatureStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Create a new [`Client`] using the specified configuration.
    ///
    /// Fails with [`Error::InvalidStrategy`](crate::Error::InvalidStrategy) if a strategy has an
    /// empty name.
    pub fn to_client(self) -> Result<Client> {
        Client::new(self)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig::new()
    }
}
