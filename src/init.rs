use crate::layer::HubLayer;
use crate::logger::Logger;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the logging hub layer.
///
/// **Fields**
/// - `min_level`: least severe `tracing` level shipped to the hub.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   stacked on top of [`HubLayer`] so events are also printed locally.
/// - `ignored_targets`: target prefixes never shipped. The defaults keep
///   the HTTP stack out of the hub; this crate's own diagnostics are
///   always skipped by [`HubLayer`].
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub min_level: tracing::Level,
    pub enable_stdout: bool,
    pub ignored_targets: Vec<String>,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            min_level: tracing::Level::INFO,
            enable_stdout: true,
            ignored_targets: ["reqwest", "hyper"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Build a [`HubLayer`] from a [`LayerConfig`].
///
/// Must be called from within a Tokio runtime; see [`HubLayer::new`].
pub fn hub_layer(logger: Arc<Logger>, config: &LayerConfig) -> HubLayer {
    let (layer, _handle) = HubLayer::new(logger, config.min_level, config.ignored_targets.clone());
    layer
}

/// Initialize the global `tracing` subscriber using the provided logger
/// and [`LayerConfig`].
///
/// **Parameters**
/// - `logger`: [`Logger`] whose factory builds the envelopes and whose
///   client delivers them.
/// - `config`: [`LayerConfig`] controlling filtering and console output.
///
/// **Effects**
///
/// Installs a [`Registry`] combined with [`HubLayer`] as the global
/// default subscriber. Fails if a global subscriber is already set.
pub fn init_tracing_with_config(
    logger: Arc<Logger>,
    config: LayerConfig,
) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let layer = hub_layer(logger, &config);

    // Two variants keep the subscriber types concrete.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)
    }
}

/// Initialize tracing with [`LayerConfig::default`].
pub fn init_tracing(logger: Arc<Logger>) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    init_tracing_with_config(logger, LayerConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_ignores_http_targets() {
        let config = LayerConfig::default();
        assert_eq!(config.min_level, tracing::Level::INFO);
        assert!(config.enable_stdout);
        assert_eq!(config.ignored_targets, vec!["reqwest", "hyper"]);
    }
}
