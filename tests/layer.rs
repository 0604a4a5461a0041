use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hub_probe::layer::HubLayer;
use hub_probe::level::MessageType;
use hub_probe::{Client, Configuration, Envelope, Level, Logger, MessageFactory, TransportError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

#[derive(Default)]
struct Recording {
    sent: Mutex<Vec<Envelope>>,
}

#[async_trait]
impl Client for Recording {
    async fn send_message(
        &self,
        _configuration: &Configuration,
        envelope: &Envelope,
    ) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(envelope.clone());
        Ok(())
    }
}

fn logger(client: Arc<Recording>) -> Arc<Logger> {
    let configuration = Configuration::from_dsn("https://hub.example.com?appName=layer-test").unwrap();
    // tracing records errors under the field name, usually `error`.
    let factory = MessageFactory::new(configuration)
        .with_exception_mapper("error")
        .with_json_mapper();
    Arc::new(Logger::new(factory, client))
}

#[derive(Debug, thiserror::Error)]
#[error("invalid password")]
struct InvalidPassword;

#[tokio::test]
async fn ships_one_envelope_per_event_at_or_above_min_level() {
    let client = Arc::new(Recording::default());
    let (layer, handle) = HubLayer::new(logger(client.clone()), tracing::Level::INFO, vec![]);
    let total = Arc::clone(&layer.total_events);
    let sent = Arc::clone(&layer.sent_events);

    let subscriber = Registry::default().with(layer);
    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(user_id = 42_u64, ratio = 0.25, "user signed in");
        tracing::warn!(retry = true, "slow response");
        tracing::debug!("not shipped");
    });

    // Dropping the subscriber closes the channel; the task drains and exits.
    handle.await.unwrap();

    assert_eq!(total.load(Ordering::Relaxed), 3);
    assert_eq!(sent.load(Ordering::Relaxed), 2);

    let envelopes = client.sent.lock().unwrap();
    assert_eq!(envelopes.len(), 2);

    let first = &envelopes[0];
    assert_eq!(first.log_level, Level::Info);
    assert_eq!(first.message_type, MessageType::Normal);
    assert_eq!(first.message_text, "user signed in");
    assert_eq!(first.application_name.as_deref(), Some("layer-test"));
    assert_eq!(first.extra_data["user_id"], "42");
    assert_eq!(first.extra_data["ratio"], "0.25");
    assert!(first.log_point.as_deref().unwrap().starts_with("tests/layer.rs:"));

    let second = &envelopes[1];
    assert_eq!(second.log_level, Level::Warning);
    assert_eq!(second.message_type, MessageType::Error);
    assert_eq!(second.extra_data["retry"], "true");
}

#[tokio::test]
async fn error_fields_become_exceptions() {
    let client = Arc::new(Recording::default());
    let (layer, handle) = HubLayer::new(logger(client.clone()), tracing::Level::ERROR, vec![]);

    let subscriber = Registry::default().with(layer);
    tracing::subscriber::with_default(subscriber, || {
        let err = InvalidPassword;
        tracing::error!(error = &err as &(dyn std::error::Error + 'static), "authentication failed");
    });
    handle.await.unwrap();

    let envelopes = client.sent.lock().unwrap();
    let envelope = &envelopes[0];
    assert_eq!(envelope.log_level, Level::Error);
    assert_eq!(envelope.message_text, "authentication failed");
    assert_eq!(envelope.exception.as_deref(), Some("dyn std::error::Error"));
    assert_eq!(envelope.extra_data["error_message"], "invalid password");
}

#[tokio::test]
async fn ignored_targets_are_not_shipped() {
    let client = Arc::new(Recording::default());
    let (layer, handle) = HubLayer::new(
        logger(client.clone()),
        tracing::Level::TRACE,
        vec!["noisy".to_string()],
    );

    let subscriber = Registry::default().with(layer);
    tracing::subscriber::with_default(subscriber, || {
        tracing::error!(target: "noisy::dependency", "dropped");
        tracing::trace!(target: "app", "kept");
    });
    handle.await.unwrap();

    let envelopes = client.sent.lock().unwrap();
    assert_eq!(envelopes.len(), 1);
    assert_eq!(envelopes[0].message_text, "kept");
    assert_eq!(envelopes[0].log_level, Level::Debug);
}

#[tokio::test]
async fn own_diagnostics_are_never_shipped() {
    let client = Arc::new(Recording::default());
    let (layer, handle) = HubLayer::new(logger(client.clone()), tracing::Level::TRACE, vec![]);
    let total = Arc::clone(&layer.total_events);

    let subscriber = Registry::default().with(layer);
    tracing::subscriber::with_default(subscriber, || {
        tracing::warn!(target: "hub_probe::layer", "failed to ship log envelope");
        tracing::debug!(target: "hub_probe", "internal");
        tracing::info!(target: "hub_probe_companion", "kept");
    });
    handle.await.unwrap();

    assert_eq!(total.load(Ordering::Relaxed), 3);
    let envelopes = client.sent.lock().unwrap();
    assert_eq!(envelopes.len(), 1);
    assert_eq!(envelopes[0].message_text, "kept");
}
