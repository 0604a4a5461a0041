use std::sync::Arc;

use async_trait::async_trait;
use hub_probe::{Client, Configuration, Context, Envelope, Logger, MessageFactory, TransportError};

/// Example of integrating a completely custom transport by implementing
/// the `Client` trait directly. Imagine this pushes envelopes onto some
/// message bus for which this crate does not provide a built-in client.
struct MyBusClient;

#[async_trait]
impl Client for MyBusClient {
    async fn send_message(
        &self,
        configuration: &Configuration,
        envelope: &Envelope,
    ) -> Result<(), TransportError> {
        // Here you would call your own client library for the target bus.
        // For the sake of example we just print the envelope.
        println!("[my-bus -> {}] {}", configuration.url(), envelope.to_json()?);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let configuration = Configuration::builder()
        .scheme("http")
        .host("hub.internal")
        .port(8080)
        .app_name("custom-client-demo")
        .build()?;

    // The principal is looked up on every message.
    let factory = MessageFactory::with_default_mappers(configuration)
        .with_principal_provider(|| std::env::var("USER").ok());

    let logger = Logger::new(factory, Arc::new(MyBusClient));
    logger
        .notice("custom transport example started", Context::new().with("bus", "my-bus"))
        .await?;

    Ok(())
}
