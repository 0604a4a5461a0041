use async_trait::async_trait;

use crate::config::Configuration;
use crate::envelope::Envelope;

mod echo;
#[cfg(feature = "http")]
mod http;

pub use echo::EchoClient;
#[cfg(feature = "http")]
pub use http::HttpClient;

/// Error type returned when an envelope could not be delivered.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[cfg(feature = "http")]
    #[error("request to logging hub failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("logging hub responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to encode envelope: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write envelope: {0}")]
    Io(#[from] std::io::Error),
}

/// Destination for [`Envelope`]s built by the message factory.
///
/// Implementations transport one envelope per call to the endpoint named
/// by the [`Configuration`] (HTTP, console, a test double, etc).
#[async_trait]
pub trait Client: Send + Sync {
    /// Send a single envelope.
    ///
    /// **Parameters**
    /// - `configuration`: endpoint URL and credentials.
    /// - `envelope`: fully-populated [`Envelope`] for one log call.
    ///
    /// **Returns**
    /// - `Ok(())` if the envelope was accepted.
    /// - `Err(..)` if delivery failed. Callers get the error as-is; there
    ///   is no retry or buffering at this layer.
    async fn send_message(
        &self,
        configuration: &Configuration,
        envelope: &Envelope,
    ) -> Result<(), TransportError>;
}
