use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use tracing::{debug, warn};

use super::{Client, TransportError};
use crate::config::Configuration;
use crate::envelope::Envelope;

/// Posts each envelope as JSON to [`Configuration::url`], with basic
/// auth when the configuration carries credentials.
#[derive(Clone, Debug, Default)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    pub fn new() -> Self {
        HttpClient { client: ReqwestClient::new() }
    }

    /// Client whose requests fail with [`TransportError::Request`] once
    /// `timeout` elapses.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = ReqwestClient::builder().timeout(timeout).build()?;
        Ok(HttpClient { client })
    }
}

#[async_trait]
impl Client for HttpClient {
    async fn send_message(
        &self,
        configuration: &Configuration,
        envelope: &Envelope,
    ) -> Result<(), TransportError> {
        let url = configuration.url();
        let mut request = self.client.post(&url).json(envelope);
        if let Some((user, password)) = configuration.credentials() {
            request = request.basic_auth(user, Some(password));
        }

        debug!(%url, level = %envelope.log_level, "sending envelope to logging hub");
        let resp = request.send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            warn!(%url, status = status.as_u16(), "logging hub rejected envelope");
            Err(TransportError::Status { status: status.as_u16(), body })
        }
    }
}
