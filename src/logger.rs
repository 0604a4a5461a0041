use std::sync::Arc;

use crate::client::{Client, TransportError};
#[cfg(feature = "http")]
use crate::config::ConfigError;
use crate::config::Configuration;
use crate::envelope::Envelope;
use crate::factory::MessageFactory;
use crate::level::Level;
use crate::mapper::DEFAULT_EXCEPTION_KEY;
use crate::value::{Context, ExceptionRecord};

/// Message of a log call: plain text or an error value.
#[derive(Debug, Clone, PartialEq)]
pub enum LogMessage {
    Text(String),
    Exception(ExceptionRecord),
}

impl From<&str> for LogMessage {
    fn from(v: &str) -> Self {
        LogMessage::Text(v.to_string())
    }
}

impl From<String> for LogMessage {
    fn from(v: String) -> Self {
        LogMessage::Text(v)
    }
}

impl From<ExceptionRecord> for LogMessage {
    fn from(v: ExceptionRecord) -> Self {
        LogMessage::Exception(v)
    }
}

/// Entry point for application log calls.
///
/// Each call builds exactly one [`Envelope`] and makes exactly one
/// delivery attempt through the [`Client`]. Delivery errors are returned
/// to the caller; wrap the call if logging should be best-effort.
#[derive(Clone)]
pub struct Logger {
    factory: Arc<MessageFactory>,
    client: Arc<dyn Client>,
}

impl Logger {
    pub fn new(factory: MessageFactory, client: Arc<dyn Client>) -> Self {
        Logger { factory: Arc::new(factory), client }
    }

    /// Logger posting to the hub over HTTP.
    #[cfg(feature = "http")]
    pub fn create(factory: MessageFactory) -> Self {
        Self::new(factory, Arc::new(crate::client::HttpClient::new()))
    }

    /// HTTP logger with the default mappers, configured from a DSN.
    #[cfg(feature = "http")]
    pub fn from_dsn(dsn: &str) -> Result<Self, ConfigError> {
        let configuration = Configuration::from_dsn(dsn)?;
        Ok(Self::create(MessageFactory::with_default_mappers(configuration)))
    }

    /// Like [`Logger::from_dsn`], reading the DSN from `HUB_PROBE_DSN` and
    /// an optional fixed principal from `HUB_PROBE_PRINCIPAL`.
    #[cfg(feature = "http")]
    pub fn from_env() -> Result<Self, ConfigError> {
        let principal = crate::env::env_var(crate::env::HUB_PROBE_PRINCIPAL_ENV);
        let factory = MessageFactory::with_default_mappers(Configuration::from_env()?)
            .with_principal(principal);
        Ok(Self::create(factory))
    }

    pub fn factory(&self) -> &MessageFactory {
        &self.factory
    }

    pub fn configuration(&self) -> &Configuration {
        self.factory.configuration()
    }

    /// Normalize the message and build its envelope without sending it.
    ///
    /// An error passed as the message is moved into the context under
    /// [`DEFAULT_EXCEPTION_KEY`], replacing any entry there, and its own
    /// message text becomes the log message.
    pub fn prepare(
        &self,
        level: Level,
        message: impl Into<LogMessage>,
        mut context: Context,
    ) -> Envelope {
        let text = match message.into() {
            LogMessage::Text(text) => text,
            LogMessage::Exception(exception) => {
                let text = exception.message.clone();
                context.insert(DEFAULT_EXCEPTION_KEY, exception);
                text
            }
        };
        self.factory.create_message(level, &text, &context)
    }

    /// Deliver a prepared envelope to the configured endpoint.
    pub async fn transmit(&self, envelope: &Envelope) -> Result<(), TransportError> {
        self.client.send_message(self.configuration(), envelope).await
    }

    pub async fn log(
        &self,
        level: Level,
        message: impl Into<LogMessage>,
        context: Context,
    ) -> Result<(), TransportError> {
        let envelope = self.prepare(level, message, context);
        self.transmit(&envelope).await
    }

    pub async fn emergency(
        &self,
        message: impl Into<LogMessage>,
        context: Context,
    ) -> Result<(), TransportError> {
        self.log(Level::Emergency, message, context).await
    }

    pub async fn alert(
        &self,
        message: impl Into<LogMessage>,
        context: Context,
    ) -> Result<(), TransportError> {
        self.log(Level::Alert, message, context).await
    }

    pub async fn critical(
        &self,
        message: impl Into<LogMessage>,
        context: Context,
    ) -> Result<(), TransportError> {
        self.log(Level::Critical, message, context).await
    }

    pub async fn error(
        &self,
        message: impl Into<LogMessage>,
        context: Context,
    ) -> Result<(), TransportError> {
        self.log(Level::Error, message, context).await
    }

    pub async fn warning(
        &self,
        message: impl Into<LogMessage>,
        context: Context,
    ) -> Result<(), TransportError> {
        self.log(Level::Warning, message, context).await
    }

    pub async fn notice(
        &self,
        message: impl Into<LogMessage>,
        context: Context,
    ) -> Result<(), TransportError> {
        self.log(Level::Notice, message, context).await
    }

    pub async fn info(
        &self,
        message: impl Into<LogMessage>,
        context: Context,
    ) -> Result<(), TransportError> {
        self.log(Level::Info, message, context).await
    }

    pub async fn debug(
        &self,
        message: impl Into<LogMessage>,
        context: Context,
    ) -> Result<(), TransportError> {
        self.log(Level::Debug, message, context).await
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger").field("factory", &self.factory).finish_non_exhaustive()
    }
}
