use std::io::Write;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{Client, TransportError};
use crate::config::Configuration;
use crate::envelope::Envelope;

/// Diagnostic client that writes the target URL, basic auth value and
/// pretty-printed envelope to a stream instead of sending it.
#[derive(Clone)]
pub struct EchoClient {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl EchoClient {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        EchoClient { out: Arc::new(Mutex::new(Box::new(out))) }
    }

    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl Default for EchoClient {
    fn default() -> Self {
        Self::stdout()
    }
}

#[async_trait]
impl Client for EchoClient {
    async fn send_message(
        &self,
        configuration: &Configuration,
        envelope: &Envelope,
    ) -> Result<(), TransportError> {
        let payload = envelope.to_json_pretty()?;
        let auth = configuration.basic_auth().unwrap_or_default();

        // A poisoned lock only means another writer panicked mid-write.
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        writeln!(out, "Url: {}", configuration.url())?;
        writeln!(out, "Authorization: Basic {auth}")?;
        writeln!(out, "Payload:\n{payload}")?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::MessageFactory;
    use crate::level::Level;
    use crate::value::Context;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn writes_url_auth_and_pretty_payload() {
        let configuration = Configuration::from_dsn("http://u:p@hub.local:8080/ingest").unwrap();
        let envelope = MessageFactory::new(configuration.clone()).create_message(
            Level::Notice,
            "hello",
            &Context::new().with("k", "v"),
        );

        let buf = SharedBuf::default();
        EchoClient::new(buf.clone())
            .send_message(&configuration, &envelope)
            .await
            .unwrap();

        let written = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        let mut lines = written.lines();
        assert_eq!(lines.next(), Some("Url: http://hub.local:8080/ingest"));
        assert_eq!(lines.next(), Some("Authorization: Basic u:p"));
        assert_eq!(lines.next(), Some("Payload:"));

        let payload: String = lines.collect::<Vec<_>>().join("\n");
        let json: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(json["@messageText"], "hello");
        assert_eq!(json["@extraData"]["k"], "v");
        assert!(payload.contains("\n  \"@logLevel\": \"notice\""));
    }
}
