use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::{ConfigError, Configuration};
use crate::envelope::Envelope;
use crate::level::Level;
use crate::mapper::{DateTimeMapper, ExceptionMapper, Fields, JsonMapper, Mapper};
use crate::principal::{PrincipalProvider, StaticPrincipal};
use crate::value::{Context, ContextValue};

/// Identifies this client implementation to the hub as `@probeType`.
pub const PROBE_TYPE: &str = "rust";

/// Builds [`Envelope`]s from raw log calls.
///
/// Setup happens through the consuming `with_*` methods; once built, the
/// factory is only read, so `create_message` can run concurrently from
/// any number of threads.
pub struct MessageFactory {
    configuration: Configuration,
    principal_provider: Arc<dyn PrincipalProvider>,
    mappers: Vec<Box<dyn Mapper>>,
}

impl MessageFactory {
    /// Factory without mappers and without a principal.
    pub fn new(configuration: Configuration) -> Self {
        MessageFactory {
            configuration,
            principal_provider: Arc::new(StaticPrincipal::default()),
            mappers: Vec::new(),
        }
    }

    /// Factory with the date/time, exception and JSON mappers registered
    /// in that order, using their default settings.
    pub fn with_default_mappers(configuration: Configuration) -> Self {
        Self::new(configuration)
            .with_mapper(DateTimeMapper::default())
            .with_exception_mapper(crate::mapper::DEFAULT_EXCEPTION_KEY)
            .with_json_mapper()
    }

    /// Append a mapper. Earlier registrations take priority.
    pub fn with_mapper(mut self, mapper: impl Mapper + 'static) -> Self {
        self.mappers.push(Box::new(mapper));
        self
    }

    /// Fails with [`ConfigError::InvalidDateFormat`] for formats chrono
    /// cannot render.
    pub fn with_datetime_mapper(self, format: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(self.with_mapper(DateTimeMapper::new(format)?))
    }

    pub fn with_exception_mapper(self, exception_key: impl Into<String>) -> Self {
        self.with_mapper(ExceptionMapper::new(exception_key))
    }

    pub fn with_json_mapper(self) -> Self {
        self.with_mapper(JsonMapper)
    }

    pub fn with_principal_provider(mut self, provider: impl PrincipalProvider + 'static) -> Self {
        self.principal_provider = Arc::new(provider);
        self
    }

    /// Shorthand for a [`StaticPrincipal`] provider.
    pub fn with_principal(self, principal: Option<String>) -> Self {
        self.with_principal_provider(StaticPrincipal::new(principal))
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn mapper_count(&self) -> usize {
        self.mappers.len()
    }

    /// Build the envelope for one log call, stamped with the current time.
    pub fn create_message(&self, level: Level, message: &str, context: &Context) -> Envelope {
        self.create_message_at(Utc::now(), level, message, context)
    }

    /// Build the envelope for one log call with an explicit timestamp.
    ///
    /// Field precedence, lowest to highest: fixed metadata, configuration
    /// identity, then reserved keys produced from the context. A mapper
    /// emitting `@principal` therefore overrides the principal provider.
    pub fn create_message_at(
        &self,
        timestamp: DateTime<Utc>,
        level: Level,
        message: &str,
        context: &Context,
    ) -> Envelope {
        let mut envelope = Envelope {
            timestamp: timestamp.timestamp_millis(),
            probe_type: PROBE_TYPE.to_string(),
            message_type: level.message_type(),
            log_level: level,
            message_text: message.to_string(),
            principal: self.principal_provider.principal(),
            application_name: self.configuration.app_name().map(str::to_string),
            server_name: self.configuration.server_name().map(str::to_string),
            server_ip: self.configuration.server_ip().map(str::to_string),
            exception: None,
            root_exception: None,
            stack_trace: None,
            log_point: None,
            extra_data: BTreeMap::new(),
        };

        for (key, value) in context.iter() {
            for (field, field_value) in self.apply_mappers(key, value) {
                envelope.insert_field(field, field_value.to_string());
            }
        }

        envelope
    }

    fn apply_mappers(&self, key: &str, value: &ContextValue) -> Fields {
        match self.mappers.iter().find(|m| m.supports(key, value)) {
            Some(mapper) => mapper.map(key, value),
            None => Fields::from([(key.to_string(), value.clone())]),
        }
    }
}

impl std::fmt::Debug for MessageFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageFactory")
            .field("configuration", &self.configuration)
            .field("mappers", &self.mappers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::MessageType;
    use crate::value::ExceptionRecord;
    use chrono::TimeZone;
    use serde_json::json;

    fn configuration() -> Configuration {
        Configuration::builder()
            .scheme("https")
            .host("hub.example.com")
            .app_name("billing")
            .server_name("node1")
            .build()
            .unwrap()
    }

    fn factory() -> MessageFactory {
        MessageFactory::with_default_mappers(configuration())
    }

    /// Mapper renaming every string value, used to check ordering rules.
    struct Rename(&'static str);

    impl Mapper for Rename {
        fn supports(&self, _key: &str, value: &ContextValue) -> bool {
            matches!(value, ContextValue::String(_))
        }

        fn map(&self, _key: &str, value: &ContextValue) -> Fields {
            Fields::from([(self.0.to_string(), value.clone())])
        }
    }

    #[test]
    fn fills_fixed_and_identity_metadata() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let envelope = factory().create_message_at(at, Level::Info, "started", &Context::new());

        assert_eq!(envelope.timestamp, at.timestamp_millis());
        assert_eq!(envelope.probe_type, PROBE_TYPE);
        assert_eq!(envelope.message_type, MessageType::Normal);
        assert_eq!(envelope.log_level, Level::Info);
        assert_eq!(envelope.message_text, "started");
        assert_eq!(envelope.application_name.as_deref(), Some("billing"));
        assert_eq!(envelope.server_name.as_deref(), Some("node1"));
        assert_eq!(envelope.server_ip, None);
        assert_eq!(envelope.principal, None);

        let value = serde_json::to_value(&envelope).unwrap();
        assert!(value.get("@extraData").is_none());
        assert!(value.get("@serverIp").is_none());
        assert!(value.get("@principal").is_none());
    }

    #[test]
    fn message_type_follows_level() {
        let f = factory();
        for level in Level::ALL {
            let envelope = f.create_message(level, "m", &Context::new());
            let expected = matches!(level, Level::Emergency | Level::Critical | Level::Warning);
            assert_eq!(envelope.message_type == MessageType::Error, expected, "{level}");
        }
    }

    #[test]
    fn unmatched_values_are_stringified_into_extra_data() {
        let context = Context::new().with("count", 42).with("ratio", 0.5);
        let envelope = factory().create_message(Level::Info, "m", &context);

        assert_eq!(envelope.extra_data.get("count").map(String::as_str), Some("42"));
        assert_eq!(envelope.extra_data.get("ratio").map(String::as_str), Some("0.5"));

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["@extraData"]["count"], "42");
        assert!(value.get("count").is_none());
    }

    #[test]
    fn primary_exception_becomes_reserved_metadata() {
        let error = ExceptionRecord::new("RuntimeFailure", "boom").with_stack_trace("#0 run()");
        let context = Context::new().with("exception", error);
        let envelope = factory().create_message(Level::Critical, "failed", &context);

        assert_eq!(envelope.exception.as_deref(), Some("RuntimeFailure"));
        assert_eq!(envelope.stack_trace.as_deref(), Some("#0 run()"));
        assert_eq!(
            envelope.extra_data.get("exception_message").map(String::as_str),
            Some("boom")
        );
        assert_eq!(
            envelope.extra_data.get("exception_class").map(String::as_str),
            Some("RuntimeFailure")
        );
        assert!(!envelope.extra_data.contains_key("@exception"));
        assert!(!envelope.extra_data.contains_key("@stackTrace"));
    }

    #[test]
    fn datetime_and_json_values_use_their_mappers() {
        let at = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        let context = Context::new()
            .with("due", at)
            .with("order", json!({"id": 1}));
        let envelope = factory().create_message(Level::Info, "m", &context);

        assert_eq!(envelope.extra_data["due"], "2024-05-06T07:08:09+00:00");
        assert_eq!(envelope.extra_data["order"], r#"{"id":1}"#);
    }

    #[test]
    fn custom_datetime_format_is_validated_up_front() {
        let at = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        let factory = MessageFactory::new(configuration()).with_datetime_mapper("%d.%m.%Y").unwrap();
        let envelope = factory.create_message(Level::Info, "m", &Context::new().with("due", at));
        assert_eq!(envelope.extra_data["due"], "06.05.2024");

        let err = MessageFactory::new(configuration()).with_datetime_mapper("%Y-%Q").unwrap_err();
        assert_eq!(err, ConfigError::InvalidDateFormat("%Y-%Q".into()));
    }

    /// Mapper that panics on every value it claims.
    struct Exploding;

    impl Mapper for Exploding {
        fn supports(&self, _key: &str, _value: &ContextValue) -> bool {
            true
        }

        fn map(&self, key: &str, _value: &ContextValue) -> Fields {
            panic!("mapper exploded on {key}");
        }
    }

    #[test]
    #[should_panic(expected = "mapper exploded on order")]
    fn panicking_mapper_unwinds_through_create_message() {
        let factory = MessageFactory::new(configuration()).with_mapper(Exploding);
        factory.create_message(Level::Info, "m", &Context::new().with("order", 1));
    }

    #[test]
    fn first_supporting_mapper_wins_without_passthrough() {
        let factory = MessageFactory::new(configuration())
            .with_mapper(Rename("first"))
            .with_mapper(Rename("second"));
        let envelope = factory.create_message(Level::Info, "m", &Context::new().with("name", "x"));

        assert_eq!(envelope.extra_data.len(), 1);
        assert_eq!(envelope.extra_data["first"], "x");
    }

    #[test]
    fn context_reserved_keys_override_provider() {
        let factory = factory().with_principal(Some("service-account".into()));
        let plain = factory.create_message(Level::Info, "m", &Context::new());
        assert_eq!(plain.principal.as_deref(), Some("service-account"));

        let context = Context::new().with("@principal", "alice").with("@logPoint", "main.rs:10");
        let overridden = factory.create_message(Level::Info, "m", &context);
        assert_eq!(overridden.principal.as_deref(), Some("alice"));
        assert_eq!(overridden.log_point.as_deref(), Some("main.rs:10"));
        assert!(overridden.extra_data.is_empty());
    }

    #[test]
    fn closure_principal_provider() {
        let factory = factory().with_principal_provider(|| Some("from-session".to_string()));
        let envelope = factory.create_message(Level::Debug, "m", &Context::new());
        assert_eq!(envelope.principal.as_deref(), Some("from-session"));
    }

    #[test]
    fn identical_inputs_yield_identical_envelopes_apart_from_timestamp() {
        let f = factory();
        let context = Context::new()
            .with("exception", ExceptionRecord::new("E", "x"))
            .with("n", 1);

        let mut a = f.create_message(Level::Warning, "same", &context);
        let mut b = f.create_message(Level::Warning, "same", &context);
        a.timestamp = 0;
        b.timestamp = 0;
        assert_eq!(a, b);
    }

    #[test]
    fn factory_is_shareable_across_threads() {
        let f = Arc::new(factory());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let f = Arc::clone(&f);
                std::thread::spawn(move || {
                    f.create_message(Level::Info, "m", &Context::new().with("worker", i))
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let envelope = handle.join().unwrap();
            assert_eq!(envelope.extra_data["worker"], i.to_string());
        }
    }
}
