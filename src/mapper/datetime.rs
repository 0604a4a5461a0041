use chrono::format::{Item, StrftimeItems};

use super::{Fields, Mapper};
use crate::config::ConfigError;
use crate::value::ContextValue;

/// Formats date/time values with a `chrono` format string.
#[derive(Debug, Clone)]
pub struct DateTimeMapper {
    format: String,
}

impl DateTimeMapper {
    /// ISO-8601 with offset, e.g. `2024-03-01T12:30:00+01:00`.
    pub const DEFAULT_FORMAT: &'static str = "%Y-%m-%dT%H:%M:%S%:z";

    /// Rejects formats chrono cannot render, so `map` never fails later.
    pub fn new(format: impl Into<String>) -> Result<Self, ConfigError> {
        let format = format.into();
        if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::InvalidDateFormat(format));
        }
        Ok(DateTimeMapper { format })
    }

    pub fn format(&self) -> &str {
        &self.format
    }
}

impl Default for DateTimeMapper {
    fn default() -> Self {
        DateTimeMapper { format: Self::DEFAULT_FORMAT.to_string() }
    }
}

impl Mapper for DateTimeMapper {
    fn supports(&self, _key: &str, value: &ContextValue) -> bool {
        matches!(value, ContextValue::DateTime(_))
    }

    fn map(&self, key: &str, value: &ContextValue) -> Fields {
        let mut fields = Fields::new();
        if let ContextValue::DateTime(dt) = value {
            fields.insert(
                key.to_string(),
                ContextValue::String(dt.format(&self.format).to_string()),
            );
        }
        fields
    }
}
