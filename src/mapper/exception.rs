use super::{Fields, Mapper};
use crate::value::ContextValue;

/// Context key under which the primary error of a log call is stored.
pub const DEFAULT_EXCEPTION_KEY: &str = "exception";

/// Expands error values into `{key}_class`, `{key}_stacktrace`,
/// `{key}_message`, `{key}_code`, `{key}_file` and `{key}_line`.
///
/// When the entry sits under the primary exception key the mapper also
/// emits the reserved `@exception` and `@stackTrace` fields, which lifts
/// the error into first-class envelope metadata.
#[derive(Debug, Clone)]
pub struct ExceptionMapper {
    exception_key: String,
}

impl ExceptionMapper {
    pub fn new(exception_key: impl Into<String>) -> Self {
        ExceptionMapper { exception_key: exception_key.into() }
    }

    pub fn exception_key(&self) -> &str {
        &self.exception_key
    }
}

impl Default for ExceptionMapper {
    fn default() -> Self {
        Self::new(DEFAULT_EXCEPTION_KEY)
    }
}

impl Mapper for ExceptionMapper {
    fn supports(&self, _key: &str, value: &ContextValue) -> bool {
        matches!(value, ContextValue::Exception(_))
    }

    fn map(&self, key: &str, value: &ContextValue) -> Fields {
        let mut fields = Fields::new();
        let ContextValue::Exception(exception) = value else {
            return fields;
        };

        fields.insert(format!("{key}_class"), exception.class.clone().into());
        fields.insert(format!("{key}_stacktrace"), exception.stack_trace.clone().into());
        fields.insert(format!("{key}_message"), exception.message.clone().into());
        fields.insert(format!("{key}_code"), exception.code.into());
        fields.insert(format!("{key}_file"), exception.file.clone().into());
        fields.insert(format!("{key}_line"), exception.line.into());

        if key == self.exception_key {
            fields.insert("@exception".to_string(), exception.class.clone().into());
            fields.insert("@stackTrace".to_string(), exception.stack_trace.clone().into());
        }

        fields
    }
}
