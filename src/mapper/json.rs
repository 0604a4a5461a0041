use super::{Fields, Mapper};
use crate::value::ContextValue;

/// Encodes structured JSON values as compact JSON strings under the same key.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMapper;

impl Mapper for JsonMapper {
    fn supports(&self, _key: &str, value: &ContextValue) -> bool {
        matches!(value, ContextValue::Json(_))
    }

    fn map(&self, key: &str, value: &ContextValue) -> Fields {
        let mut fields = Fields::new();
        if let ContextValue::Json(json) = value {
            fields.insert(key.to_string(), ContextValue::String(json.to_string()));
        }
        fields
    }
}
