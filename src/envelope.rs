use std::collections::BTreeMap;

use serde::Serialize;

use crate::level::{Level, MessageType};

/// Metadata envelope sent to the logging hub for one log call.
///
/// Serializes to a flat JSON object whose reserved keys are prefixed
/// with `@`. Absent optional fields are omitted rather than sent as
/// `null`, and `@extraData` only appears when it holds at least one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope {
    /// Milliseconds since the Unix epoch.
    #[serde(rename = "@timestamp")]
    pub timestamp: i64,
    #[serde(rename = "@probeType")]
    pub probe_type: String,
    #[serde(rename = "@messageType")]
    pub message_type: MessageType,
    #[serde(rename = "@logLevel")]
    pub log_level: Level,
    #[serde(rename = "@messageText")]
    pub message_text: String,
    #[serde(rename = "@principal", skip_serializing_if = "Option::is_none")]
    pub principal: Option<String>,
    #[serde(rename = "@applicationName", skip_serializing_if = "Option::is_none")]
    pub application_name: Option<String>,
    #[serde(rename = "@serverName", skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
    #[serde(rename = "@serverIp", skip_serializing_if = "Option::is_none")]
    pub server_ip: Option<String>,
    #[serde(rename = "@exception", skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
    #[serde(rename = "@rootException", skip_serializing_if = "Option::is_none")]
    pub root_exception: Option<String>,
    #[serde(rename = "@stackTrace", skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    #[serde(rename = "@logPoint", skip_serializing_if = "Option::is_none")]
    pub log_point: Option<String>,
    #[serde(rename = "@extraData", skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_data: BTreeMap<String, String>,
}

impl Envelope {
    /// Route one context-derived field: reserved keys overwrite the
    /// matching top-level field, everything else goes to `@extraData`.
    pub fn insert_field(&mut self, key: String, value: String) {
        let slot = match key.as_str() {
            "@exception" => &mut self.exception,
            "@rootException" => &mut self.root_exception,
            "@stackTrace" => &mut self.stack_trace,
            "@logPoint" => &mut self.log_point,
            "@principal" => &mut self.principal,
            _ => {
                self.extra_data.insert(key, value);
                return;
            }
        };
        *slot = Some(value);
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
