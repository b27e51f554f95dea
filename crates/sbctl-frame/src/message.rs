//! Structured commands and responses carried inside encrypted frames.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Whether a command reads or writes a device category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Get,
    Set,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::Get => write!(f, "get"),
            CommandKind::Set => write!(f, "set"),
        }
    }
}

/// A single request to the device.
///
/// Serializes to the canonical `{"cmd": ..., "msg": ..., "data"?: {...}}`
/// document. `data` is omitted entirely when there is no payload. Commands
/// are immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    #[serde(rename = "cmd")]
    kind: CommandKind,
    #[serde(rename = "msg")]
    target: String,
    #[serde(rename = "data", default, skip_serializing_if = "Option::is_none")]
    payload: Option<Map<String, Value>>,
}

impl Command {
    /// Read a device category, e.g. `EQ_VIEW_INFO`.
    pub fn get(target: impl Into<String>) -> Self {
        Self {
            kind: CommandKind::Get,
            target: target.into(),
            payload: None,
        }
    }

    /// Write fields of a device category.
    pub fn set(target: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self {
            kind: CommandKind::Set,
            target: target.into(),
            payload: Some(payload),
        }
    }

    /// Write a single field of a device category.
    pub fn set_field(
        target: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        let mut payload = Map::new();
        payload.insert(field.into(), value.into());
        Self::set(target, payload)
    }

    /// A set request with no data, used for device actions such as
    /// `TEST_TONE_REQ`.
    pub fn trigger(target: impl Into<String>) -> Self {
        Self {
            kind: CommandKind::Set,
            target: target.into(),
            payload: None,
        }
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn payload(&self) -> Option<&Map<String, Value>> {
        self.payload.as_ref()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.target)
    }
}

/// A decoded device response.
///
/// The device answers with a JSON document whose `data` object holds the
/// fields of the requested category. The exact field set is device-defined.
#[derive(Debug, Clone, PartialEq)]
pub struct Response(Value);

impl Response {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The `data` object, if the response carries one.
    pub fn data(&self) -> Option<&Map<String, Value>> {
        self.0.get("data").and_then(Value::as_object)
    }

    /// A field inside the `data` object.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data().and_then(|data| data.get(name))
    }

    /// The category name echoed by the device, when present.
    pub fn msg(&self) -> Option<&str> {
        self.0.get("msg").and_then(Value::as_str)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Response {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn get_omits_data() {
        let text = serde_json::to_string(&Command::get("EQ_VIEW_INFO")).unwrap();
        assert_eq!(text, r#"{"cmd":"get","msg":"EQ_VIEW_INFO"}"#);
    }

    #[test]
    fn set_field_serializes_data_object() {
        let cmd = Command::set_field("SPK_LIST_VIEW_INFO", "i_vol", 7);
        let value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(
            value,
            json!({"cmd": "set", "msg": "SPK_LIST_VIEW_INFO", "data": {"i_vol": 7}})
        );
        assert_eq!(cmd.kind(), CommandKind::Set);
        assert_eq!(cmd.target(), "SPK_LIST_VIEW_INFO");
    }

    #[test]
    fn trigger_is_set_without_data() {
        let cmd = Command::trigger("TEST_TONE_REQ");
        assert_eq!(cmd.kind(), CommandKind::Set);
        assert!(cmd.payload().is_none());
        assert_eq!(
            serde_json::to_string(&cmd).unwrap(),
            r#"{"cmd":"set","msg":"TEST_TONE_REQ"}"#
        );
    }

    #[test]
    fn command_display() {
        assert_eq!(Command::get("PLAY_INFO").to_string(), "get PLAY_INFO");
    }

    #[test]
    fn response_accessors() {
        let response = Response::new(json!({
            "msg": "SPK_LIST_VIEW_INFO",
            "data": {"i_vol": 12, "b_mute": false}
        }));
        assert_eq!(response.msg(), Some("SPK_LIST_VIEW_INFO"));
        assert_eq!(response.field("i_vol"), Some(&json!(12)));
        assert_eq!(response.field("b_mute"), Some(&json!(false)));
        assert!(response.field("missing").is_none());
    }

    #[test]
    fn response_without_data_object() {
        let response = Response::new(json!({"result": true}));
        assert!(response.data().is_none());
        assert!(response.field("i_vol").is_none());
    }
}
