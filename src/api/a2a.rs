//! JSON-RPC 2.0 envelope for agent-to-agent (`message/send`) calls

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::AgentReply;

pub const SEND_MESSAGE: &str = "message/send";

pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Deserialize)]
struct SendParams {
    message: IncomingMessage,
}

#[derive(Debug, Deserialize)]
struct IncomingMessage {
    #[serde(default)]
    parts: Vec<IncomingPart>,
}

#[derive(Debug, Deserialize)]
struct IncomingPart {
    kind: Option<String>,
    text: Option<String>,
}

impl JsonRpcRequest {
    /// Text of every text part in `params.message`, joined by spaces.
    /// `None` when the params don't describe a message.
    pub fn message_text(&self) -> Option<String> {
        let params = SendParams::deserialize(&self.params).ok()?;
        let text = params
            .message
            .parts
            .into_iter()
            .filter(|part| part.kind.as_deref().is_none_or(|kind| kind == "text"))
            .filter_map(|part| part.text)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Some(text)
    }
}

#[derive(Debug, Serialize)]
pub struct TextPart {
    pub kind: &'static str,
    pub text: String,
}

/// Agent reply in A2A message form; reply fields are flattened alongside
#[derive(Debug, Serialize)]
pub struct AgentMessage {
    pub kind: &'static str,
    pub role: &'static str,
    pub parts: Vec<TextPart>,
    #[serde(flatten)]
    pub reply: AgentReply,
}

impl From<AgentReply> for AgentMessage {
    fn from(reply: AgentReply) -> Self {
        Self {
            kind: "message",
            role: "agent",
            parts: vec![TextPart {
                kind: "text",
                text: reply.text.clone(),
            }],
            reply,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AgentMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn result(id: Value, reply: AgentReply) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(reply.into()),
            error: None,
        }
    }

    pub fn error<S: Into<String>>(id: Value, code: i64, message: S) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(params: Value) -> JsonRpcRequest {
        serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": SEND_MESSAGE,
            "params": params
        }))
        .unwrap()
    }

    #[test]
    fn test_message_text_joins_text_parts() {
        let request = request(json!({
            "message": {
                "role": "user",
                "parts": [
                    {"kind": "text", "text": "directions from Lagos"},
                    {"kind": "data", "data": {"ignored": true}},
                    {"kind": "text", "text": " to Abuja "}
                ]
            }
        }));
        assert_eq!(
            request.message_text().as_deref(),
            Some("directions from Lagos to Abuja")
        );
    }

    #[test]
    fn test_message_text_missing_message() {
        assert_eq!(request(json!({})).message_text(), None);
        assert_eq!(
            request(json!({"message": {"parts": []}})).message_text().as_deref(),
            Some("")
        );
    }

    #[test]
    fn test_result_serialization() {
        let response = JsonRpcResponse::result(json!("abc"), AgentReply::text("hi"));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({
                "jsonrpc": "2.0",
                "id": "abc",
                "result": {
                    "kind": "message",
                    "role": "agent",
                    "parts": [{"kind": "text", "text": "hi"}],
                    "text": "hi"
                }
            })
        );
    }

    #[test]
    fn test_error_serialization() {
        let response = JsonRpcResponse::error(json!(1), METHOD_NOT_FOUND, "Method not found");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32601, "message": "Method not found"}})
        );
    }
}
