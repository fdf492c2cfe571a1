//! Response envelopes

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::core::HandlerError;

/// Current UTC time as ISO-8601 with microseconds and a `+00:00` offset
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Successful `chat` reply
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub session_id: String,
    pub message: String,
    pub response: String,
    pub timestamp: String,
}

/// Failure envelope; `body` is itself a JSON document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status_code: u16,
    pub body: String,
}

impl ErrorResponse {
    pub fn new(status_code: u16, error: &str) -> Self {
        Self {
            status_code,
            body: error_body(error),
        }
    }

    pub fn from_error(err: &HandlerError) -> Self {
        Self::new(err.status_code(), &err.client_message())
    }
}

/// `{"error": "<text>"}` with the separator spacing clients already parse
fn error_body(error: &str) -> String {
    format!("{{\"error\": {}}}", Value::String(error.to_string()))
}

/// Reply of the stateless `sendMessage` resolver
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageReply {
    pub id: String,
    pub content: String,
    pub sender: String,
    pub session_id: Option<String>,
    pub timestamp: String,
}

impl MessageReply {
    pub const ASSISTANT: &'static str = "AI Assistant";
    pub const SYSTEM: &'static str = "System";

    fn new(content: String, sender: &str, session_id: Option<String>) -> Self {
        Self {
            id: Utc::now().timestamp_millis().to_string(),
            content,
            sender: sender.to_string(),
            session_id,
            timestamp: utc_timestamp(),
        }
    }

    /// A model reply
    pub fn assistant(content: impl Into<String>, session_id: Option<String>) -> Self {
        Self::new(content.into(), Self::ASSISTANT, session_id)
    }

    /// An error surfaced as a chat message
    pub fn system(content: impl Into<String>, session_id: Option<String>) -> Self {
        Self::new(content.into(), Self::SYSTEM, session_id)
    }
}

/// Anything the handler can return
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HandlerResponse {
    Chat(ChatResponse),
    Message(MessageReply),
    Error(ErrorResponse),
}

impl HandlerResponse {
    /// Status code of a failure envelope; `None` for successful replies
    pub fn status_code(&self) -> Option<u16> {
        match self {
            HandlerResponse::Error(e) => Some(e.status_code),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.status_code().is_some()
    }
}

impl From<HandlerError> for HandlerResponse {
    fn from(err: HandlerError) -> Self {
        HandlerResponse::Error(ErrorResponse::from_error(&err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use serde_json::json;

    #[test]
    fn test_missing_message_envelope() {
        let response: HandlerResponse =
            HandlerError::validation("Missing required field: message").into();
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "statusCode": 400,
                "body": "{\"error\": \"Missing required field: message\"}"
            })
        );
    }

    #[test]
    fn test_error_body_escapes() {
        let response = ErrorResponse::new(500, "Internal server error: bad \"quote\"");
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["error"], "Internal server error: bad \"quote\"");
    }

    #[test]
    fn test_chat_response_shape() {
        let response = HandlerResponse::Chat(ChatResponse {
            session_id: "s".into(),
            message: "m".into(),
            response: "r".into(),
            timestamp: utc_timestamp(),
        });
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["sessionId"], "s");
        assert!(value.get("statusCode").is_none());
        assert_eq!(response.status_code(), None);
    }

    #[test]
    fn test_timestamp_format() {
        let ts = utc_timestamp();
        assert!(ts.ends_with("+00:00"));
        assert!(DateTime::parse_from_rfc3339(&ts).is_ok());
    }

    #[test]
    fn test_message_reply() {
        let reply = MessageReply::system("Error: boom", Some("s1".into()));
        assert_eq!(reply.sender, "System");
        assert!(reply.id.parse::<i64>().is_ok());

        let value = serde_json::to_value(HandlerResponse::Message(reply)).unwrap();
        assert_eq!(value["sessionId"], "s1");
        assert_eq!(value["content"], "Error: boom");
    }
}
