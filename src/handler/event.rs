//! Inbound event envelope
//!
//! ```json
//! {
//!   "arguments": { "message": "User message here", "sessionId": "optional-session-id" },
//!   "identity": { "sub": "user-id" },
//!   "info": { "fieldName": "chat" }
//! }
//! ```

use serde::Deserialize;
use serde_json::Value;

use crate::core::{HandlerError, HandlerResult};
use crate::session::default_session_id;

/// User id used when the event carries no identity
pub const ANONYMOUS_USER: &str = "anonymous";

/// Resolver an event is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverField {
    /// Session-backed chat (default)
    Chat,
    /// Stateless single-turn `sendMessage`
    SendMessage,
}

/// Caller identity attached by the platform
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Identity {
    /// Usually a string; numbers and booleans are accepted as their text
    #[serde(default)]
    pub sub: Option<Value>,
}

/// Resolver metadata attached by the platform
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverInfo {
    #[serde(default)]
    pub field_name: Option<String>,
}

/// A GraphQL resolver event
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppSyncEvent {
    /// Resolver arguments; anything other than an object reads as empty
    #[serde(default)]
    pub arguments: Value,
    #[serde(default)]
    pub identity: Option<Identity>,
    #[serde(default)]
    pub info: Option<ResolverInfo>,
}

impl AppSyncEvent {
    /// Parse a raw event. A null event is rejected.
    pub fn parse(event: Value) -> HandlerResult<Self> {
        if event.is_null() {
            return Err(HandlerError::InvalidEvent("Event is None".to_string()));
        }
        serde_json::from_value(event)
            .map_err(|e| HandlerError::InvalidEvent(format!("Malformed event: {}", e)))
    }

    /// Which resolver this event targets
    pub fn field(&self) -> ResolverField {
        match self.info.as_ref().and_then(|i| i.field_name.as_deref()) {
            Some("sendMessage") => ResolverField::SendMessage,
            _ => ResolverField::Chat,
        }
    }

    /// Caller's user id, `"anonymous"` when absent
    pub fn user_id(&self) -> String {
        self.identity
            .as_ref()
            .and_then(|i| i.sub.as_ref())
            .and_then(scalar_text)
            .unwrap_or_else(|| ANONYMOUS_USER.to_string())
    }

    /// A string argument; absent, null and empty all read as `None`
    pub fn argument_str(&self, name: &str) -> HandlerResult<Option<&str>> {
        match self.arguments.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(HandlerError::validation(format!(
                "Field {} must be a string",
                name
            ))),
        }
    }

    /// A scalar argument as text; numbers and booleans are converted
    pub fn argument_text(&self, name: &str) -> HandlerResult<Option<String>> {
        match self.arguments.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(value) => scalar_text(value).map(Some).ok_or_else(|| {
                HandlerError::validation(format!("Field {} must be a string", name))
            }),
        }
    }
}

/// Text of a string, number or boolean; `None` for anything else
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A validated `chat` request
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: String,
    pub user_id: String,
}

impl ChatRequest {
    /// Validate arguments and resolve the session id
    pub fn from_event(event: &AppSyncEvent) -> HandlerResult<Self> {
        let message = event
            .argument_str("message")?
            .ok_or_else(|| HandlerError::validation("Missing required field: message"))?;

        let user_id = event.user_id();
        let session_id = match event.argument_text("sessionId")? {
            Some(id) => id,
            None => default_session_id(&user_id),
        };

        Ok(Self {
            message: message.to_string(),
            session_id,
            user_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(event: Value) -> HandlerResult<ChatRequest> {
        ChatRequest::from_event(&AppSyncEvent::parse(event)?)
    }

    #[test]
    fn test_null_event_is_rejected() {
        let err = AppSyncEvent::parse(Value::Null).unwrap_err();
        assert!(matches!(err, HandlerError::InvalidEvent(ref m) if m == "Event is None"));
    }

    #[test]
    fn test_explicit_session_id() {
        let req = request(json!({
            "arguments": {"message": "Hello", "sessionId": "test_session_123"},
            "identity": {"sub": "test-user-id"}
        }))
        .unwrap();
        assert_eq!(req.message, "Hello");
        assert_eq!(req.session_id, "test_session_123");
        assert_eq!(req.user_id, "test-user-id");
    }

    #[test]
    fn test_derived_session_id() {
        let req = request(json!({
            "arguments": {"message": "Hello"},
            "identity": {"sub": "u-42"}
        }))
        .unwrap();
        assert_eq!(req.session_id, "user_u-42_session");

        let req = request(json!({"arguments": {"message": "Hello", "sessionId": ""}})).unwrap();
        assert_eq!(req.session_id, "user_anonymous_session");
    }

    #[test]
    fn test_missing_identity_defaults_to_anonymous() {
        for event in [
            json!({"arguments": {"message": "Hi"}}),
            json!({"arguments": {"message": "Hi"}, "identity": null}),
            json!({"arguments": {"message": "Hi"}, "identity": {}}),
            json!({"arguments": {"message": "Hi"}, "identity": {"sub": null}}),
        ] {
            assert_eq!(request(event).unwrap().user_id, "anonymous");
        }
    }

    #[test]
    fn test_scalar_ids_are_accepted() {
        let req = request(json!({
            "arguments": {"message": "Hi", "sessionId": 123},
            "identity": {"sub": 42}
        }))
        .unwrap();
        assert_eq!(req.session_id, "123");
        assert_eq!(req.user_id, "42");

        let req = request(json!({"arguments": {"message": "Hi"}, "identity": {"sub": 7}})).unwrap();
        assert_eq!(req.session_id, "user_7_session");

        let err = request(json!({"arguments": {"message": "Hi", "sessionId": {"id": 1}}})).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "Field sessionId must be a string");
    }

    #[test]
    fn test_missing_message() {
        for event in [
            json!({"arguments": {}}),
            json!({"arguments": {"message": null}}),
            json!({"arguments": {"message": ""}}),
            json!({}),
        ] {
            let err = request(event).unwrap_err();
            assert_eq!(err.status_code(), 400);
            assert_eq!(err.to_string(), "Missing required field: message");
        }
    }

    #[test]
    fn test_non_string_message() {
        let err = request(json!({"arguments": {"message": 42}})).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "Field message must be a string");
    }

    #[test]
    fn test_resolver_field() {
        let event = AppSyncEvent::parse(json!({"info": {"fieldName": "sendMessage"}})).unwrap();
        assert_eq!(event.field(), ResolverField::SendMessage);

        let event = AppSyncEvent::parse(json!({"info": {"fieldName": "chat"}})).unwrap();
        assert_eq!(event.field(), ResolverField::Chat);
        assert_eq!(AppSyncEvent::parse(json!({})).unwrap().field(), ResolverField::Chat);
    }

    #[test]
    fn test_malformed_event() {
        let err = AppSyncEvent::parse(json!({"identity": "nobody"})).unwrap_err();
        assert!(matches!(err, HandlerError::InvalidEvent(_)));
        assert_eq!(err.status_code(), 500);
    }
}
