//! Wire types shared by the dispatcher and the planner tiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the chat layer classified the message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// A fresh planning request
    #[default]
    Text,
    /// An adjustment to an existing plan (budget, duration, swaps)
    Refinement,
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageType::Text => write!(f, "text"),
            MessageType::Refinement => write!(f, "refinement"),
        }
    }
}

impl MessageType {
    /// Parse a wire string, defaulting to `Text` for unknown values
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "refinement" => MessageType::Refinement,
            _ => MessageType::Text,
        }
    }
}

/// A single plan request as received from the chat layer and forwarded to
/// the planner service.
///
/// `session_id` is caller-supplied and stable-but-untrusted; `None` means
/// "no session", not an error. `fast_mode` is an optional per-request
/// override of the configured fast flag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    #[serde(default)]
    pub query: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(default)]
    pub message_type: MessageType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fast_mode: Option<bool>,
}

impl PlanRequest {
    /// Create a request for the given query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Attach a session identifier
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Set the message type
    pub fn with_message_type(mut self, message_type: MessageType) -> Self {
        self.message_type = message_type;
        self
    }

    /// Override the fast flag for this request only
    pub fn with_fast_mode(mut self, fast_mode: bool) -> Self {
        self.fast_mode = Some(fast_mode);
        self
    }
}

/// Successful planner service response body
#[derive(Debug, Clone, Deserialize)]
pub struct PlanReply {
    /// Itinerary payload; absent or empty counts as a soft failure
    #[serde(default)]
    pub markdown: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_camel_case() {
        let req = PlanRequest::new("Delhi to Jaipur, 2 days")
            .with_session_id("sess-1")
            .with_message_type(MessageType::Refinement);

        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["query"], "Delhi to Jaipur, 2 days");
        assert_eq!(json["sessionId"], "sess-1");
        assert_eq!(json["messageType"], "refinement");
        assert!(json.get("fastMode").is_none());
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let req: PlanRequest = serde_json::from_str(r#"{"query": "goa, 3 days"}"#).unwrap();

        assert_eq!(req.query, "goa, 3 days");
        assert_eq!(req.session_id, None);
        assert_eq!(req.message_type, MessageType::Text);
        assert_eq!(req.fast_mode, None);
    }

    #[test]
    fn test_request_tolerates_missing_query() {
        let req: PlanRequest = serde_json::from_str("{}").unwrap();

        assert_eq!(req.query, "");
    }

    #[test]
    fn test_reply_tolerates_missing_markdown() {
        let reply: PlanReply = serde_json::from_str("{}").unwrap();

        assert!(reply.markdown.is_none());
    }

    #[test]
    fn test_message_type_from_str_lossy() {
        assert_eq!(MessageType::from_str_lossy("refinement"), MessageType::Refinement);
        assert_eq!(MessageType::from_str_lossy("text"), MessageType::Text);
        assert_eq!(MessageType::from_str_lossy("garbage"), MessageType::Text);
    }
}
