use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST /api/chat`.
///
/// Every field is optional on the wire so that incomplete bodies reach
/// validation instead of failing extraction. A field of the wrong type reads
/// as absent without affecting the others.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub paid_key_use: Option<bool>,
}

/// `Some` only when the value has the expected type; `null` and mistyped values give `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, message: impl Into<String>, paid_key_use: bool) -> Self {
        Self {
            model: Some(model.into()),
            message: Some(message.into()),
            paid_key_use: Some(paid_key_use),
        }
    }

    /// Parse a raw body, treating anything that is not a valid request object as empty.
    pub fn from_body_lenient(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub reply: String,
}

impl ChatResponse {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

/// Standard error response format
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_parse_of_invalid_json() {
        assert_eq!(ChatRequest::from_body_lenient(b"not json"), ChatRequest::default());
        assert_eq!(ChatRequest::from_body_lenient(b""), ChatRequest::default());
        assert_eq!(ChatRequest::from_body_lenient(b"[1, 2]"), ChatRequest::default());
    }

    #[test]
    fn test_wrong_field_type_only_drops_that_field() {
        let request = ChatRequest::from_body_lenient(br#"{"model": 42, "message": "hi"}"#);
        assert_eq!(request.model, None);
        assert_eq!(request.message.as_deref(), Some("hi"));

        let request = ChatRequest::from_body_lenient(
            br#"{"model": "m", "message": "hi", "paidKeyUse": "yes"}"#,
        );
        assert_eq!(request.model.as_deref(), Some("m"));
        assert_eq!(request.message.as_deref(), Some("hi"));
        assert_eq!(request.paid_key_use, None);

        let request = ChatRequest::from_body_lenient(br#"{"model": null, "paidKeyUse": 1}"#);
        assert_eq!(request, ChatRequest::default());
    }

    #[test]
    fn test_camel_case_paid_key_flag() {
        let request = ChatRequest::from_body_lenient(
            br#"{"model": "m", "message": "hi", "paidKeyUse": true}"#,
        );
        assert_eq!(request.paid_key_use, Some(true));

        let json = serde_json::to_value(ChatRequest::new("m", "hi", false)).unwrap();
        assert_eq!(json["paidKeyUse"], false);
    }

    #[test]
    fn test_absent_fields_stay_absent() {
        let request = ChatRequest::from_body_lenient(br#"{"model": "m"}"#);
        assert_eq!(request.model.as_deref(), Some("m"));
        assert!(request.message.is_none());
        assert!(request.paid_key_use.is_none());
    }
}
