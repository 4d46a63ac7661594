//! JSON message types for secret requests and agent replies.

use crate::error::ProtocolError;
use serde::Serialize;
use serde_json::Value;

/// Reply field carrying an agent-side error reason.
pub const ERROR_FIELD: &str = "Error";

/// Reply field carrying the base64-encoded secret.
pub const SECRET_VALUE_FIELD: &str = "SecretValue";

/// Names the secret being requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretId {
    /// Secret key. Forwarded as-is, even when empty.
    pub secret_key: String,
    /// Optional resource subpath qualifying the key.
    pub resource: Option<String>,
}

impl SecretId {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            resource: None,
        }
    }

    /// Sets the resource subpath. An empty subpath is the same as none.
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        let resource = resource.into();
        self.resource = if resource.is_empty() {
            None
        } else {
            Some(resource)
        };
        self
    }

    /// Returns the request message for this id.
    pub fn request(&self) -> SecretRequest<'_> {
        SecretRequest {
            resource: self.resource.as_deref().filter(|r| !r.is_empty()),
            secret_key: &self.secret_key,
        }
    }
}

/// Request message as sent to the agent.
///
/// Serializes to `{"SecretKey":"..."}` or, with a resource,
/// `{"Resource":"...","SecretKey":"..."}`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SecretRequest<'a> {
    #[serde(rename = "Resource", skip_serializing_if = "Option::is_none")]
    pub resource: Option<&'a str>,

    #[serde(rename = "SecretKey")]
    pub secret_key: &'a str,
}

impl SecretRequest<'_> {
    /// Serializes the request payload.
    pub fn to_json(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// The meaning of an agent reply document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentReply {
    /// The agent reported an error; the reason is carried verbatim.
    Failure(String),
    /// The agent returned a secret, still base64-encoded and untrimmed.
    Secret(String),
    /// Neither an error nor a secret value was present.
    Unrecognized,
}

impl AgentReply {
    /// Parses a reply payload.
    ///
    /// Fails only when the payload is not valid JSON. An `Error` string takes
    /// precedence over a `SecretValue` string when both are present; fields
    /// holding non-string values are treated as absent.
    pub fn parse(payload: &[u8]) -> Result<Self, ProtocolError> {
        let doc: Value =
            serde_json::from_slice(payload).map_err(|e| ProtocolError::malformed(&e))?;
        Ok(Self::from_document(&doc))
    }

    /// Classifies an already parsed document.
    pub fn from_document(doc: &Value) -> Self {
        if let Some(reason) = string_field(doc, ERROR_FIELD) {
            return AgentReply::Failure(reason.to_string());
        }
        match string_field(doc, SECRET_VALUE_FIELD) {
            Some(value) => AgentReply::Secret(value.to_string()),
            None => AgentReply::Unrecognized,
        }
    }
}

fn string_field<'a>(doc: &'a Value, name: &str) -> Option<&'a str> {
    doc.get(name).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_request_key_only() {
        let id = SecretId::new("db-password");
        let json = id.request().to_json().unwrap();
        assert_eq!(json, br#"{"SecretKey":"db-password"}"#);
    }

    #[test]
    fn test_request_with_resource() {
        let id = SecretId::new("db-password").with_resource("prod/cluster-a");
        let json = id.request().to_json().unwrap();
        assert_eq!(
            json,
            br#"{"Resource":"prod/cluster-a","SecretKey":"db-password"}"#
        );
    }

    #[test]
    fn test_request_empty_resource_is_omitted() {
        let id = SecretId::new("k").with_resource("");
        assert!(id.resource.is_none());
        assert_eq!(id.request().to_json().unwrap(), br#"{"SecretKey":"k"}"#);

        // Constructed directly, an empty resource still produces the short form.
        let id = SecretId {
            secret_key: "k".to_string(),
            resource: Some(String::new()),
        };
        assert_eq!(id.request().to_json().unwrap(), br#"{"SecretKey":"k"}"#);
    }

    #[test]
    fn test_request_empty_key_forwarded() {
        let json = SecretId::new("").request().to_json().unwrap();
        assert_eq!(json, br#"{"SecretKey":""}"#);
    }

    #[test]
    fn test_request_escapes_quotes() {
        let id = SecretId::new(r#"we"ird\key"#);
        let json = id.request().to_json().unwrap();
        let parsed: Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(parsed["SecretKey"], r#"we"ird\key"#);
    }

    #[test]
    fn test_reply_error() {
        let reply = AgentReply::parse(br#"{"Error":"not authorized"}"#).unwrap();
        assert_eq!(reply, AgentReply::Failure("not authorized".to_string()));
    }

    #[test]
    fn test_reply_secret() {
        let reply = AgentReply::parse(br#"{"SecretValue":"aGVsbG8="}"#).unwrap();
        assert_eq!(reply, AgentReply::Secret("aGVsbG8=".to_string()));
    }

    #[test]
    fn test_reply_error_takes_precedence() {
        let reply =
            AgentReply::parse(br#"{"SecretValue":"aGVsbG8=","Error":"revoked"}"#).unwrap();
        assert_eq!(reply, AgentReply::Failure("revoked".to_string()));
    }

    #[test]
    fn test_reply_missing_fields() {
        let reply = AgentReply::parse(br#"{"Something":"else"}"#).unwrap();
        assert_eq!(reply, AgentReply::Unrecognized);
    }

    #[test]
    fn test_reply_non_object() {
        assert_eq!(
            AgentReply::parse(br#"["SecretValue"]"#).unwrap(),
            AgentReply::Unrecognized
        );
        assert_eq!(
            AgentReply::parse(br#""SecretValue""#).unwrap(),
            AgentReply::Unrecognized
        );
    }

    #[test]
    fn test_reply_non_string_fields_ignored() {
        let reply = AgentReply::parse(br#"{"Error":42,"SecretValue":"aGk="}"#).unwrap();
        assert_eq!(reply, AgentReply::Secret("aGk=".to_string()));

        let reply = AgentReply::parse(br#"{"SecretValue":null}"#).unwrap();
        assert_eq!(reply, AgentReply::Unrecognized);
    }

    #[test]
    fn test_reply_malformed() {
        let result = AgentReply::parse(br#"{"SecretValue": "#);
        assert!(matches!(result, Err(ProtocolError::MalformedReply { .. })));

        let result = AgentReply::parse(b"");
        assert!(matches!(result, Err(ProtocolError::MalformedReply { .. })));
    }

    #[test]
    fn test_reply_invalid_utf8() {
        let result = AgentReply::parse(b"{\"SecretValue\":\"\xff\xfe\"}");
        assert!(matches!(result, Err(ProtocolError::MalformedReply { .. })));
    }

    proptest! {
        #[test]
        fn prop_request_is_valid_json(key in ".*", resource in ".*") {
            let id = SecretId::new(key.clone()).with_resource(resource.clone());
            let json = id.request().to_json().unwrap();
            let parsed: Value = serde_json::from_slice(&json).unwrap();

            prop_assert_eq!(parsed["SecretKey"].as_str(), Some(key.as_str()));
            if resource.is_empty() {
                prop_assert!(parsed.get("Resource").is_none());
            } else {
                prop_assert_eq!(parsed["Resource"].as_str(), Some(resource.as_str()));
            }
        }
    }
}
