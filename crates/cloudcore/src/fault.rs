//! Provider fault parsing
//!
//! Control planes report failures as JSON bodies keyed by an error class,
//! e.g. `{"itemNotFound": {"message": "..."}}` from Nova or
//! `{"error": {"message": "..."}}` from Keystone. The message is found by
//! matching the HTTP class name against the body's keys. This is a best-effort
//! heuristic; anything it cannot parse is reported verbatim.

use reqwest::StatusCode;
use serde_json::Value;

/// An HTTP-level failure returned by a provider endpoint
#[derive(Debug, Clone)]
pub struct ApiFault {
    pub status: StatusCode,
    pub body: String,
}

impl ApiFault {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Class name derived from the status, e.g. `NotFound` for 404
    pub fn class_name(&self) -> String {
        self.status
            .canonical_reason()
            .unwrap_or("Error")
            .split(|c: char| !c.is_ascii_alphanumeric())
            .collect()
    }

    /// Raw text, used when debug output is enabled
    pub fn raw(&self) -> String {
        format!("HTTP {}: {}", self.status.as_u16(), self.body.trim())
    }

    /// Human-readable message, or the raw text in debug mode
    pub fn describe(&self, debug: bool) -> String {
        if debug {
            return self.raw();
        }
        self.parsed_message().unwrap_or_else(|| self.raw())
    }

    /// Extract `<field>.message` where `<field>` matches the class name
    pub fn parsed_message(&self) -> Option<String> {
        let body: Value = serde_json::from_str(&self.body).ok()?;
        let map = body.as_object()?;
        let class = self.class_name().to_lowercase();

        let field = map
            .keys()
            .find(|key| key.to_lowercase().contains(&class))
            .or_else(|| map.keys().find(|key| key.as_str() == "error"))
            .or_else(|| {
                map.iter()
                    .find(|(_, v)| v.get("message").is_some())
                    .map(|(k, _)| k)
            })?;

        match &map[field] {
            Value::Object(inner) => inner
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            Value::String(text) => Some(text.clone()),
            _ => None,
        }
    }
}

impl std::fmt::Display for ApiFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_name() {
        let fault = ApiFault::new(StatusCode::NOT_FOUND, "");
        assert_eq!(fault.class_name(), "NotFound");
        let fault = ApiFault::new(StatusCode::BAD_REQUEST, "");
        assert_eq!(fault.class_name(), "BadRequest");
    }

    #[test]
    fn test_matches_field_by_class_name() {
        let fault = ApiFault::new(
            StatusCode::NOT_FOUND,
            r#"{"itemNotFound": {"message": "Instance could not be found.", "code": 404}}"#,
        );
        assert_eq!(fault.describe(false), "Instance could not be found.");
    }

    #[test]
    fn test_falls_back_to_error_field() {
        let fault = ApiFault::new(
            StatusCode::UNAUTHORIZED,
            r#"{"error": {"message": "The request you have made requires authentication.", "code": 401, "title": "Unauthorized"}}"#,
        );
        assert_eq!(
            fault.describe(false),
            "The request you have made requires authentication."
        );
    }

    #[test]
    fn test_falls_back_to_any_message_field() {
        let fault = ApiFault::new(
            StatusCode::FORBIDDEN,
            r#"{"quotaExceeded": {"message": "Quota exceeded for cores"}}"#,
        );
        assert_eq!(fault.describe(false), "Quota exceeded for cores");
    }

    #[test]
    fn test_unparsable_body_is_raw() {
        let fault = ApiFault::new(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert_eq!(fault.describe(false), "HTTP 502: <html>bad gateway</html>");
    }

    #[test]
    fn test_debug_is_always_raw() {
        let fault = ApiFault::new(
            StatusCode::NOT_FOUND,
            r#"{"itemNotFound": {"message": "gone"}}"#,
        );
        assert!(fault.describe(true).starts_with("HTTP 404: "));
        assert!(fault.describe(true).contains("itemNotFound"));
    }
}
