//! Media type resolution and payload decoding.
//!
//! A content map is matched by specificity, never by declaration order:
//!
//! 1. the exact media type, e.g. `application/json`;
//! 2. the subtype wildcard of its top-level type, e.g. `application/*`;
//! 3. the full wildcard `*/*`.
//!
//! Parameters such as `charset` are ignored and matching is
//! case-insensitive.

use bytes::Bytes;
use serde_json::{Map, Value};

use crate::error::PreValidationError;
use crate::schema::ContentMap;

/// Media type of form submissions.
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Strips parameters and lowercases a `Content-Type` value.
///
/// ```rust
/// use daedalus_validation::media_type::normalize;
///
/// assert_eq!(normalize("Text/HTML; charset=UTF-8"), "text/html");
/// ```
pub fn normalize(raw: &str) -> String {
    raw.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// The content map entry chosen for a media type.
#[derive(Debug)]
pub struct MediaMatch<'a, S> {
    /// The declared key that matched, e.g. `application/*`.
    pub pattern: &'a str,
    /// The schema declared for it.
    pub schema: &'a S,
}

/// Finds the entry of `content` for the raw `Content-Type` value.
///
/// A missing content type only matches `*/*`.
pub fn resolve<'a, S>(
    content: &'a ContentMap<S>,
    content_type: Option<&str>,
) -> Result<MediaMatch<'a, S>, PreValidationError> {
    let requested = content_type.map(normalize).filter(|m| !m.is_empty());

    let mut candidates = Vec::with_capacity(3);
    if let Some(media) = &requested {
        candidates.push(media.clone());
        if let Some((top, _)) = media.split_once('/') {
            candidates.push(format!("{top}/*"));
        }
    }
    candidates.push("*/*".to_string());

    for candidate in &candidates {
        if let Some((pattern, schema)) = content.iter().find(|(key, _)| *key == candidate.as_str()) {
            return Ok(MediaMatch { pattern, schema });
        }
    }

    Err(PreValidationError::UnsupportedMediaType {
        supported: content.media_types(),
        requested,
    })
}

/// Returns `true` for `application/json` and `*/*+json` types.
pub fn is_json(media_type: &str) -> bool {
    media_type == "application/json" || media_type.ends_with("+json")
}

/// Decodes a JSON payload. An empty payload is `null`.
pub fn parse_json(bytes: &Bytes) -> Result<Value, PreValidationError> {
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|e| PreValidationError::InvalidJson {
        cause: e.to_string(),
    })
}

/// Decodes a payload according to its media type.
///
/// - JSON types are parsed as JSON.
/// - `text/*` becomes a JSON string.
/// - Form submissions become an object; repeated keys become arrays.
/// - Anything else is parsed as JSON when possible, and kept as text
///   otherwise.
///
/// An empty payload is `null` whatever its type.
pub fn parse_payload(media_type: Option<&str>, bytes: &Bytes) -> Result<Value, PreValidationError> {
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    let media = media_type.map(normalize).unwrap_or_default();

    if is_json(&media) {
        return parse_json(bytes);
    }
    if media == FORM_URLENCODED {
        let pairs: Vec<(String, String)> =
            serde_urlencoded::from_bytes(bytes).map_err(|e| PreValidationError::InvalidBody {
                cause: e.to_string(),
            })?;
        return Ok(pairs_to_object(pairs));
    }
    if media.starts_with("text/") {
        return text(bytes).map(Value::String);
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Ok(value),
        Err(_) => text(bytes).map(Value::String),
    }
}

fn text(bytes: &Bytes) -> Result<String, PreValidationError> {
    std::str::from_utf8(bytes)
        .map(ToString::to_string)
        .map_err(|e| PreValidationError::InvalidBody {
            cause: e.to_string(),
        })
}

/// Folds key/value pairs into an object. Repeated keys collect into an
/// array in order of appearance.
pub fn pairs_to_object<I>(pairs: I) -> Value
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut map = Map::new();
    for (key, value) in pairs {
        match map.get_mut(&key) {
            Some(Value::Array(values)) => values.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                map.insert(key, Value::String(value));
            }
        }
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn map(keys: &[&str]) -> ContentMap<usize> {
        keys.iter().enumerate().map(|(i, k)| (*k, i)).collect()
    }

    #[test]
    fn test_precedence_ignores_declaration_order() {
        let content = map(&["*/*", "application/*", "application/json"]);
        let hit = resolve(&content, Some("application/json")).unwrap();
        assert_eq!(hit.pattern, "application/json");
        assert_eq!(*hit.schema, 2);

        let hit = resolve(&content, Some("application/problem+json")).unwrap();
        assert_eq!(hit.pattern, "application/*");

        let hit = resolve(&content, Some("image/png")).unwrap();
        assert_eq!(hit.pattern, "*/*");
    }

    #[test]
    fn test_parameters_and_case_are_ignored() {
        let content = map(&["application/json"]);
        let hit = resolve(&content, Some("Application/JSON; charset=utf-8")).unwrap();
        assert_eq!(hit.pattern, "application/json");
    }

    #[test]
    fn test_unmatched_reports_supported_and_requested() {
        let content = map(&["application/json", "text/plain"]);
        let err = resolve(&content, Some("application/xml")).unwrap_err();
        assert_eq!(
            err,
            PreValidationError::UnsupportedMediaType {
                supported: vec!["application/json".into(), "text/plain".into()],
                requested: Some("application/xml".into()),
            }
        );
    }

    #[test]
    fn test_missing_content_type_only_matches_full_wildcard() {
        assert!(resolve(&map(&["application/json"]), None).is_err());
        assert_eq!(resolve(&map(&["*/*"]), None).unwrap().pattern, "*/*");
    }

    #[test]
    fn test_parse_payload_by_type() {
        let json_body = Bytes::from_static(br#"{"a":1}"#);
        assert_eq!(parse_payload(Some("application/json"), &json_body).unwrap(), json!({"a": 1}));

        let plain = Bytes::from_static(b"hello");
        assert_eq!(parse_payload(Some("text/plain"), &plain).unwrap(), json!("hello"));

        let form = Bytes::from_static(b"tag=a&tag=b&name=x");
        assert_eq!(
            parse_payload(Some(FORM_URLENCODED), &form).unwrap(),
            json!({"tag": ["a", "b"], "name": "x"})
        );

        assert_eq!(parse_payload(Some("application/json"), &Bytes::new()).unwrap(), Value::Null);
    }

    #[test]
    fn test_malformed_json_is_pre_validation_failure() {
        let err = parse_payload(Some("application/json"), &Bytes::from_static(b"{")).unwrap_err();
        assert_eq!(err.code(), "INVALID_JSON");
    }

    proptest! {
        #[test]
        fn exact_entry_always_wins(order in Just(vec!["application/json", "application/*", "*/*"]).prop_shuffle()) {
            let content = map(&order);
            let hit = resolve(&content, Some("application/json")).unwrap();
            prop_assert_eq!(hit.pattern, "application/json");
        }
    }
}
