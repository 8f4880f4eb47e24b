//! Response envelope decoding.
//!
//! Every API answer nests its payload under `content`. Failures come back as
//! an `error` object, and "no results" as a `warning` object with no content.
//! List endpoints return `content.file` as an array when there are several
//! matches and as a bare object when there is exactly one.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_json::error::Category;
use tracing::debug;

use super::error::ApiError;
use super::record::Record;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    content: Option<Value>,
    #[serde(default)]
    error: Option<Notice>,
    #[serde(default)]
    warning: Option<Notice>,
}

#[derive(Debug, Deserialize)]
struct Notice {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Decodes `value` as an array of `T`, or as a single `T` when the array
/// decode fails with a type mismatch.
///
/// Only data (type-mismatch) errors trigger the single-object retry; any other
/// error category propagates unchanged.
///
/// # Errors
///
/// Returns the `serde_json` error of the array decode when it is not a data
/// error, or of the single-object decode otherwise.
pub fn decode_one_or_many<T: DeserializeOwned>(value: &Value) -> Result<Vec<T>, serde_json::Error> {
    match Vec::<T>::deserialize(value) {
        Ok(items) => Ok(items),
        Err(error) if error.classify() == Category::Data => {
            T::deserialize(value).map(|item| vec![item])
        }
        Err(error) => Err(error),
    }
}

fn parse_envelope(body: &[u8]) -> Result<Envelope, ApiError> {
    let envelope: Envelope = serde_json::from_slice(body).map_err(ApiError::decode)?;
    if let Some(error) = &envelope.error {
        return Err(ApiError::remote(
            error.kind.clone().unwrap_or_else(|| "unknown".to_string()),
            error.message.clone().unwrap_or_default(),
        ));
    }
    if let Some(warning) = &envelope.warning {
        debug!(
            kind = warning.kind.as_deref().unwrap_or("unknown"),
            message = warning.message.as_deref().unwrap_or(""),
            "archive API warning"
        );
    }
    Ok(envelope)
}

/// Decodes a `get` response into one record.
pub(crate) fn decode_record(body: &[u8]) -> Result<Record, ApiError> {
    let envelope = parse_envelope(body)?;
    match envelope.content {
        Some(content) if !content.is_null() => {
            Record::deserialize(&content).map_err(ApiError::decode)
        }
        _ => Err(ApiError::MissingContent { action: "get" }),
    }
}

/// Decodes a `search` or `latestfiles` response into a record list.
///
/// A response without `content.file` is an empty result.
pub(crate) fn decode_record_list(body: &[u8]) -> Result<Vec<Record>, ApiError> {
    let envelope = parse_envelope(body)?;
    let files = envelope
        .content
        .as_ref()
        .and_then(|content| content.get("file"))
        .filter(|file| !file.is_null());
    match files {
        Some(files) => decode_one_or_many(files).map_err(ApiError::decode),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn file(id: u64, title: &str, rating: f32) -> Value {
        json!({ "id": id, "title": title, "rating": rating, "dir": "levels/doom/", "filename": format!("{id}.zip") })
    }

    #[test]
    fn test_single_object_decodes_as_one_element_list() {
        let object = file(1, "Solo", 4.0);
        let decoded: Vec<Record> = decode_one_or_many(&object).unwrap();
        let direct: Record = serde_json::from_value(object).unwrap();
        assert_eq!(decoded, vec![direct]);
    }

    #[test]
    fn test_array_decodes_like_direct_array_decode() {
        let array = json!([file(1, "One", 1.0), file(2, "Two", 2.0), file(3, "Three", 3.0)]);
        let decoded: Vec<Record> = decode_one_or_many(&array).unwrap();
        let direct: Vec<Record> = serde_json::from_value(array).unwrap();
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded, direct);
    }

    #[test]
    fn test_type_mismatch_in_both_shapes_propagates() {
        let result = decode_one_or_many::<Record>(&json!("a string"));
        let error = result.unwrap_err();
        assert_eq!(error.classify(), Category::Data);
    }

    #[test]
    fn test_record_list_from_envelope_with_array() {
        let body = json!({ "content": { "file": [file(1, "A", 1.0), file(2, "B", 2.0)] } });
        let records = decode_record_list(body.to_string().as_bytes()).unwrap();
        assert_eq!(records.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_record_list_from_envelope_with_single_object() {
        let body = json!({ "content": { "file": file(9, "Only", 5.0) } });
        let records = decode_record_list(body.to_string().as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Only");
    }

    #[test]
    fn test_record_list_without_content_is_empty() {
        let body = json!({ "warning": { "type": "No Results", "message": "No files returned." } });
        let records = decode_record_list(body.to_string().as_bytes()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_remote_error_object_becomes_remote_error() {
        let body = json!({ "error": { "type": "Invalid Action", "message": "bogus" } });
        let error = decode_record_list(body.to_string().as_bytes()).unwrap_err();
        assert!(matches!(error, ApiError::Remote { ref kind, .. } if kind == "Invalid Action"));
    }

    #[test]
    fn test_malformed_body_is_decode_error() {
        let error = decode_record_list(b"<html>not json</html>").unwrap_err();
        assert!(matches!(error, ApiError::Decode { .. }));
    }

    #[test]
    fn test_record_with_reviews_from_get_envelope() {
        let body = json!({
            "content": {
                "id": 5,
                "title": "Detail",
                "textfile": "Title: Detail\nAuthor: Someone",
                "reviews": { "review": [{ "text": "ok", "vote": 3, "username": "a" }] }
            }
        });
        let record = decode_record(body.to_string().as_bytes()).unwrap();
        assert_eq!(record.id, 5);
        assert!(record.has_detail());
        assert_eq!(record.reviews.len(), 1);
    }

    #[test]
    fn test_get_without_content_is_missing_content() {
        let body = json!({ "content": null });
        let error = decode_record(body.to_string().as_bytes()).unwrap_err();
        assert!(matches!(error, ApiError::MissingContent { action: "get" }));
    }
}
