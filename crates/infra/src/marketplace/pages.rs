//! Page decoding for opaque vendor payloads
//!
//! The decoder only locates the records array and the pagination signal;
//! record fields are never interpreted. Bodies are either a bare array of
//! objects, a single object, or a wrapper whose records live under the
//! endpoint's configured JSON pointer.

use sellersync_domain::{EndpointSpec, MarketRecord};
use serde_json::Value;

use crate::http::error::FetchError;

/// One decoded page: records plus the explicit has-more flag when the
/// endpoint defines one.
#[derive(Debug, Clone)]
pub struct Page {
    pub records: Vec<MarketRecord>,
    pub has_more: Option<bool>,
}

impl Page {
    /// Decode a response body according to the endpoint's hints.
    pub fn decode(body: &[u8], spec: &EndpointSpec) -> Result<Self, FetchError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|err| FetchError::Decode(format!("invalid JSON body: {err}")))?;

        let node = match &spec.records_path {
            Some(pointer) => value.pointer(pointer).ok_or_else(|| {
                FetchError::Decode(format!(
                    "records path '{pointer}' not found in response for '{}'",
                    spec.name
                ))
            })?,
            None => &value,
        };

        let records = records_from(node)?;
        let has_more = spec
            .has_more_path
            .as_ref()
            .and_then(|pointer| value.pointer(pointer))
            .and_then(Value::as_bool);

        Ok(Self { records, has_more })
    }
}

/// An array of objects becomes the record list; a single object becomes a
/// one-record list. Anything else is a decode failure.
fn records_from(node: &Value) -> Result<Vec<MarketRecord>, FetchError> {
    match node {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map.clone()),
                other => Err(FetchError::Decode(format!(
                    "expected record object, got {}",
                    type_name(other)
                ))),
            })
            .collect(),
        Value::Object(map) => Ok(vec![map.clone()]),
        other => Err(FetchError::Decode(format!(
            "unexpected JSON structure: {}",
            type_name(other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use sellersync_domain::{ApiMethod, Pagination};

    use super::*;

    fn spec(records_path: Option<&str>, has_more_path: Option<&str>) -> EndpointSpec {
        EndpointSpec {
            name: "test".to_string(),
            method: ApiMethod::Get,
            url: "https://api.test/test".to_string(),
            records_path: records_path.map(String::from),
            has_more_path: has_more_path.map(String::from),
            pagination: Pagination::None,
        }
    }

    #[test]
    fn decodes_a_bare_array_of_objects() {
        let page = Page::decode(br#"[{"id":1},{"id":2}]"#, &spec(None, None)).unwrap();
        assert_eq!(page.records.len(), 2);
        assert!(page.has_more.is_none());
    }

    #[test]
    fn a_single_object_becomes_one_record() {
        let page = Page::decode(br#"{"id":1}"#, &spec(None, None)).unwrap();
        assert_eq!(page.records.len(), 1);
    }

    #[test]
    fn records_are_located_through_the_pointer() {
        let body = br#"{"data":{"listGoods":[{"nmId":10},{"nmId":11}]}}"#;
        let page = Page::decode(body, &spec(Some("/data/listGoods"), None)).unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0]["nmId"], 10);
    }

    #[test]
    fn the_has_more_flag_is_read_when_configured() {
        let body = br#"{"data":{"cards":[{"nmId":1}],"isNextPage":true}}"#;
        let page =
            Page::decode(body, &spec(Some("/data/cards"), Some("/data/isNextPage"))).unwrap();
        assert_eq!(page.has_more, Some(true));

        let body = br#"{"data":{"cards":[],"isNextPage":false}}"#;
        let page =
            Page::decode(body, &spec(Some("/data/cards"), Some("/data/isNextPage"))).unwrap();
        assert_eq!(page.has_more, Some(false));
        assert!(page.records.is_empty());
    }

    #[test]
    fn missing_records_path_is_a_decode_error() {
        let err = Page::decode(br#"{"other":[]}"#, &spec(Some("/data/cards"), None)).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn non_object_items_are_a_decode_error() {
        let err = Page::decode(br#"[1,2,3]"#, &spec(None, None)).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = Page::decode(b"not json at all", &spec(None, None)).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
