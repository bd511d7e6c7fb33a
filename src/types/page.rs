//! Pagination wrapper for collection bodies.

use super::value::CallValue;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use url::Url;

/// A collection body (`{"data": [...], "paging": {...}}`) with its cursors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphPage {
    pub data: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paging: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Value>,
}

impl GraphPage {
    /// Wraps `body` as a page when it carries a `data` array, otherwise
    /// returns it unchanged as [`CallValue::Body`].
    pub fn evaluate(body: Value) -> CallValue {
        match body {
            Value::Object(mut map) if map.get("data").map(Value::is_array).unwrap_or(false) => {
                let data = match map.remove("data") {
                    Some(Value::Array(items)) => items,
                    _ => Vec::new(),
                };
                CallValue::Page(GraphPage {
                    data,
                    paging: map.remove("paging"),
                    summary: map.remove("summary"),
                })
            }
            other => CallValue::Body(other),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Path and query parameters for the next page, if any.
    pub fn next_page_params(&self) -> Option<(String, BTreeMap<String, String>)> {
        self.cursor_params("next")
    }

    pub fn previous_page_params(&self) -> Option<(String, BTreeMap<String, String>)> {
        self.cursor_params("previous")
    }

    fn cursor_params(&self, which: &str) -> Option<(String, BTreeMap<String, String>)> {
        let raw = self.paging.as_ref()?.get(which)?.as_str()?;
        let url = Url::parse(raw).ok()?;
        let params = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Some((url.path().trim_start_matches('/').to_string(), params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_evaluate_wraps_collections() {
        let value = GraphPage::evaluate(json!({
            "data": [{"id": "1"}],
            "paging": {"cursors": {"after": "A"}},
            "summary": {"total_count": 10}
        }));
        let page = value.as_page().unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page.summary, Some(json!({"total_count": 10})));
    }

    #[test]
    fn test_evaluate_passes_through_other_bodies() {
        assert_eq!(GraphPage::evaluate(json!(true)), CallValue::Body(json!(true)));
        assert_eq!(
            GraphPage::evaluate(json!({"id": "4", "data": "not-a-list"})),
            CallValue::Body(json!({"id": "4", "data": "not-a-list"}))
        );
        assert_eq!(GraphPage::evaluate(Value::Null), CallValue::Body(Value::Null));
    }

    #[test]
    fn test_next_page_params() {
        let value = GraphPage::evaluate(json!({
            "data": [],
            "paging": {
                "next": "https://graph.example.com/v19.0/me/friends?limit=25&after=QVFI",
            }
        }));
        let page = value.as_page().unwrap();
        let (path, params) = page.next_page_params().unwrap();
        assert_eq!(path, "v19.0/me/friends");
        assert_eq!(params.get("after").map(String::as_str), Some("QVFI"));
        assert_eq!(params.get("limit").map(String::as_str), Some("25"));
        assert!(page.previous_page_params().is_none());
    }
}
