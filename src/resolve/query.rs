//! Query-include reference parsing.
//!
//! A dynamic include references `queryId?query-string-params`; the
//! query string decodes into the parameter mapping handed to the query
//! runner. A parameter repeated more than once yields an array value,
//! otherwise a scalar string.

use serde_json::map::Entry;
use serde_json::{Map, Value};
use std::borrow::Cow;

/// A parsed dynamic-include reference.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRef {
    pub query_id: String,
    pub params: Map<String, Value>,
}

/// Parse a `queryId?query-string` reference.
///
/// A reference without `?` carries an empty parameter mapping. An
/// empty query id yields `None`.
pub fn parse_query_ref(raw: &str) -> Option<QueryRef> {
    let (query_id, query_string) = match raw.split_once('?') {
        Some((id, qs)) => (id, qs),
        None => (raw, ""),
    };
    if query_id.is_empty() {
        return None;
    }
    Some(QueryRef {
        query_id: query_id.to_owned(),
        params: decode_params(query_string),
    })
}

/// Decode a query string into a parameter mapping.
///
/// `tag=foo&tag=bar&limit=5` ⇒ `{tag: ["foo","bar"], limit: "5"}`.
/// A parameter without `=` decodes to an empty string value.
pub fn decode_params(query_string: &str) -> Map<String, Value> {
    let mut params = Map::new();

    for pair in query_string.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = match pair.split_once('=') {
            Some((key, value)) => (key, value),
            None => (pair, ""),
        };
        let key = decode_component(key).into_owned();
        let value = Value::String(decode_component(value).into_owned());

        match params.entry(key) {
            Entry::Occupied(mut entry) => match entry.get_mut() {
                Value::Array(values) => values.push(value),
                scalar => {
                    let first = scalar.take();
                    *scalar = Value::Array(vec![first, value]);
                }
            },
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
        }
    }
    params
}

/// Percent-decode one query-string component, with `+` as space.
fn decode_component(component: &str) -> Cow<'_, str> {
    if component.contains('+') {
        let spaced = component.replace('+', " ");
        match urlencoding::decode(&spaced) {
            Ok(decoded) => Cow::Owned(decoded.into_owned()),
            Err(_) => Cow::Owned(spaced),
        }
    } else {
        match urlencoding::decode(component) {
            Ok(decoded) => decoded,
            Err(_) => Cow::Borrowed(component),
        }
    }
}
