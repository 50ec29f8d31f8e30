#![allow(dead_code)]

use oxide_endpoint::{Endpoint, EndpointMatch, QuerySpec};
use serde_json::Value;

pub fn endpoint(pattern: &str, query: &[(&str, &str)]) -> Endpoint {
    let spec = QuerySpec::from_tags(query.iter().copied())
        .unwrap_or_else(|e| panic!("Bad query spec {query:?}: {e}"));
    Endpoint::build(pattern, spec).unwrap_or_else(|e| panic!("Bad pattern {pattern}: {e}"))
}

pub fn matched(endpoint: &Endpoint, url: &str) -> EndpointMatch {
    endpoint
        .match_url(url)
        .unwrap_or_else(|| panic!("Expected {endpoint} to match {url}"))
}

/// Params and rest as one JSON object, for compact assertions.
pub fn as_json(m: &EndpointMatch) -> Value {
    let rest: serde_json::Map<String, Value> = m
        .rest
        .iter()
        .map(|(k, v)| (k.to_string(), v.map_or(Value::Null, |v| Value::String(v.to_string()))))
        .collect();
    serde_json::json!({ "params": m.params, "rest": rest })
}
