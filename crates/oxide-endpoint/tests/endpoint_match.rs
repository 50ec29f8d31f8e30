//! Tests for endpoint matching and URL building.

mod common;
use common::*;

use oxide_endpoint::{Endpoint, ParamType, QuerySpec};
use serde_json::json;

#[test]
fn empty_params_when_none_declared() {
    let e = endpoint("/foo/bar", &[]);
    assert_eq!(as_json(&matched(&e, "/foo/bar")), json!({"params": {}, "rest": {}}));
}

#[test]
fn literal_only_round_trip() {
    for pattern in ["/", "/foo", "/foo/bar/baz"] {
        let e = endpoint(pattern, &[]);
        let url = e.to_url(&json!({}), None).unwrap();
        assert_eq!(as_json(&matched(&e, &url)), json!({"params": {}, "rest": {}}));
    }
}

#[test]
fn unmatched_query_in_rest() {
    let e = endpoint("/foo/bar", &[("blah", "string")]);
    assert_eq!(
        as_json(&matched(&e, "/foo/bar?blah=one&zoo=two")),
        json!({"params": {"blah": "one"}, "rest": {"zoo": "two"}})
    );
}

#[test]
fn no_match_when_number_fails() {
    let e = endpoint("/foo/bar", &[("blah", "string"), ("zoo", "number")]);
    assert!(e.match_url("/foo/bar?blah=one&zoo=two").is_none());
}

#[test]
fn parses_numbers() {
    let e = endpoint("/foo/bar", &[("blah", "string"), ("zoo", "number")]);
    assert_eq!(
        as_json(&matched(&e, "/foo/bar?blah=one&zoo=3")),
        json!({"params": {"blah": "one", "zoo": 3}, "rest": {}})
    );
}

#[test]
fn required_query_absent() {
    let e = endpoint("/foo/bar", &[("blah", "string")]);
    assert!(e.match_url("/foo/bar").is_none());
    assert!(e.match_url("/foo/bar?other=1").is_none());
}

#[test]
fn parses_optional_types() {
    let e = endpoint("/foo/bar", &[("blah", "string?"), ("zoo", "number?")]);
    assert_eq!(
        as_json(&matched(&e, "/foo/bar?blah=one&zoo=4")),
        json!({"params": {"blah": "one", "zoo": 4}, "rest": {}})
    );
    assert_eq!(
        as_json(&matched(&e, "/foo/bar")),
        json!({"params": {}, "rest": {}})
    );
}

#[test]
fn parses_encoded_params() {
    let e = endpoint("/foo/bar/:id", &[("blah", "string")]);
    assert_eq!(
        as_json(&matched(&e, "/foo/bar/A%20B?blah=C%20D")),
        json!({"params": {"blah": "C D", "id": "A B"}, "rest": {}})
    );
}

#[test]
fn parses_path_parameters() {
    let e = endpoint("/foo/:value/bar", &[("blah", "string?")]);
    assert_eq!(
        as_json(&matched(&e, "/foo/3/bar?blah=one&zoo=4")),
        json!({"params": {"blah": "one", "value": "3"}, "rest": {"zoo": "4"}})
    );
}

#[test]
fn parses_path_with_host() {
    let e = endpoint("/foo/:value/bar", &[("blah", "string?")]);
    assert_eq!(
        as_json(&matched(&e, "https://www.example.com/foo/3/bar?blah=one&zoo=4")),
        json!({"params": {"blah": "one", "value": "3"}, "rest": {"zoo": "4"}})
    );
}

#[test]
fn parses_number_path_parameters() {
    let e = endpoint("/foo/:value|i/bar/:another", &[("blah", "string?")]);
    assert_eq!(
        as_json(&matched(&e, "/foo/3/bar/5?blah=one&zoo=4")),
        json!({"params": {"blah": "one", "value": 3, "another": "5"}, "rest": {"zoo": "4"}})
    );
    assert!(e.match_url("/foo/three/bar/5").is_none());
}

#[test]
fn rest_keeps_raw_strings() {
    let e = endpoint("/posts/:id|i/comments", &[("page", "number")]);
    let m = matched(&e, "/posts/1/comments?page=1&filterIds=%5B1%2C2%2C3%5D&flag");
    assert_eq!(m.params.get_i64("page"), Some(1));
    assert!(!m.params.contains_key("filterIds"));
    assert_eq!(m.rest.get("filterIds"), Some("[1,2,3]"));
    assert_eq!(m.rest.entry("flag"), Some(None));
}

#[test]
fn builds_url() {
    let e = endpoint("/foo/:value|i/bar/:another", &[("blah", "string?")]);
    assert_eq!(
        e.to_url(&json!({"value": 5, "another": "hmm", "blah": null}), None)
            .unwrap(),
        "/foo/5/bar/hmm"
    );
}

#[test]
fn builds_url_with_querystring_params() {
    let e = endpoint("/foo/:value|i/bar/:another", &[("blah", "string?")]);
    assert_eq!(
        e.to_url(&json!({"value": 5, "another": "hmm", "blah": "too"}), None)
            .unwrap(),
        "/foo/5/bar/hmm?blah=too"
    );
}

#[test]
fn builds_url_from_struct() {
    #[derive(serde::Serialize)]
    struct Args {
        id: u32,
        page: Option<u32>,
    }

    let e = endpoint("/posts/:id|i/comments", &[("page", "number?")]);
    assert_eq!(
        e.to_url(&Args { id: 3, page: None }, None).unwrap(),
        "/posts/3/comments"
    );
    assert_eq!(
        e.to_url(&Args { id: 3, page: Some(2) }, None).unwrap(),
        "/posts/3/comments?page=2"
    );
}

#[test]
fn incrementally_builds_url() {
    let e = Endpoint::new()
        .p("foo")
        .unwrap()
        .p((":value", ParamType::Number))
        .unwrap()
        .p("bar")
        .unwrap()
        .p(QuerySpec::new().with("blah", ParamType::OptionalString))
        .unwrap();
    assert_eq!(
        e.to_url(&json!({"value": 5, "blah": "yay"}), None).unwrap(),
        "/foo/5/bar?blah=yay"
    );
}

#[test]
fn incremental_equals_parsed() {
    let built = endpoint("/foo/:value|i/bar", &[("blah", "string?")]);
    let incremental = Endpoint::new()
        .p("foo")
        .unwrap()
        .p(("value", ParamType::Number))
        .unwrap()
        .p("bar")
        .unwrap()
        .p(QuerySpec::new().with("blah", ParamType::OptionalString))
        .unwrap();
    assert_eq!(built, incremental);
}

#[test]
fn match_then_build_round_trip() {
    let e = endpoint("/users/:name/posts/:id|i", &[("tag", "string?"), ("limit", "number?")]);
    let url = "/users/Jane%20Doe/posts/12?limit=5&tag=a+b";
    let m = matched(&e, url);
    let rebuilt = e.to_url(&m.params, None).unwrap();
    assert_eq!(matched(&e, &rebuilt), m);
}

#[test]
fn typed_params() {
    #[derive(serde::Deserialize, Debug, PartialEq)]
    struct Args {
        value: i64,
        another: String,
        blah: Option<String>,
    }

    let e = endpoint("/foo/:value|i/bar/:another", &[("blah", "string?")]);
    let args: Args = matched(&e, "/foo/3/bar/5").params.deserialize().unwrap();
    assert_eq!(
        args,
        Args {
            value: 3,
            another: "5".to_string(),
            blah: None
        }
    );
}
