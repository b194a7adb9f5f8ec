//! Verify request builders against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector names an operation, its inputs and the expected request.
//! Bodies are compared as parsed JSON (not raw strings) so field ordering
//! never causes false negatives.

use intercom_core::{
    HttpMethod, HttpRequest, IntercomClient, NewEvent, NewImpression, NewThread, TagChange,
};
use serde_json::Value;

const BASE_URL: &str = "https://api.intercom.io/v1/";
const API_ROOT: &str = "https://api.intercom.io";

fn client() -> IntercomClient {
    IntercomClient::new("app", "key", false).unwrap()
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

/// Paths starting with `/` are relative to the unversioned API root.
fn expected_url(path: &str) -> String {
    if path.starts_with('/') {
        format!("{API_ROOT}{path}")
    } else {
        format!("{BASE_URL}{path}")
    }
}

fn str_arg<'a>(input: &'a Value, key: &str) -> &'a str {
    input[key].as_str().unwrap()
}

fn build(c: &IntercomClient, operation: &str, input: &Value) -> HttpRequest {
    match operation {
        "get_user" => c.build_get_user(str_arg(input, "id")),
        "delete_user" => c.build_delete_user(str_arg(input, "id")),
        "get_thread" => c.build_get_thread(str_arg(input, "id")),
        "get_all_users" => c.build_get_all_users(
            input["page"].as_u64().unwrap() as u32,
            input["per_page"].as_u64().unwrap() as u32,
        ),
        "create_user" => c.build_create_user(
            str_arg(input, "id"),
            input["properties"].as_object().unwrap(),
        ),
        "update_user" => c.build_update_user(
            str_arg(input, "id"),
            input["properties"].as_object().unwrap(),
        ),
        "create_thread" => {
            let thread: NewThread = serde_json::from_value(input.clone()).unwrap();
            c.build_create_thread(&thread)
        }
        "create_impression" => {
            let impression: NewImpression = serde_json::from_value(input.clone()).unwrap();
            c.build_create_impression(&impression)
        }
        "create_event" => {
            let event: NewEvent = serde_json::from_value(input.clone()).unwrap();
            c.build_create_event(&event)
        }
        "get_tag" => c.build_get_tag(str_arg(input, "name")),
        "create_tag" => {
            let change: TagChange = serde_json::from_value(input.clone()).unwrap();
            c.build_create_tag(&change)
        }
        "update_tag" => {
            let change: TagChange = serde_json::from_value(input.clone()).unwrap();
            c.build_update_tag(&change)
        }
        other => panic!("unknown operation: {other}"),
    }
    .unwrap()
}

fn run_vectors(raw: &str) {
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let operation = case["operation"].as_str().unwrap();
        let expected_req = &case["expected_request"];

        let req = build(&c, operation, &case["input"]);
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, expected_url(expected_req["path"].as_str().unwrap()), "{name}: url");

        match &expected_req["body"] {
            Value::Null => assert!(req.body.is_none(), "{name}: unexpected body"),
            expected => {
                let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
                assert_eq!(&body, expected, "{name}: body");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[test]
fn user_test_vectors() {
    run_vectors(include_str!("../../test-vectors/users.json"));
}

// ---------------------------------------------------------------------------
// Threads, impressions, events, tags
// ---------------------------------------------------------------------------

#[test]
fn messaging_test_vectors() {
    run_vectors(include_str!("../../test-vectors/messaging.json"));
}
