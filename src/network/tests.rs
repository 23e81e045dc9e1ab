use futures::executor::block_on;
use proptest::prelude::*;
use serde_json::json;

use super::*;
use crate::models::{PushSubscriptionKeys, SuggestionCreate, SuggestionUpdate};
use crate::tests::support::{client, TEST_KEY};

#[test]
fn get_sends_json_content_type_and_no_body() {
    let (client, transport, identity) = client("/api");
    transport.respond(200, r#"{"ok":true}"#);

    let data = block_on(client.request("/health", RequestOptions::default())).unwrap();

    assert_eq!(data, Payload::Json(json!({ "ok": true })));
    let sent = transport.last_request();
    assert_eq!(sent.method, Method::Get);
    assert_eq!(sent.url, "/api/health");
    assert_eq!(sent.header("Content-Type"), Some("application/json"));
    assert_eq!(sent.header("X-Student-Key"), None);
    assert_eq!(sent.body, None);
    assert_eq!(identity.lookups.get(), 0);
}

#[test]
fn caller_headers_override_defaults() {
    let (client, transport, _) = client("/api");
    let options = RequestOptions::new(Method::Post)
        .header("content-type", "application/merge-patch+json")
        .header("X-Trace", "abc");

    block_on(client.request("/health", options)).unwrap();

    let sent = transport.last_request();
    assert_eq!(sent.headers.len(), 2);
    assert_eq!(sent.header("Content-Type"), Some("application/merge-patch+json"));
    assert_eq!(sent.header("x-trace"), Some("abc"));
}

#[test]
fn identity_header_replaces_caller_supplied_key() {
    let (client, transport, _) = client("/api");
    let options = RequestOptions::default().header("x-student-key", "spoofed");

    block_on(client.request("/me/suggestions", options)).unwrap();

    assert_eq!(transport.last_request().header("X-Student-Key"), Some(TEST_KEY));
}

#[test]
fn empty_success_body_is_empty_payload() {
    let (client, transport, _) = client("/api");
    transport.respond(204, "");

    let data = block_on(client.request("/push/unsubscribe", RequestOptions::new(Method::Delete))).unwrap();
    assert_eq!(data, Payload::Empty);
    assert_eq!(data.to_value(), serde_json::Value::Null);
}

#[test]
fn non_json_success_body_is_raw() {
    let (client, transport, _) = client("/api");
    transport.respond(200, "pong");

    let data = block_on(client.request("/health", RequestOptions::default())).unwrap();
    assert_eq!(data.to_value(), json!({ "raw": "pong" }));
}

#[test]
fn error_status_uses_detail() {
    let (client, transport, _) = client("/api");
    transport.respond(409, r#"{"detail":"Answered suggestions cannot be edited"}"#);

    let err = block_on(client.request("/me/suggestions/3", RequestOptions::new(Method::Patch))).unwrap_err();
    assert_eq!(err.status(), Some(409));
    assert_eq!(err.to_string(), "Answered suggestions cannot be edited");
    assert_eq!(
        err.data(),
        Some(&Payload::Json(json!({ "detail": "Answered suggestions cannot be edited" })))
    );
}

#[test]
fn error_status_without_message_is_synthesized() {
    let (client, transport, _) = client("/api");
    transport.respond(500, "Internal Server Error");

    let err = block_on(client.request("/health", RequestOptions::default())).unwrap_err();
    assert_eq!(err.to_string(), "HTTP 500");
    assert_eq!(err.data(), Some(&Payload::Raw("Internal Server Error".into())));
}

#[test]
fn transport_failure_is_network_error() {
    let (client, transport, _) = client("/api");
    transport.fail("Failed to fetch");

    let err = block_on(client.request("/health", RequestOptions::default())).unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
    assert_eq!(err.status(), None);
    assert_eq!(transport.requests.borrow().len(), 1);
}

#[test]
fn list_since_answered_at_builds_query() {
    let (client, transport, _) = client("http://localhost:8000/api");
    transport.respond(200, "[]");

    let since = chrono::DateTime::parse_from_rfc3339("2025-03-01T00:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    let list = block_on(client.list_my_suggestions(Some(since))).unwrap();

    assert!(list.is_empty());
    assert_eq!(
        transport.last_request().url,
        "http://localhost:8000/api/me/suggestions?since_answered_at=2025-03-01T00:00:00Z"
    );
}

#[test]
fn since_answered_at_keeps_sub_second_precision() {
    let (client, transport, _) = client("/api");
    transport.respond(200, "[]");

    let since = crate::models::parse_timestamp("2025-03-02T09:00:00.123456Z").unwrap();
    block_on(client.list_my_suggestions(Some(since))).unwrap();

    assert_eq!(
        transport.last_request().url,
        "/api/me/suggestions?since_answered_at=2025-03-02T09:00:00.123456Z"
    );
}

#[test]
fn list_accepts_offsetless_timestamps() {
    let (client, transport, _) = client("/api");
    transport.respond(
        200,
        r#"[{"id":4,"grade":2,"title":"급식","content":"메뉴 다양화","status":"answered",
             "answer":"반영","answered_at":"2025-03-02T09:00:00.123456",
             "created_at":"2025-03-01T08:30:00","updated_at":"2025-03-02T09:00:00.123456"}]"#,
    );

    let list = block_on(client.list_my_suggestions(None)).unwrap();

    assert_eq!(list.len(), 1);
    assert_eq!(list[0].answered_at, Some(crate::models::parse_timestamp("2025-03-02T09:00:00.123456Z").unwrap()));
}

#[test]
fn invalid_create_never_hits_the_network() {
    let (client, transport, _) = client("/api");

    let err = block_on(client.create_suggestion(&SuggestionCreate::new(9, "title", "content"))).unwrap_err();
    assert!(matches!(err, ApiError::Invalid(_)));
    assert!(transport.requests.borrow().is_empty());
}

#[test]
fn update_sends_patch_with_trimmed_fields() {
    let (client, transport, _) = client("/api");
    transport.respond(
        200,
        r#"{"id":3,"grade":1,"title":"new","content":"content","status":"pending",
            "created_at":"2025-03-01T08:30:00Z","updated_at":"2025-03-01T09:30:00Z"}"#,
    );

    let update = SuggestionUpdate { title: Some(" new ".into()), ..Default::default() };
    let updated = block_on(client.update_my_suggestion(3, &update)).unwrap();

    assert_eq!(updated.title, "new");
    let sent = transport.last_request();
    assert_eq!(sent.method, Method::Patch);
    assert_eq!(sent.url, "/api/me/suggestions/3");
    assert_eq!(sent.body.as_deref(), Some(r#"{"title":"new"}"#));
}

#[test]
fn subscribe_push_carries_identity() {
    let (client, transport, _) = client("/api");
    transport.respond(200, &format!(r#"{{"id":5,"student_key":"{}","endpoint":"https://push.example/abc"}}"#, TEST_KEY));

    let keys = PushSubscriptionKeys {
        endpoint: "https://push.example/abc".into(),
        p256dh: "BNc...".into(),
        auth: "tBH...".into(),
    };
    let record = block_on(client.subscribe_push(&keys)).unwrap();

    assert_eq!(record.id, 5);
    let sent = transport.last_request();
    assert_eq!(sent.url, "/api/push/subscribe");
    assert_eq!(sent.header("X-Student-Key"), Some(TEST_KEY));
}

#[test]
fn typed_decode_failure_is_decode_error() {
    let (client, transport, _) = client("/api");
    transport.respond(200, r#"{"unexpected":true}"#);

    let err = block_on(client.list_my_suggestions(None)).unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

proptest! {
    #[test]
    fn identity_header_only_on_allow_listed_prefixes(
        path in prop_oneof![
            "/suggestions(/[0-9]{1,3})?",
            "/me/[a-z]{1,12}",
            "/push(/[a-z]{1,12})?",
            "/(health|admin|me|meals|sugg)(/[a-z]{0,8})?",
        ]
    ) {
        let (client, _, _) = client("/api");
        let request = client.build_request(&path, RequestOptions::default());
        let expected = path.starts_with("/suggestions") || path.starts_with("/me/") || path.starts_with("/push");
        prop_assert_eq!(request.header("X-Student-Key").is_some(), expected);
        prop_assert_eq!(request.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn non_2xx_status_always_rejects(status in 300u16..600, detail in proptest::option::of("[a-zA-Z ]{1,20}")) {
        let (client, transport, _) = client("/api");
        let body = detail.as_ref().map(|d| json!({ "detail": d }).to_string()).unwrap_or_default();
        transport.respond(status, &body);

        let err = block_on(client.request("/health", RequestOptions::default())).unwrap_err();
        prop_assert_eq!(err.status(), Some(status));
        let expected = detail.unwrap_or_else(|| format!("HTTP {}", status));
        prop_assert_eq!(err.to_string(), expected);
    }
}
