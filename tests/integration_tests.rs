//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: config → check/discover/read → messages

use serde_json::json;
use std::time::Duration;
use tap_klaviyo::messages::Message;
use tap_klaviyo::{Error, KlaviyoTap, TapConfig};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_tap(server_uri: &str, list_ids: Vec<&str>) -> KlaviyoTap {
    let config = TapConfig::new(
        "pk_test",
        list_ids.into_iter().map(String::from).collect(),
    )
    .with_api_url(server_uri)
    .with_min_request_interval(Duration::ZERO);
    KlaviyoTap::new(config).unwrap()
}

fn record_ids(messages: &[Message], stream_name: &str) -> Vec<String> {
    messages
        .iter()
        .filter_map(|m| match m {
            Message::Record { stream, record, .. } if stream == stream_name => record
                .get("id")
                .and_then(|v| v.as_str())
                .map(String::from),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Check and discover
// ============================================================================

#[tokio::test]
async fn test_check_succeeds_against_live_endpoint() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lists"))
        .and(query_param("api_key", "pk_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let tap = test_tap(&mock_server.uri(), vec![]);
    let result = tap.check().await.unwrap();
    assert!(result.success);
}

#[tokio::test]
async fn test_check_reports_invalid_credentials() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lists"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&mock_server)
        .await;

    let tap = test_tap(&mock_server.uri(), vec![]);
    let result = tap.check().await.unwrap();
    assert!(!result.success);
    assert!(result.message.unwrap().contains("403"));
}

#[tokio::test]
async fn test_discover_returns_both_streams() {
    let tap = test_tap("http://localhost:1", vec![]);
    let catalog = tap.discover().unwrap();

    let names: Vec<&str> = catalog.streams.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["lists", "list_members"]);
    assert_eq!(catalog.get_stream("lists").unwrap().primary_key, vec!["list_id"]);
    assert_eq!(catalog.get_stream("list_members").unwrap().primary_key, vec!["id"]);
}

// ============================================================================
// Read: full sync
// ============================================================================

#[tokio::test]
async fn test_read_walks_all_member_pages_in_order() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"list_id": "L1", "list_name": "Newsletter"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Marker-specific mocks first so the bare mock only catches the
    // initial request without a marker.
    Mock::given(method("GET"))
        .and(path("/group/L1/members/all"))
        .and(query_param("marker", "m1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{"id": "p3"}, {"id": "p4"}],
            "marker": "m2"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/group/L1/members/all"))
        .and(query_param("marker", "m2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{"id": "p5"}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/group/L1/members/all"))
        .and(query_param("api_key", "pk_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{"id": "p1"}, {"id": "p2"}],
            "marker": "m1"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut tap = test_tap(&mock_server.uri(), vec!["L1"]);
    let messages = tap.read().await.unwrap();

    // 2 pages of 2 plus 1 page of 1, concatenated in fetch order
    assert_eq!(
        record_ids(&messages, "list_members"),
        vec!["p1", "p2", "p3", "p4", "p5"]
    );

    // Every member record carries the parent list id
    for message in &messages {
        if let Message::Record { stream, record, .. } = message {
            if stream == "list_members" {
                assert_eq!(record["list_id"], "L1");
            }
        }
    }

    let stats = tap.stats();
    assert_eq!(stats.records_synced, 6); // 1 list record + 5 members
    assert_eq!(stats.pages_fetched, 3);
    assert_eq!(stats.lists_synced, 1);

    mock_server.verify().await;
}

#[tokio::test]
async fn test_read_emits_schemas_before_records() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"list_id": "L1", "list_name": "Newsletter"}
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/group/L1/members/all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{"id": "p1"}]
        })))
        .mount(&mock_server)
        .await;

    let mut tap = test_tap(&mock_server.uri(), vec!["L1"]);
    let messages = tap.read().await.unwrap();

    let schema_count = messages.iter().filter(|m| m.is_schema()).count();
    assert_eq!(schema_count, 2);

    let first_record = messages.iter().position(Message::is_record).unwrap();
    let last_schema = messages
        .iter()
        .rposition(|m| m.is_schema())
        .unwrap();
    assert!(last_schema < first_record);
}

#[tokio::test]
async fn test_read_with_no_configured_lists_makes_no_requests() {
    // Expect zero requests: server with no mocks panics the test on any hit
    let mock_server = MockServer::start().await;

    let mut tap = test_tap(&mock_server.uri(), vec![]);
    let messages = tap.read().await.unwrap();

    assert_eq!(messages.iter().filter(|m| m.is_record()).count(), 0);
    assert_eq!(messages.iter().filter(|m| m.is_schema()).count(), 2);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 0);
}

#[tokio::test]
async fn test_read_aborts_on_repeated_marker() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"list_id": "L1"}
        ])))
        .mount(&mock_server)
        .await;

    // The second page echoes the marker it was requested with; the sync
    // must stop there instead of issuing a third request.
    Mock::given(method("GET"))
        .and(path("/group/L1/members/all"))
        .and(query_param("marker", "stuck"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{"id": "p2"}],
            "marker": "stuck"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/group/L1/members/all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{"id": "p1"}],
            "marker": "stuck"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut tap = test_tap(&mock_server.uri(), vec!["L1"]);
    let err = tap.read().await.unwrap_err();
    assert!(matches!(err, Error::PaginationLoop { .. }));
    assert!(err.to_string().contains("stuck"));

    mock_server.verify().await;
}

#[tokio::test]
async fn test_read_retries_on_rate_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"list_id": "L1"}
        ])))
        .mount(&mock_server)
        .await;

    // First member request is throttled; the retried request succeeds
    Mock::given(method("GET"))
        .and(path("/group/L1/members/all"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/group/L1/members/all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{"id": "p1"}]
        })))
        .mount(&mock_server)
        .await;

    let mut tap = test_tap(&mock_server.uri(), vec!["L1"]);
    let messages = tap.read().await.unwrap();

    assert_eq!(record_ids(&messages, "list_members"), vec!["p1"]);
}

#[tokio::test]
async fn test_read_syncs_lists_sequentially() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"list_id": "L1", "list_name": "First"},
            {"list_id": "L2", "list_name": "Second"}
        ])))
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/group/L1/members/all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{"id": "a1"}, {"id": "a2"}]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/group/L2/members/all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{"id": "b1"}]
        })))
        .mount(&mock_server)
        .await;

    let mut tap = test_tap(&mock_server.uri(), vec!["L1", "L2"]);
    let messages = tap.read().await.unwrap();

    // All of L1's members are emitted before L2's list record
    let streams: Vec<&str> = messages
        .iter()
        .filter_map(|m| match m {
            Message::Record { stream, .. } => Some(stream.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(
        streams,
        vec![
            "lists",
            "list_members",
            "list_members",
            "lists",
            "list_members"
        ]
    );
    assert_eq!(record_ids(&messages, "list_members"), vec!["a1", "a2", "b1"]);
    assert_eq!(tap.stats().lists_synced, 2);

    mock_server.verify().await;
}

#[tokio::test]
async fn test_record_messages_serialize_with_type_tag() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"list_id": "L1"}
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/group/L1/members/all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{"id": "p1", "email": "a@example.com"}]
        })))
        .mount(&mock_server)
        .await;

    let mut tap = test_tap(&mock_server.uri(), vec!["L1"]);
    let messages = tap.read().await.unwrap();

    let record = messages
        .iter()
        .find(|m| matches!(m, Message::Record { stream, .. } if stream == "list_members"))
        .unwrap();
    let line: serde_json::Value =
        serde_json::from_str(&serde_json::to_string(record).unwrap()).unwrap();

    assert_eq!(line["type"], "RECORD");
    assert_eq!(line["stream"], "list_members");
    assert_eq!(line["record"]["id"], "p1");
    assert_eq!(line["record"]["list_id"], "L1");
    assert!(line["emitted_at"].is_string());
}
