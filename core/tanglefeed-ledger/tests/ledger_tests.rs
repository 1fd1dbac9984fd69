use tanglefeed_ledger::{LedgerClient, LedgerConfig, LedgerError, TryteString};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(node: String) -> LedgerConfig {
    LedgerConfig {
        node,
        depth: 3,
        min_weight_magnitude: 14,
    }
}

fn sample_trytes() -> Vec<TryteString> {
    vec![TryteString::new("ABC9DEF").unwrap()]
}

// ── Construction ────────────────────────────────────────────────

#[test]
fn new_rejects_empty_node_url() {
    let err = LedgerClient::new(config(String::new())).unwrap_err();
    assert!(matches!(err, LedgerError::Config(_)));
}

#[test]
fn client_reports_its_node_url() {
    let client = LedgerClient::new(config("http://localhost:14265/".to_string())).unwrap();
    assert_eq!(client.node(), "http://localhost:14265/");
}

// ── send_trytes happy path ──────────────────────────────────────

#[tokio::test]
async fn send_trytes_runs_the_full_command_sequence() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("X-IOTA-API-Version", "1"))
        .and(body_partial_json(serde_json::json!({
            "command": "getTransactionsToApprove",
            "depth": 3,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "trunkTransaction": "TRUNK9",
            "branchTransaction": "BRANCH9",
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "command": "attachToTangle",
            "trunkTransaction": "TRUNK9",
            "branchTransaction": "BRANCH9",
            "minWeightMagnitude": 14,
            "trytes": ["ABC9DEF"],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "trytes": ["ABC9DEFPOW"],
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "command": "broadcastTransactions",
            "trytes": ["ABC9DEFPOW"],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "command": "storeTransactions",
            "trytes": ["ABC9DEFPOW"],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = LedgerClient::new(config(server.uri())).unwrap();
    let attached = client.send_trytes(&sample_trytes()).await.unwrap();
    assert_eq!(attached, vec![TryteString::new("ABC9DEFPOW").unwrap()]);
}

// ── Node failures ───────────────────────────────────────────────

#[tokio::test]
async fn node_http_error_body_is_attached_to_the_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "Invalid depth input",
        })))
        .mount(&server)
        .await;

    let client = LedgerClient::new(config(server.uri())).unwrap();
    let err = client.send_trytes(&sample_trytes()).await.unwrap_err();
    match err {
        LedgerError::Api { command, detail } => {
            assert_eq!(command, "getTransactionsToApprove");
            assert_eq!(detail, "Invalid depth input");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn error_field_in_200_reply_is_still_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "exception": "attachToTangle is disabled on this node",
        })))
        .mount(&server)
        .await;

    let client = LedgerClient::new(config(server.uri())).unwrap();
    let err = client.send_trytes(&sample_trytes()).await.unwrap_err();
    assert!(matches!(err, LedgerError::Api { .. }));
}

#[tokio::test]
async fn send_trytes_rejects_an_empty_batch_without_calling_the_node() {
    let server = MockServer::start().await;
    // No mounted mocks: any request would 404 and fail differently.
    let client = LedgerClient::new(config(server.uri())).unwrap();
    let err = client.send_trytes(&[]).await.unwrap_err();
    match err {
        LedgerError::Api { command, .. } => assert_eq!(command, "attachToTangle"),
        other => panic!("expected Api error, got {other:?}"),
    }
}
