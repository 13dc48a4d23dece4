//! Redirect-verification flow against a mock backend.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::{build_flow, closed_port_url, MockBackend, Reply};
use jeewanjyoti_client::{
    ClientConfig, FlowKind, RedirectParams, StaticCredential, VerificationClient,
    VerificationClientConfig, VerificationOutcome, Verifier,
};
use serde_json::json;
use std::time::Duration;

const MAPPING_QUERY: &str = "?pidx=bZQLD9wRVWo4CdESSfuSsB&transaction_id=GFq9PFS7b2iYvL8Lir9oXe\
                             &amount=1000&status=Completed&purchase_order_id=MAP-17";

const PAYMENT_URL: &str =
    "https://app.jeewanjyoti.example/payment-success?pidx=HT6o6PEZRWFJ5ygavzHWd5\
     &purchase_order_id=INV-20251102-000046&status=Completed";

fn confirmation() -> serde_json::Value {
    json!({"message": "ok", "mapping_id": 7, "valid_till": "2025-01-01T00:00:00Z"})
}

/// Successful mapping verification exposes the payload exactly as sent.
#[tokio::test]
async fn test_mapping_success_payload_unchanged() {
    let backend = MockBackend::start(Reply::json(200, &confirmation())).await.unwrap();
    let flow = build_flow(FlowKind::Mapping, &backend.client_config(), MAPPING_QUERY, Some("tok-1"))
        .unwrap();

    flow.activate().unwrap();
    let outcome = flow.wait_terminal().await.expect("flow resolves");

    let expected = confirmation();
    assert_eq!(outcome.payload(), expected.as_object());
    assert_eq!(backend.hits(), 1);
}

/// The verification request carries the bearer token, JSON content type and
/// the mapping flow's field names.
#[tokio::test]
async fn test_mapping_request_shape() {
    let backend = MockBackend::start(Reply::json(200, &confirmation())).await.unwrap();
    let flow = build_flow(FlowKind::Mapping, &backend.client_config(), MAPPING_QUERY, Some("tok-1"))
        .unwrap();

    flow.activate().unwrap();
    flow.wait_terminal().await.unwrap();

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.path, "/api/user-mapping/verify/");
    assert_eq!(request.authorization.as_deref(), Some("Bearer tok-1"));
    assert!(request
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.starts_with("application/json")));
    assert_eq!(
        request.body,
        json!({"payment_ref": "MAP-17", "pidx": "bZQLD9wRVWo4CdESSfuSsB"})
    );
}

/// The payment flow posts `invoice_no` and `pidx` to its own endpoint.
#[tokio::test]
async fn test_payment_request_shape() {
    let backend = MockBackend::start(Reply::json(200, &json!({"status": "paid"}))).await.unwrap();
    let flow = build_flow(FlowKind::Payment, &backend.client_config(), PAYMENT_URL, Some("tok-2"))
        .unwrap();

    flow.activate().unwrap();
    let outcome = flow.wait_terminal().await.unwrap();
    assert!(outcome.payload().is_some());

    let request = &backend.requests()[0];
    assert_eq!(request.path, "/api/verify_payment/");
    assert_eq!(
        request.body,
        json!({"invoice_no": "INV-20251102-000046", "pidx": "HT6o6PEZRWFJ5ygavzHWd5"})
    );
    assert_eq!(flow.destination(), "/dashboard#appointments");
}

/// A 400 with a `detail` field surfaces that detail.
#[tokio::test]
async fn test_backend_detail_is_surfaced() {
    let backend = MockBackend::start(Reply::json(400, &json!({"detail": "already verified"})))
        .await
        .unwrap();
    let flow = build_flow(FlowKind::Mapping, &backend.client_config(), MAPPING_QUERY, Some("tok"))
        .unwrap();

    flow.activate().unwrap();
    let outcome = flow.wait_terminal().await.unwrap();

    assert_eq!(
        outcome,
        VerificationOutcome::Error {
            message: "already verified".to_string()
        }
    );
}

/// An `error` field wins over `detail`.
#[tokio::test]
async fn test_backend_error_field_is_preferred() {
    let backend = MockBackend::start(Reply::json(
        401,
        &json!({"error": "Token is invalid or expired", "detail": "ignored"}),
    ))
    .await
    .unwrap();
    let flow = build_flow(FlowKind::Payment, &backend.client_config(), PAYMENT_URL, Some("old"))
        .unwrap();

    flow.activate().unwrap();
    let outcome = flow.wait_terminal().await.unwrap();
    assert_eq!(outcome.error_message(), Some("Token is invalid or expired"));
}

/// A failure without a usable body falls back to the generic message.
#[tokio::test]
async fn test_unparseable_failure_body() {
    let backend = MockBackend::start(Reply::raw(502, "<html>Bad Gateway</html>")).await.unwrap();
    let flow = build_flow(FlowKind::Mapping, &backend.client_config(), MAPPING_QUERY, Some("tok"))
        .unwrap();

    flow.activate().unwrap();
    let outcome = flow.wait_terminal().await.unwrap();
    assert_eq!(outcome.error_message(), Some("Something went wrong"));
}

/// A success status whose body is not a JSON object is not a confirmation.
#[tokio::test]
async fn test_success_status_without_object_body() {
    let backend = MockBackend::start(Reply::json(200, &json!(["ok"]))).await.unwrap();
    let flow = build_flow(FlowKind::Mapping, &backend.client_config(), MAPPING_QUERY, Some("tok"))
        .unwrap();

    flow.activate().unwrap();
    let outcome = flow.wait_terminal().await.unwrap();
    assert_eq!(outcome.error_message(), Some("Something went wrong"));
}

/// Connection refused is reported as a network error.
#[tokio::test]
async fn test_connection_refused() {
    let config = ClientConfig {
        api_base_url: closed_port_url().unwrap(),
        request_timeout_secs: 5,
        ..ClientConfig::default()
    };
    let flow = build_flow(FlowKind::Mapping, &config, MAPPING_QUERY, Some("tok")).unwrap();

    flow.activate().unwrap();
    let outcome = flow.wait_terminal().await.unwrap();
    assert_eq!(outcome.error_message(), Some("Network error. Try again."));
}

/// A backend slower than the request timeout is reported as a network error.
#[tokio::test]
async fn test_request_timeout() {
    let backend = MockBackend::start(
        Reply::json(200, &confirmation()).delayed(Duration::from_secs(3)),
    )
    .await
    .unwrap();
    let client_config = ClientConfig {
        request_timeout_secs: 1,
        ..backend.client_config()
    };
    let flow = build_flow(FlowKind::Mapping, &client_config, MAPPING_QUERY, Some("tok")).unwrap();

    flow.activate().unwrap();
    let outcome = flow.wait_terminal().await.unwrap();
    assert_eq!(outcome.error_message(), Some("Network error. Try again."));
    assert_eq!(backend.hits(), 1);
}

/// Missing identifiers, a failed gateway status, or no stored token never
/// reach the backend.
#[tokio::test]
async fn test_preconditions_send_no_request() {
    let backend = MockBackend::start(Reply::json(200, &confirmation())).await.unwrap();
    let config = backend.client_config();

    let cases = [
        (
            "?pidx=abc&status=Completed",
            Some("tok"),
            "Missing payment information. Please contact support.",
        ),
        (
            "?purchase_order_id=MAP-1&status=Completed",
            Some("tok"),
            "Missing payment information. Please contact support.",
        ),
        (
            "?pidx=abc&purchase_order_id=MAP-1&status=User%20canceled",
            Some("tok"),
            "Payment was not completed.",
        ),
        (
            "?pidx=abc&purchase_order_id=MAP-1&status=Pending",
            Some("tok"),
            "Payment was not completed.",
        ),
        (
            MAPPING_QUERY,
            None,
            "Authentication required. Please login again.",
        ),
    ];

    for (query, token, expected) in cases {
        let flow = build_flow(FlowKind::Mapping, &config, query, token).unwrap();
        flow.activate().unwrap();
        let outcome = flow.wait_terminal().await.unwrap();
        assert_eq!(outcome.error_message(), Some(expected), "{query}");
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(backend.hits(), 0);
}

/// The verification client on its own refuses to run without a credential.
#[tokio::test]
async fn test_client_without_credential() {
    let backend = MockBackend::start(Reply::json(200, &confirmation())).await.unwrap();
    let config = backend.client_config();
    let client = VerificationClient::new(
        VerificationClientConfig::from_flow(&config, &config.mapping).unwrap(),
    )
    .unwrap();

    let params = RedirectParams {
        reference_id: "MAP-1".to_string(),
        transaction_id: "abc".to_string(),
        status_hint: None,
    };
    let outcome = VerificationOutcome::from(client.verify(&params, None).await);
    assert_eq!(outcome.error_message(), Some("Authentication required"));

    let credential = jeewanjyoti_client::CredentialProvider::access_token(&StaticCredential::new("t"));
    let outcome = VerificationOutcome::from(client.verify(&params, credential.as_ref()).await);
    assert!(outcome.payload().is_some());
    assert_eq!(backend.hits(), 1);
}

/// Re-activating and re-reading the state never sends a second request.
#[tokio::test]
async fn test_one_request_per_mount() {
    let backend = MockBackend::start(Reply::json(200, &confirmation())).await.unwrap();
    let flow = build_flow(FlowKind::Mapping, &backend.client_config(), MAPPING_QUERY, Some("tok"))
        .unwrap();

    flow.activate().unwrap();
    flow.activate().unwrap();
    for _ in 0..5 {
        let _ = flow.wait_terminal().await.unwrap();
        let _ = flow.state();
        flow.activate().unwrap();
    }
    flow.navigate_to_destination().unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(backend.hits(), 1);
}

/// A response that arrives after teardown leaves the flow untouched.
#[tokio::test]
async fn test_teardown_before_response() {
    let backend = MockBackend::start(
        Reply::json(200, &confirmation()).delayed(Duration::from_millis(300)),
    )
    .await
    .unwrap();
    let flow = build_flow(FlowKind::Mapping, &backend.client_config(), MAPPING_QUERY, Some("tok"))
        .unwrap();
    let state_rx = flow.subscribe();

    flow.activate().unwrap();
    assert!(backend.wait_for_hits(1).await);
    flow.teardown();

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(flow.state(), VerificationOutcome::Pending);
    assert_eq!(*state_rx.borrow(), VerificationOutcome::Pending);
    assert!(flow.wait_terminal().await.is_none());
    assert!(flow.navigate_to_destination().is_err());
}
