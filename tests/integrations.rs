use secrecy::SecretString;
use serde_json::json;
use storefront_api::{
    error::AppError,
    integrations::{
        courier::{CourierClient, CourierError},
        gemini::{Content, ContentRole, GeminiClient, GeminiError},
    },
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path, query_param},
};

fn courier(server: &MockServer) -> CourierClient {
    CourierClient::with_base_url(SecretString::from("courier-token"), &server.uri(), 5).unwrap()
}

fn gemini(server: &MockServer) -> GeminiClient {
    GeminiClient::with_base_url(SecretString::from("gemini-key"), "test-model", &server.uri(), 5)
        .unwrap()
}

#[tokio::test]
async fn courier_track_parses_shipment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/packages/json/"))
        .and(query_param("waybill", "AWB123"))
        .and(header("authorization", "Token courier-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ShipmentData": [{
                "Shipment": {
                    "AWB": "AWB123",
                    "Status": {
                        "Status": "In Transit",
                        "StatusDateTime": "2026-01-02T10:00:00",
                        "StatusLocation": "Pune_Hub",
                        "Instructions": "Shipment forwarded"
                    },
                    "Scans": [
                        { "ScanDetail": { "Scan": "Manifested", "ScanDateTime": "2026-01-01T09:00:00", "ScannedLocation": "Mumbai" } },
                        { "ScanDetail": { "Scan": "In Transit", "ScanDateTime": "2026-01-02T10:00:00", "ScannedLocation": "Pune_Hub" } }
                    ]
                }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let shipment = courier(&server).track("AWB123").await.unwrap();
    assert_eq!(shipment.waybill, "AWB123");
    assert_eq!(shipment.status.status, "In Transit");
    assert_eq!(shipment.status.status_location.as_deref(), Some("Pune_Hub"));
    assert_eq!(shipment.scans.len(), 2);
    assert_eq!(shipment.scans[0].scan, "Manifested");
}

#[tokio::test]
async fn courier_without_shipment_data_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/packages/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ShipmentData": [] })))
        .mount(&server)
        .await;

    let err = courier(&server).track("MISSING").await.unwrap_err();
    assert!(matches!(err, CourierError::NotFound(ref w) if w == "MISSING"));
    assert!(matches!(AppError::from(err), AppError::NotFound));
}

#[tokio::test]
async fn courier_server_error_maps_to_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = courier(&server).track("AWB1").await.unwrap_err();
    match &err {
        CourierError::Status { status, body } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(matches!(AppError::from(err), AppError::Upstream(_)));
}

#[tokio::test]
async fn gemini_joins_candidate_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/test-model:generateContent"))
        .and(header("x-goog-api-key", "gemini-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Hello " }, { "text": "there!" }] }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let contents = vec![Content::text(ContentRole::User, "hi")];
    let reply = gemini(&server).generate("be brief", &contents).await.unwrap();
    assert_eq!(reply, "Hello there!");
}

#[tokio::test]
async fn gemini_api_error_carries_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT" }
        })))
        .mount(&server)
        .await;

    let contents = vec![Content::text(ContentRole::User, "hi")];
    let err = gemini(&server).generate("sys", &contents).await.unwrap_err();
    match err {
        GeminiError::Api { status, message } => {
            assert_eq!(status.as_u16(), 400);
            assert_eq!(message, "API key not valid");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn gemini_empty_candidates_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let err = gemini(&server).generate("sys", &[]).await.unwrap_err();
    assert!(matches!(err, GeminiError::EmptyResponse));
}
