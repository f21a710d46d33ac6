use rust_decimal_macros::dec;
use serde_json::json;
use std::time::Duration;
use tessera_core::{CancellationToken, GatewayError, ProviderGateway};
use tessera_infra::app_config::ProviderConfig;
use tessera_infra::HttpProviderGateway;
use tessera_shared::{Masked, OrderedLicenseResult, SubmitResultRequest};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway_for(server: &MockServer, api_key: Option<&str>) -> HttpProviderGateway {
    HttpProviderGateway::new(&ProviderConfig {
        base_url: format!("{}/api", server.uri()),
        api_key: api_key.map(Masked::from),
        request_timeout_ms: 500,
    })
    .unwrap()
}

#[tokio::test]
async fn test_list_companies_sends_country_and_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/companies"))
        .and(query_param("country", "Latvia"))
        .and(header("X-Api-Key", "secret-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"companyId": "c-1", "companyName": "Rimi"},
            {"companyId": "c-2", "companyName": "LIDO"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server, Some("secret-key"));
    let companies = gateway
        .list_companies("Latvia", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(companies.len(), 2);
    assert_eq!(companies[1].company_id, "c-2");
    assert_eq!(companies[1].company_name, "LIDO");
}

#[tokio::test]
async fn test_list_companies_fails_on_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/companies"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = gateway_for(&server, None)
        .list_companies("Latvia", &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        GatewayError::Status { status: 503, body: "maintenance".to_string() }
    );
}

#[tokio::test]
async fn test_list_companies_fails_on_malformed_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/companies"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"unexpected": true}"#))
        .mount(&server)
        .await;

    let err = gateway_for(&server, None)
        .list_companies("Latvia", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Decode { operation: "list_companies", .. }));
}

#[tokio::test]
async fn test_company_details_are_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/companies/c-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "company": "LIDO",
            "login": "lido-admin",
            "contact": {"name": "Jane", "surname": "Doe"},
            "licenses": [
                {"sku": "TPLV7893-85", "count": 20},
                {"sku": "TPLV7884-85", "count": 5}
            ]
        })))
        .mount(&server)
        .await;

    let details = gateway_for(&server, None)
        .get_company_details("c-2", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(details.company, "LIDO");
    assert_eq!(details.login.expose(), "lido-admin");
    assert_eq!(details.contact.unwrap().surname, "Doe");
    assert_eq!(details.licenses.len(), 2);
}

#[tokio::test]
async fn test_empty_details_body_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/companies/c-2"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let err = gateway_for(&server, None)
        .get_company_details("c-2", &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err, GatewayError::EmptyBody { operation: "get_company_details" });
}

#[tokio::test]
async fn test_price_is_exact_decimal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/prices/TPLV7893-85"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"sku": "TPLV7893-85", "price": 99999999999999.99}"#),
        )
        .mount(&server)
        .await;

    let pricing = gateway_for(&server, None)
        .get_price("TPLV7893-85", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(pricing.price, dec!(99999999999999.99));
}

#[tokio::test]
async fn test_empty_price_body_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/prices/TPLV7893-85"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    let err = gateway_for(&server, None)
        .get_price("TPLV7893-85", &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err, GatewayError::EmptyBody { operation: "get_price" });
}

#[tokio::test]
async fn test_submit_posts_payload_and_returns_raw_response() {
    // Parsed from text so the expected numbers keep their scale
    let expected_body: serde_json::Value = serde_json::from_str(
        r#"{
            "companyId": "c-2",
            "companyName": "LIDO",
            "userLogin": "lido-admin",
            "userName": "Jane Doe",
            "orderedLicense": [
                {"sku": "TPLV7893-85", "price": 100.00, "count": 10, "sum": 1000.00}
            ]
        }"#,
    )
    .unwrap();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/results"))
        .and(body_json(expected_body))
        .respond_with(ResponseTemplate::new(202).set_body_string(r#"{"resultId":"r-77"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let payload = SubmitResultRequest {
        company_id: "c-2".to_string(),
        company_name: "LIDO".to_string(),
        user_login: Masked::from("lido-admin"),
        user_name: "Jane Doe".to_string(),
        ordered_license: vec![OrderedLicenseResult {
            sku: "TPLV7893-85".to_string(),
            price: dec!(100.00),
            count: 10,
            sum: dec!(1000.00),
        }],
    };

    let response = gateway_for(&server, None)
        .submit_result(&payload, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(response.status, 202);
    assert_eq!(response.body, r#"{"resultId":"r-77"}"#);
}

#[tokio::test]
async fn test_submit_error_status_is_returned_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/results"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad payload"))
        .mount(&server)
        .await;

    let payload = SubmitResultRequest {
        company_id: "c-2".to_string(),
        company_name: "LIDO".to_string(),
        user_login: Masked::from("lido-admin"),
        user_name: "Jane Doe".to_string(),
        ordered_license: vec![],
    };

    let response = gateway_for(&server, None)
        .submit_result(&payload, &CancellationToken::new())
        .await
        .unwrap();

    assert!(!response.is_success());
    assert_eq!(response.body, "bad payload");
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/prices/SLOW"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"sku": "SLOW", "price": 1}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = gateway_for(&server, None)
        .get_price("SLOW", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Timeout(_)));
}

#[tokio::test]
async fn test_cancellation_aborts_in_flight_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/prices/SLOW"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"sku": "SLOW", "price": 1}))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = gateway_for(&server, None)
        .get_price("SLOW", &cancel)
        .await
        .unwrap_err();

    assert_eq!(err, GatewayError::Cancelled);
}
