use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Payment, API_KEY_HEADER};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(API_KEY_HEADER, "snd_test")
        .body(body.to_string())
        .unwrap()
}

fn get_request(uri: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header(API_KEY_HEADER, "snd_test")
        .body(String::new())
        .unwrap()
}

// --- auth ---

#[tokio::test]
async fn missing_api_key_returns_401() {
    let app = app();
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/payments")
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(r#"{"amount":100,"currency":"USD"}"#.to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(body_bytes(resp).await.is_empty());
}

// --- create ---

#[tokio::test]
async fn create_payment_returns_payment() {
    let app = app();
    let resp = app
        .oneshot(json_request(
            "POST",
            "/payments",
            r#"{"amount":6540,"currency":"USD","customer_id":"cus_1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let payment: Payment = body_json(resp).await;
    assert!(payment.payment_id.starts_with("pay_"));
    assert!(payment.client_secret.starts_with(&payment.payment_id));
    assert_eq!(payment.amount, 6540);
    assert_eq!(payment.status, "requires_payment_method");
    assert_eq!(payment.customer_id.as_deref(), Some("cus_1"));
}

#[tokio::test]
async fn create_confirmed_payment_succeeds() {
    let app = app();
    let resp = app
        .oneshot(json_request(
            "POST",
            "/payments",
            r#"{"amount":100,"currency":"EUR","confirm":true}"#,
        ))
        .await
        .unwrap();

    let payment: Payment = body_json(resp).await;
    assert_eq!(payment.status, "succeeded");
}

#[tokio::test]
async fn create_payment_malformed_json_returns_422() {
    let app = app();
    let resp = app
        .oneshot(json_request("POST", "/payments", r#"{"currency":"USD"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- retrieve / update ---

#[tokio::test]
async fn retrieve_payment_not_found() {
    let app = app();
    let resp = app.oneshot(get_request("/payments/pay_missing")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_payment_not_found() {
    let app = app();
    let resp = app
        .oneshot(json_request("POST", "/payments/pay_missing", r#"{"amount":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- full lifecycle ---

#[tokio::test]
async fn create_update_retrieve() {
    use tower::Service;

    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/payments",
            r#"{"amount":6540,"currency":"USD"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let created: Payment = body_json(resp).await;
    let id = created.payment_id.clone();

    // string amount is rejected, payment unchanged
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            &format!("/payments/{id}"),
            r#"{"amount":"20000"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            &format!("/payments/{id}"),
            r#"{"amount":20000,"metadata":{"udf1":"value1"}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Payment = body_json(resp).await;
    assert_eq!(updated.amount, 20000);
    assert_eq!(updated.currency, "USD");
    assert_eq!(updated.metadata.unwrap()["udf1"], "value1");

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get_request(&format!("/payments/{id}?force_sync=true")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Payment = body_json(resp).await;
    assert_eq!(fetched.payment_id, id);
    assert_eq!(fetched.amount, 20000);
    assert_eq!(fetched.client_secret, created.client_secret);
}
