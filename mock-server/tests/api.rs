use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Expectation, MockState, RecordedRequest};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(body.to_string())
        .unwrap()
}

// --- dispatch ---

#[tokio::test]
async fn unmatched_request_returns_404() {
    let resp = app(MockState::default())
        .oneshot(request("GET", "/nothing", ""))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn matched_request_returns_canned_response() {
    let state = MockState::default();
    state
        .expect(
            Expectation::new("GET", "/")
                .status(200)
                .body("Body Content")
                .header("x-served-by", "mock"),
        )
        .await;

    let resp = app(state).oneshot(request("GET", "/", "")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["x-served-by"], "mock");
    assert_eq!(body_bytes(resp).await, "Body Content");
}

#[tokio::test]
async fn latest_expectation_wins() {
    let state = MockState::default();
    state.expect(Expectation::new("GET", "/").status(200)).await;
    state.expect(Expectation::new("GET", "/").status(400)).await;

    let resp = app(state).oneshot(request("GET", "/", "")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn method_must_match() {
    let state = MockState::default();
    state.expect(Expectation::new("POST", "/upload").status(201)).await;

    let resp = app(state).oneshot(request("PUT", "/upload", "x")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn requests_are_recorded_with_body_and_headers() {
    let state = MockState::default();
    state.expect(Expectation::new("POST", "/upload").status(201)).await;

    let req = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(http::header::CONTENT_TYPE, "text/plain")
        .header("x-trace", "a")
        .header("x-trace", "b")
        .body("hello".to_string())
        .unwrap();
    let resp = app(state.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let received = state.received().await;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].method, "POST");
    assert_eq!(received[0].path, "/upload");
    assert_eq!(received[0].body, "hello");
    assert_eq!(received[0].header("content-type"), Some("text/plain"));
    assert_eq!(received[0].header_values("x-trace"), vec!["a", "b"]);
}

// --- admin ---

#[tokio::test]
async fn expectations_can_be_registered_over_http() {
    let state = MockState::default();
    let router = app(state.clone());

    let resp = router
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/__expectations")
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(r#"{"method":"GET","path":"/json","body":"{}"}"#.to_string())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = router.oneshot(request("GET", "/json", "")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, "{}");
}

#[tokio::test]
async fn recorded_requests_are_listed_and_reset() {
    let state = MockState::default();
    let router = app(state.clone());

    router
        .clone()
        .oneshot(request("GET", "/a", ""))
        .await
        .unwrap();

    let resp = router
        .clone()
        .oneshot(request("GET", "/__requests", ""))
        .await
        .unwrap();
    let listed: Vec<RecordedRequest> = body_json(resp).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].path, "/a");

    let resp = router
        .clone()
        .oneshot(request("DELETE", "/__expectations", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(state.received().await.is_empty());
}
