use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rust_web_mindmap::api::routes::create_router;
use rust_web_mindmap::config::Config;
use rust_web_mindmap::llm::{LlmSettings, NoAi};
use rust_web_mindmap::orchestrator::{JobOrchestrator, OrchestratorSettings};
use rust_web_mindmap::scraper::HttpFetcher;
use rust_web_mindmap::store::JobStore;
use rust_web_mindmap::AppState;

fn test_state() -> AppState {
    let config = Config {
        server_addr: "127.0.0.1:0".parse().unwrap(),
        openrouter_api_key: None,
        llm: LlmSettings::default(),
        fetch_timeout: Duration::from_secs(5),
        output_dir: None,
        default_summary_length: 300,
    };
    let orchestrator = JobOrchestrator::new(
        JobStore::new(),
        Arc::new(HttpFetcher::new(config.fetch_timeout).unwrap()),
        Arc::new(NoAi),
        OrchestratorSettings::default(),
    );
    AppState {
        config: Arc::new(config),
        orchestrator,
    }
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_and_root() {
    let app = create_router(test_state());

    let (status, body) = call(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["ai_configured"], false);
    assert_eq!(body["meta"]["status"], "success");

    let (status, body) = call(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["endpoints"].as_array().unwrap().len() >= 6);
}

#[tokio::test]
async fn unknown_job_is_404() {
    let app = create_router(test_state());

    for uri in ["/job/missing", "/job/missing/result", "/job/missing/mindmaps"] {
        let (status, body) = call(&app, get(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["meta"]["status"], "error");
        assert!(body["data"].is_null());
    }

    let (status, _) = call(&app, delete("/job/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_url_is_rejected() {
    let app = create_router(test_state());
    let (status, body) = call(&app, post_json("/scrape", json!({ "url": "nope" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["meta"]["message"].as_str().unwrap().contains("Invalid URL"));
}

#[tokio::test]
async fn scrape_job_lifecycle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<html><head><title>Rust Guide</title></head><body><main>\
             <h1>Ownership Rules</h1><p>Every value in Rust has a single owner.</p>\
             </main></body></html>",
            "text/html",
        ))
        .mount(&server)
        .await;

    let state = test_state();
    let orchestrator = state.orchestrator.clone();
    let app = create_router(state);

    let url = format!("{}/page", server.uri());
    let (status, body) = call(
        &app,
        post_json("/scrape", json!({ "url": url, "summary_length": 20 })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["data"]["status"], "queued");
    let job_id = body["data"]["job_id"].as_str().unwrap().to_string();

    orchestrator.wait(&job_id).await;

    let (status, body) = call(&app, get(&format!("/job/{job_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["progress"], 100);
    assert!(body["data"].get("error").is_none());

    let (status, body) = call(&app, get(&format!("/job/{job_id}/result"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["scraped_content"]["title"], "Rust Guide");
    assert_eq!(
        body["data"]["summary"]["summary"],
        "Every value in Rust has a single owner"
    );

    let (status, body) = call(&app, get(&format!("/job/{job_id}/mindmaps"))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["hierarchical"].as_str().unwrap().starts_with("🌳 RUST GUIDE"));
    assert!(body["data"]["network"].as_str().unwrap().contains("NETWORK MIND MAP"));

    let (status, body) = call(&app, get("/jobs")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert!(body["data"]["jobs"][0].get("result").is_none());

    let (status, _) = call(&app, delete(&format!("/job/{job_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, get(&format!("/job/{job_id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
