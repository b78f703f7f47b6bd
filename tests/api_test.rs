// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - API Integration Tests
 * Endpoint contract over a live listener, exercising paths that terminate
 * before any outbound probe
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::sync::Arc;

use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use serde_json::{json, Value};

use sitetrust::api::{create_router, AppState};
use sitetrust::cache::ResultCache;
use sitetrust::checker::SiteChecker;
use sitetrust::config::AppConfig;
use sitetrust::probes::LiveProbes;
use sitetrust::safety::UrlSafetyGate;
use sitetrust::scoring::ScoreEngine;

async fn spawn_app() -> String {
    let config = AppConfig::default();

    let resolver = TokioResolver::builder_with_config(
        ResolverConfig::default(),
        TokioConnectionProvider::default(),
    )
    .build();

    let cache = Arc::new(ResultCache::new(true, 100));
    let probes = Arc::new(LiveProbes::new(&config.probes, resolver.clone()).unwrap());
    let gate = UrlSafetyGate::new(resolver, Vec::new());
    let checker = SiteChecker::new(gate, probes, ScoreEngine::new(), cache, &config.cache);

    let app = create_router(Arc::new(AppState { checker }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn health_returns_healthy() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn check_without_url_is_bad_request() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/check"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "URL is required");
}

#[tokio::test]
async fn check_blocked_scheme_reports_reason() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/check"))
        .json(&json!({"url": "ftp://example.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["trust_level"], "blocked");
    assert_eq!(body["reason"], "bad_scheme:ftp");
    assert_eq!(body["score"], 0);
}

#[tokio::test]
async fn check_loopback_is_blocked_not_5xx() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/check"))
        .json(&json!({"url": "http://127.0.0.1/"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "URL not allowed");
    assert_eq!(body["reason"], "resolved_to_private_ip:127.0.0.1");
}

#[tokio::test]
async fn batch_without_urls_is_bad_request() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/batch-check"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "URLs array is required");
}

#[tokio::test]
async fn batch_caps_to_first_ten_and_isolates_failures() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let urls: Vec<String> = (0..15).map(|i| format!("http://127.0.0.{}/", i + 1)).collect();
    let response = client
        .post(format!("{base}/batch-check"))
        .json(&json!({"urls": urls}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 10);

    for entry in results {
        assert_eq!(entry["trust_level"], "blocked");
        assert_eq!(entry["score"], 0);
        assert!(entry["reason"]
            .as_str()
            .unwrap()
            .starts_with("resolved_to_private_ip:"));
    }
}

#[tokio::test]
async fn liveness_endpoint_responds() {
    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{base}/health/live"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["alive"], true);
}
