// tests/http_fetcher.rs
//
// ReqwestFetcher against a local axum stub: status mapping, URL encoding,
// body decoding, and that keys never leak into error text.

use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

use clicknotes::catalog::{
    ApiKey, CatalogClient, CatalogQuery, EndpointTemplate, FetchError, JsonFetcher, ReqwestFetcher,
};
use std::sync::Arc;

async fn spawn_stub() -> SocketAddr {
    let app = Router::new()
        .route(
            "/search/tv",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                Json(json!({"results": [{"id": 1, "echo": q.get("query"), "key": q.get("api_key")}]}))
            }),
        )
        .route("/limited", get(|| async { StatusCode::TOO_MANY_REQUESTS }))
        .route("/denied", get(|| async { StatusCode::UNAUTHORIZED }))
        .route("/forbidden", get(|| async { StatusCode::FORBIDDEN }))
        .route("/broken", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/garbage", get(|| async { "definitely not json" }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({}))
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });
    addr
}

fn fetcher() -> ReqwestFetcher {
    ReqwestFetcher::new(Duration::from_secs(2)).expect("client builds")
}

async fn fetch_path(addr: SocketAddr, path: &str) -> Result<Value, FetchError> {
    let ep = EndpointTemplate::new("stub", &format!("http://{addr}"), path, "api_key")
        .for_key(&ApiKey::new("sekrit"))
        .expect("endpoint");
    fetcher().get_json(&ep).await
}

#[tokio::test]
async fn query_is_encoded_and_round_trips() {
    let addr = spawn_stub().await;
    let client = CatalogClient::new(Arc::new(fetcher()));
    let template = EndpointTemplate::new("stub.search", &format!("http://{addr}"), "/search/tv", "api_key")
        .with_query_param("query");
    let query = CatalogQuery::new("Tom & Jerry? 100%", ApiKey::new("k"));

    let items = client
        .fetch_by_query(&query, &template, "/results")
        .await
        .expect("stub answers");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].0["echo"], "Tom & Jerry? 100%");
    assert_eq!(items[0].0["key"], "k");
}

#[tokio::test]
async fn status_codes_map_to_typed_failures() {
    let addr = spawn_stub().await;
    assert_eq!(fetch_path(addr, "/limited").await, Err(FetchError::RateLimited));
    assert_eq!(fetch_path(addr, "/denied").await, Err(FetchError::Unauthorized));
    assert_eq!(fetch_path(addr, "/forbidden").await, Err(FetchError::Unauthorized));
    assert_eq!(
        fetch_path(addr, "/broken").await,
        Err(FetchError::Unreachable("http status 500".into()))
    );
    assert_eq!(fetch_path(addr, "/nowhere").await.unwrap_err().kind(), "unreachable");
}

#[tokio::test]
async fn undecodable_body_is_malformed() {
    let addr = spawn_stub().await;
    let err = fetch_path(addr, "/garbage").await.unwrap_err();
    assert_eq!(err.kind(), "malformed");
    assert!(!err.to_string().contains("sekrit"));
}

#[tokio::test]
async fn transport_failure_is_unreachable_without_key() {
    // Bind and drop to get a port nobody listens on.
    let addr = {
        let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
        l.local_addr().unwrap()
    };
    let err = fetch_path(addr, "/anything").await.unwrap_err();
    assert_eq!(err.kind(), "unreachable");
    assert!(!err.to_string().contains("sekrit"), "key leaked: {err}");
}

#[tokio::test]
async fn timeout_is_unreachable() {
    let addr = spawn_stub().await;
    let ep = EndpointTemplate::new("stub", &format!("http://{addr}"), "/slow", "api_key")
        .for_key(&ApiKey::new("sekrit"))
        .unwrap();
    let f = ReqwestFetcher::new(Duration::from_millis(200)).unwrap();
    let err = f.get_json(&ep).await.unwrap_err();
    assert!(err.is_transient());
    assert!(!err.to_string().contains("sekrit"));
}
