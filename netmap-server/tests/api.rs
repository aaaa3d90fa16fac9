use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use netmap_core::model::InterfaceStatus;
use netmap_core::Store;
use netmap_server::handlers;
use netmap_server::state::AppState;

fn seeded_store() -> Store {
    let now = std::time::SystemTime::UNIX_EPOCH;
    let mut store = Store::new();
    store.upsert_device("router1", "core", now).unwrap();
    store
        .upsert_interface("router1", "eth0", "192.168.1.1", "192.168.1.0/24", InterfaceStatus::Up, now)
        .unwrap();
    store
        .upsert_route("router1", "192.168.1.0/24", None, netmap_core::model::RouteType::Connected, 0, now)
        .unwrap();
    store
}

#[tokio::test]
async fn s7_healthz_returns_ok() {
    let app = handlers::router(AppState::new(seeded_store()));
    let response = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn s8_no_route_returns_400_with_error_status() {
    let app = handlers::router(AppState::new(seeded_store()));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/routing-path?source=192.168.1.5&destination=10.9.9.9")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["status"], "error");
}

#[tokio::test]
async fn s9_delete_device_cascades_interfaces() {
    let state = AppState::new(seeded_store());

    let delete_response = handlers::router(state.clone())
        .oneshot(Request::builder().method("DELETE").uri("/devices/router1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(delete_response.status(), StatusCode::NO_CONTENT);

    let list_response = handlers::router(state)
        .oneshot(Request::builder().uri("/interfaces?device=router1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = axum::body::to_bytes(list_response.into_body(), usize::MAX).await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(value.as_array().unwrap().is_empty(), "interfaces must be gone once their device is deleted");
}

#[tokio::test]
async fn s10_unknown_device_networks_returns_404() {
    let app = handlers::router(AppState::new(seeded_store()));
    let response = app
        .oneshot(Request::builder().uri("/devices/ghost/networks").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
