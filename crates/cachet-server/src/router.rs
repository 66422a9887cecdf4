use std::time::Duration;

use axum::routing::{delete, get, post};
use axum::Router;
use cachet_protocol::endpoints;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handler::{self, SharedStore};

/// Build the axum router with all Cachet endpoints.
///
/// Every request is traced and cut off after `request_timeout`.
pub fn build_router(store: SharedStore, request_timeout: Duration) -> Router {
    Router::new()
        .route(endpoints::SET, post(handler::set_handler))
        .route(endpoints::GET, get(handler::get_handler))
        .route(endpoints::DELETE, delete(handler::delete_handler))
        .route(endpoints::HAS, get(handler::has_handler))
        .route(endpoints::HEALTH, get(handler::health_handler))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use cachet_store::StoreError;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::util::ServiceExt;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn app(store: &Arc<MockStore>) -> Router {
        build_router(store.clone(), TIMEOUT)
    }

    async fn call(app: Router, method: Method, uri: &str, body: Body) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(body)
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    // -----------------------------------------------------------------------
    // Set
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn set_stores_value() {
        let store = Arc::new(MockStore::default());
        let (status, body) = call(
            app(&store),
            Method::POST,
            "/api/v1/set/user?ttl=10s",
            Body::from(r#"{"name":"ada"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({"message": "success"}));
        let (value, ttl) = store.entry("user").unwrap();
        assert_eq!(value, json!({"name": "ada"}));
        assert_eq!(ttl, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn set_negative_ttl_clamps_to_zero() {
        let store = Arc::new(MockStore::default());
        let (status, _) = call(
            app(&store),
            Method::POST,
            "/api/v1/set/k?ttl=-1.5h",
            Body::from("1"),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(store.entry("k").unwrap().1, Duration::ZERO);
    }

    #[tokio::test]
    async fn set_rejects_invalid_body() {
        let store = Arc::new(MockStore::default());
        let (status, body) = call(
            app(&store),
            Method::POST,
            "/api/v1/set/k?ttl=10s",
            Body::from("{not json"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "invalid json body"}));
        assert!(store.entry("k").is_none());
    }

    #[tokio::test]
    async fn set_rejects_missing_or_bad_ttl() {
        let store = Arc::new(MockStore::default());
        for uri in ["/api/v1/set/k", "/api/v1/set/k?ttl=soon", "/api/v1/set/k?ttl=10"] {
            let (status, body) = call(app(&store), Method::POST, uri, Body::from("1")).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body, json!({"error": "invalid query parameters"}));
        }
    }

    #[tokio::test]
    async fn set_encoding_error_is_bad_request() {
        let store = Arc::new(MockStore::failing(StoreError::Encoding("nope".into())));
        let (status, body) = call(
            app(&store),
            Method::POST,
            "/api/v1/set/k?ttl=1s",
            Body::from("1"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "encoding error: nope"}));
    }

    // -----------------------------------------------------------------------
    // Get / Has / Delete
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn get_returns_meta_and_value() {
        let store = Arc::new(MockStore::default());
        store.insert("k", json!([1, 2, 3]));

        let (status, body) = call(app(&store), Method::GET, "/api/v1/get/k", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["value"], json!([1, 2, 3]));
        assert!(body["meta"]["createdAt"].is_string());
        assert!(body["meta"]["modifiedAt"].is_string());
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = Arc::new(MockStore::default());
        let (status, body) = call(app(&store), Method::GET, "/api/v1/get/k", Body::empty()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "not found"}));
    }

    #[tokio::test]
    async fn store_failures_are_internal_errors() {
        for err in [
            StoreError::Decoding("bad".into()),
            StoreError::Closed,
            StoreError::Unhealthy("sweeper".into()),
        ] {
            let store = Arc::new(MockStore::failing(err));
            for (method, uri) in [
                (Method::GET, "/api/v1/get/k"),
                (Method::GET, "/api/v1/has/k"),
                (Method::DELETE, "/api/v1/delete/k"),
            ] {
                let (status, body) = call(app(&store), method, uri, Body::empty()).await;
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
                assert_eq!(body, json!({"error": "internal server error"}));
            }
        }
    }

    #[tokio::test]
    async fn has_reports_existence() {
        let store = Arc::new(MockStore::default());
        store.insert("k", json!("v"));

        let (status, body) = call(app(&store), Method::GET, "/api/v1/has/k", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"exists": true}));

        let (_, body) = call(app(&store), Method::GET, "/api/v1/has/other", Body::empty()).await;
        assert_eq!(body, json!({"exists": false}));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = Arc::new(MockStore::default());
        store.insert("k", json!("v"));

        for _ in 0..2 {
            let (status, body) =
                call(app(&store), Method::DELETE, "/api/v1/delete/k", Body::empty()).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({"message": "success"}));
        }
        assert!(store.entry("k").is_none());
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let store = Arc::new(MockStore::default());
        let (status, _) = call(app(&store), Method::GET, "/api/v1/nope", Body::empty()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    // -----------------------------------------------------------------------
    // Health
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn health_ok_while_serving() {
        let store = Arc::new(MockStore::default());
        store.insert("k", json!(1));
        let (status, body) = call(app(&store), Method::GET, "/api/v1/health", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["state"], "running");
        assert_eq!(body["entries"], 1);
    }

    #[tokio::test]
    async fn health_unavailable_when_unhealthy() {
        let store = Arc::new(MockStore::default());
        store.mark_failed("removal-worker");
        let (status, body) = call(app(&store), Method::GET, "/api/v1/health", Body::empty()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "unavailable");
        assert_eq!(body["failed_task"], "removal-worker");
    }
}
