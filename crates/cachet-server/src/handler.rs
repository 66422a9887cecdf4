use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use cachet_protocol::{
    messages, ErrorBody, GetBody, HasBody, HealthResponse, MessageBody, SetQuery,
};
use cachet_store::{KeyValueStore, StoreError};
use serde_json::Value;
use tracing::{debug, error};

/// Store handle shared by every handler.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Failure of an API call, rendered as `{"error": ...}`.
#[derive(Debug)]
pub enum ApiError {
    InvalidBody,
    InvalidQuery,
    NotFound,
    Store(StoreError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::InvalidBody => (StatusCode::BAD_REQUEST, messages::INVALID_JSON_BODY.to_string()),
            Self::InvalidQuery => (StatusCode::BAD_REQUEST, messages::INVALID_QUERY.to_string()),
            Self::NotFound => (StatusCode::NOT_FOUND, messages::NOT_FOUND.to_string()),
            Self::Store(err) if err.is_client_error() => (StatusCode::BAD_REQUEST, err.to_string()),
            Self::Store(err) => {
                error!(error = %err, "store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    messages::INTERNAL_ERROR.to_string(),
                )
            }
        };
        (status, Json(ErrorBody::new(message))).into_response()
    }
}

/// `POST /api/v1/set/:key?ttl=<duration>` with a JSON body.
pub async fn set_handler(
    State(store): State<SharedStore>,
    Path(key): Path<String>,
    query: Result<Query<SetQuery>, QueryRejection>,
    body: Bytes,
) -> Result<(StatusCode, Json<MessageBody>), ApiError> {
    let value: Value = serde_json::from_slice(&body).map_err(|e| {
        debug!(key = %key, error = %e, "rejecting set with invalid body");
        ApiError::InvalidBody
    })?;
    let Query(query) = query.map_err(|e| {
        debug!(key = %key, error = %e, "rejecting set with invalid query");
        ApiError::InvalidQuery
    })?;

    store.set(&key, &value, query.ttl.as_duration())?;
    Ok((StatusCode::CREATED, Json(MessageBody::success())))
}

/// `GET /api/v1/get/:key`
pub async fn get_handler(
    State(store): State<SharedStore>,
    Path(key): Path<String>,
) -> Result<Json<GetBody>, ApiError> {
    match store.get(&key)? {
        Some(item) => Ok(Json(GetBody {
            meta: item.meta,
            value: item.value,
        })),
        None => Err(ApiError::NotFound),
    }
}

/// `DELETE /api/v1/delete/:key`. Succeeds whether or not the key existed.
pub async fn delete_handler(
    State(store): State<SharedStore>,
    Path(key): Path<String>,
) -> Result<Json<MessageBody>, ApiError> {
    store.delete(&key)?;
    Ok(Json(MessageBody::success()))
}

/// `GET /api/v1/has/:key`
pub async fn has_handler(
    State(store): State<SharedStore>,
    Path(key): Path<String>,
) -> Result<Json<HasBody>, ApiError> {
    let exists = store.has(&key)?;
    Ok(Json(HasBody { exists }))
}

/// Health check handler. Answers 503 once the store stops serving.
pub async fn health_handler(State(store): State<SharedStore>) -> (StatusCode, Json<HealthResponse>) {
    let stats = store.stats();
    let serving = stats.is_serving();
    let body = HealthResponse {
        status: if serving {
            HealthResponse::OK
        } else {
            HealthResponse::UNAVAILABLE
        }
        .into(),
        state: stats.state.to_string(),
        entries: stats.entries,
        removals_enqueued: stats.removals_enqueued,
        removals_dropped: stats.removals_dropped,
        failed_task: stats.failed_task,
        ..HealthResponse::default()
    };
    let status = if serving {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}
