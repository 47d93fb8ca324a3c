//! REST handlers built on axum.

use super::ServerConfig;
use crate::error::{FieldErrorKind, ServiceError};
use crate::record::{StructuredRecord, record_schema};
use crate::service::SharedService;
use axum::{
    Json, Router,
    body::Body,
    extract::{State, rejection::JsonRejection},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

/// Build the axum router for the prediction API.
pub fn router(state: SharedService, config: &ServerConfig) -> Router {
    let app = Router::new()
        .route("/predict", post(predict_handler))
        .route("/health", get(health_handler))
        .route("/schema", get(schema_handler))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %Uuid::new_v4(),
                )
            }),
        );

    if config.cors_allow_any {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

async fn predict_handler(
    State(service): State<SharedService>,
    payload: Result<Json<StructuredRecord>, JsonRejection>,
) -> Response {
    let record = match payload {
        Ok(Json(record)) => record,
        Err(rejection) => return decode_rejection(&rejection),
    };
    match service.predict(record) {
        Ok(result) => Json(result).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn health_handler(State(service): State<SharedService>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "model": service.predictor().name(),
        "encoder_features": service.encoder().width(),
        "fingerprint": service.encoder().fingerprint(),
        "uptime_secs": service.uptime_secs(),
    }))
}

async fn schema_handler() -> impl IntoResponse {
    Json(record_schema())
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            ServiceError::Validation(errors) => {
                tracing::info!(fields = errors.len(), "Rejected invalid record");
                let detail: Vec<_> = errors
                    .iter()
                    .map(|e| {
                        json!({
                            "loc": ["body", e.field],
                            "msg": e.message,
                            "type": e.kind,
                        })
                    })
                    .collect();
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "detail": detail })),
                )
                    .into_response()
            }
            ServiceError::Internal(e) => {
                tracing::error!(error = %e, "Prediction failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "Internal Server Error" })),
                )
                    .into_response()
            }
        }
    }
}

/// Undecodable bodies are reported in the same shape as validation errors.
fn decode_rejection(rejection: &JsonRejection) -> Response {
    let msg = rejection.body_text();
    let mut loc = vec!["body".to_string()];
    if let Some(field) = missing_field(&msg) {
        loc.push(field);
    }
    tracing::info!(error = %msg, "Rejected undecodable body");
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "detail": [{
                "loc": loc,
                "msg": msg,
                "type": FieldErrorKind::Decode,
            }]
        })),
    )
        .into_response()
}

/// Pull the field name out of serde's "missing field `x`" message.
fn missing_field(msg: &str) -> Option<String> {
    let rest = &msg[msg.find("missing field `")? + "missing field `".len()..];
    let end = rest.find('`')?;
    Some(rest[..end].to_string())
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn run(state: SharedService, config: &ServerConfig) -> Result<(), std::io::Error> {
    let app = router(state, config);
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_extraction() {
        let msg = "Failed to deserialize the JSON body into the target type: missing field `shower` at line 1 column 2";
        assert_eq!(missing_field(msg).as_deref(), Some("shower"));
        assert_eq!(missing_field("expected value at line 1 column 1"), None);
    }

    #[test]
    fn test_internal_error_hides_cause() {
        let err = ServiceError::Internal(crate::error::MlError::inference("secret detail"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
