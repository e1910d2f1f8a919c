//! HTTP request handlers and outcome-to-response mapping.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::lookup::{BatchOutcome, LookupOutcome, LookupService};
use crate::ratelimit::ClientKey;

/// Build the service router.
pub fn router(service: Arc<LookupService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/asn/lookup", get(lookup))
        .route("/v1/asn/lookup-batch", post(lookup_batch))
        .fallback(not_found)
        .with_state(service)
}

#[derive(Debug, Deserialize)]
struct LookupParams {
    ip: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BatchRequest {
    ips: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Liveness probe. Touches neither the limiter nor the upstream, so
/// orchestration traffic can never be starved by client load.
async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn lookup(
    State(service): State<Arc<LookupService>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(params): Query<LookupParams>,
) -> Response {
    let Some(ip) = params.ip else {
        return error_response(StatusCode::BAD_REQUEST, "query parameter 'ip' is required");
    };

    let client = client_key(&headers, peer);
    debug!(client = %client, ip = %ip, "Lookup request");

    lookup_response(service.handle_lookup(&ip, &client).await)
}

async fn lookup_batch(
    State(service): State<Arc<LookupService>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(request): Json<BatchRequest>,
) -> Response {
    let client = client_key(&headers, peer);
    debug!(client = %client, count = request.ips.len(), "Batch lookup request");

    batch_response(service.handle_batch(&request.ips, &client).await)
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "not found")
}

/// Derive the rate-limit identity for a request.
fn client_key(headers: &HeaderMap, peer: SocketAddr) -> ClientKey {
    let forwarded_for = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok());
    ClientKey::from_request(forwarded_for, peer.ip())
}

/// Map a lookup outcome onto the protocol response.
///
/// This mapping is the sole coupling between outcomes and status codes:
/// success 200, invalid input 400, over quota 429 with a `Retry-After`
/// hint, upstream failure 502.
fn lookup_response(outcome: LookupOutcome) -> Response {
    match outcome {
        LookupOutcome::Admitted(record) => (StatusCode::OK, Json(record)).into_response(),
        LookupOutcome::RejectedInvalidInput { reason } => {
            error_response(StatusCode::BAD_REQUEST, &reason)
        }
        LookupOutcome::RejectedRateLimited { retry_after_secs } => {
            rate_limited_response(retry_after_secs)
        }
        LookupOutcome::RejectedUpstreamFailure(err) => {
            error_response(StatusCode::BAD_GATEWAY, &err.to_string())
        }
    }
}

fn batch_response(outcome: BatchOutcome) -> Response {
    match outcome {
        BatchOutcome::Completed(items) => {
            (StatusCode::OK, Json(json!({ "items": items }))).into_response()
        }
        BatchOutcome::RejectedInvalidRequest { reason } => {
            error_response(StatusCode::BAD_REQUEST, &reason)
        }
        BatchOutcome::RejectedRateLimited { retry_after_secs } => {
            rate_limited_response(retry_after_secs)
        }
    }
}

fn rate_limited_response(retry_after_secs: u64) -> Response {
    (
        StatusCode::TOO_MANY_REQUESTS,
        [(header::RETRY_AFTER, retry_after_secs.to_string())],
        Json(ErrorBody {
            error: "rate limit exceeded".to_string(),
        }),
    )
        .into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}
