use std::io::Write;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::json;

use crate::AppState;

/// Reject with a synthetic "server overloaded" error once the in-flight cap
/// is reached, before the request ever reaches a handler (§4.C10).
pub async fn admission_gate(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let Some(_admitted) = state.admission.try_admit() else {
        let body = json!({
            "error": "server is at its concurrent-request capacity",
            "category": "ServerOverloaded",
            "value": 0,
        });
        return (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response();
    };
    next.run(req).await
}

/// Gzip-encode the response body when the request's `Accept-Encoding`
/// header names `gzip` (§6).
pub async fn gzip_response(req: Request, next: Next) -> Response {
    let wants_gzip = req
        .headers()
        .get(header::ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("gzip"));

    let response = next.run(req).await;
    if !wants_gzip {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let Ok(bytes) = to_bytes(body, usize::MAX).await else {
        return Response::from_parts(parts, Body::empty());
    };

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    if encoder.write_all(&bytes).is_err() {
        return Response::from_parts(parts, Body::from(bytes));
    }
    let Ok(compressed) = encoder.finish() else {
        return Response::from_parts(parts, Body::from(bytes));
    };

    parts
        .headers
        .insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(compressed))
}
