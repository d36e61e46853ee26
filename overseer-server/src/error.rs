use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use overseer_error::OverseerError;
use serde_json::json;

use crate::status::{ActionId, StatusTable};

/// An action's failure, carrying enough context to project it to an HTTP
/// status via the [`StatusTable`] before rendering the error body.
pub struct ActionError {
    pub action: ActionId,
    pub method: Method,
    pub err: OverseerError,
}

impl ActionError {
    pub fn new(action: ActionId, method: Method, err: OverseerError) -> Self {
        ActionError { action, method, err }
    }
}

impl IntoResponse for ActionError {
    fn into_response(self) -> Response {
        let status = status_table().status_for(self.action, &self.method, &self.err);
        let body = json!({
            "error": self.err.to_string(),
            "category": self.err.category(),
            "value": self.err.code(),
        });
        (status, Json(body)).into_response()
    }
}

/// Lazily-built, process-wide action → status table; the mapping is fixed
/// at startup (§4.C10) and never mutated afterward.
pub fn status_table() -> &'static StatusTable {
    use std::sync::OnceLock;
    static TABLE: OnceLock<StatusTable> = OnceLock::new();
    TABLE.get_or_init(StatusTable::new)
}

/// A malformed request body — rejected before the controller is consulted,
/// so it never goes through the action → status projection.
pub fn bad_request(message: impl Into<String>) -> Response {
    let body = json!({
        "error": message.into(),
        "category": "BadRequest",
        "value": 0,
    });
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}
