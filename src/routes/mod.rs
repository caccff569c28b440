//! HTTP route handlers
//!
//! Shared JSON/CORS response helpers live here; the endpoint handlers are
//! in [`game`] and [`health`].

pub mod game;
pub mod health;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::types::ApiaryError;

/// Maximum accepted POST body size
const MAX_BODY_BYTES: usize = 10_240;

/// Rejection/error payload: stable code plus readable message
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: Option<&'static str>) -> Self {
        Self {
            success: false,
            error: error.into(),
            code,
        }
    }
}

/// Build a JSON response with CORS headers
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|_| {
            Response::new(Full::new(Bytes::from(r#"{"success":false,"error":"Internal error"}"#)))
        })
}

/// CORS preflight response
pub fn cors_preflight() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .header("Access-Control-Max-Age", "86400")
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())))
}

/// 404 response for unmatched paths
pub fn not_found(path: &str) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::NOT_FOUND,
        &ErrorResponse::new(format!("Not found: {}", path), Some("NOT_FOUND")),
    )
}

/// Read and deserialize a JSON request body, enforcing the size cap
pub async fn parse_json_body<T: for<'de> Deserialize<'de>>(
    req: Request<hyper::body::Incoming>,
) -> Result<T, ApiaryError> {
    let body = req
        .collect()
        .await
        .map_err(|e| ApiaryError::Http(format!("Failed to read body: {}", e)))?;

    let bytes = body.to_bytes();
    if bytes.len() > MAX_BODY_BYTES {
        return Err(ApiaryError::Http("Request body too large".into()));
    }

    serde_json::from_slice(&bytes).map_err(|e| ApiaryError::Http(format!("Invalid JSON: {}", e)))
}
