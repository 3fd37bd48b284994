//! Writing rejections.
//!
//! When a middleware rejects, the route hands the status and message to an
//! [`ErrorResponder`]. Unless a route is configured otherwise, that is
//! [`send_error`]:
//!
//! ```text
//! HTTP/1.1 403 Forbidden
//! content-type: application/json
//!
//! {"error":"forbidden"}
//! ```
//!
//! Any `Fn(&mut Response, StatusCode, &str)` is a responder, so a custom
//! format is one closure away. Implement the trait directly when the
//! responder itself needs to await something.

use async_trait::async_trait;
use http::StatusCode;
use serde::Serialize;

use crate::response::Response;

/// Terminates a rejected request.
///
/// Implementations must always leave a complete response behind: a status
/// and, usually, a body. The route does not touch the response afterwards.
#[async_trait]
pub trait ErrorResponder: Send + Sync + 'static {
    async fn respond(&self, res: &mut Response, code: StatusCode, message: &str);
}

#[async_trait]
impl<F> ErrorResponder for F
where
    F: Fn(&mut Response, StatusCode, &str) + Send + Sync + 'static,
{
    async fn respond(&self, res: &mut Response, code: StatusCode, message: &str) {
        (self)(res, code, message)
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// Default responder: sets `code` and writes `{"error": message}` as JSON.
pub fn send_error(res: &mut Response, code: StatusCode, message: &str) {
    res.set_status(code);
    match serde_json::to_vec(&ErrorBody { error: message }) {
        Ok(body) => res.set_json(body),
        // Unreachable for a single string field; keep the status regardless.
        Err(e) => tracing::error!("error body serialization failed: {e}"),
    }
}
