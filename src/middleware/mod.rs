//! Middleware layer.
//!
//! A middleware is a pre-handler check. It looks at the request and the
//! [`Context`] built so far, optionally adds to the context, and answers with
//! an [`Outcome`]:
//!
//! | Outcome | Meaning |
//! |---|---|
//! | [`Outcome::Proceed`] | Check passed; run the next middleware (or the handler). |
//! | [`Outcome::Reject`] | Check failed; answer with [`Middleware::error`], or `500 Server error`. |
//! | [`Outcome::RejectWith`] | Check failed; answer with the attached descriptor. |
//!
//! Middlewares never write the rejection themselves. The route does that,
//! through its [`ErrorResponder`](crate::ErrorResponder).
//!
//! ```rust
//! use async_trait::async_trait;
//! use http::StatusCode;
//! use tollgate::{Context, ErrorDescriptor, Middleware, Outcome, Request, Response};
//!
//! pub struct ApiKey(pub u64);
//!
//! pub struct RequireApiKey;
//!
//! #[async_trait]
//! impl Middleware for RequireApiKey {
//!     fn name(&self) -> &str { "require-api-key" }
//!
//!     fn error(&self) -> Option<ErrorDescriptor> {
//!         Some(ErrorDescriptor::new(StatusCode::UNAUTHORIZED, "missing api key"))
//!     }
//!
//!     async fn execute(&self, ctx: &mut Context, req: &Request, _res: &mut Response) -> Outcome {
//!         match req.header("x-api-key").and_then(|k| k.parse().ok()) {
//!             Some(key) => { ctx.insert(ApiKey(key)); Outcome::Proceed }
//!             None      => Outcome::Reject,
//!         }
//!     }
//! }
//! ```

use std::fmt;

use async_trait::async_trait;
use http::StatusCode;

use crate::context::Context;
use crate::request::Request;
use crate::response::Response;

// ── ErrorDescriptor ───────────────────────────────────────────────────────────

/// A rejection decision: the status to answer with and a human message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorDescriptor {
    code: StatusCode,
    message: String,
}

impl ErrorDescriptor {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn code(&self) -> StatusCode { self.code }
    pub fn message(&self) -> &str { &self.message }
}

/// `500 Server error`, used when a middleware rejects without a static error.
impl Default for ErrorDescriptor {
    fn default() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
    }
}

impl fmt::Display for ErrorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code.as_u16(), self.message)
    }
}

// ── Outcome ───────────────────────────────────────────────────────────────────

/// What a middleware decided about the request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Proceed,
    Reject,
    RejectWith(ErrorDescriptor),
}

/// `true` passes, `false` rejects with the middleware's static error.
impl From<bool> for Outcome {
    fn from(pass: bool) -> Self {
        if pass { Self::Proceed } else { Self::Reject }
    }
}

impl From<ErrorDescriptor> for Outcome {
    fn from(e: ErrorDescriptor) -> Self {
        Self::RejectWith(e)
    }
}

// ── Middleware ────────────────────────────────────────────────────────────────

/// A pre-handler check run by a [`Route`](crate::Route).
///
/// A panic inside `execute` is not caught by the route; it unwinds into the
/// host server like any other handler panic.
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    /// Name used in log events.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Static error used when `execute` returns [`Outcome::Reject`].
    fn error(&self) -> Option<ErrorDescriptor> {
        None
    }

    async fn execute(&self, ctx: &mut Context, req: &Request, res: &mut Response) -> Outcome;
}
