//! # tollgate
//!
//! Ordered pre-handler checks around a single HTTP endpoint. Nothing more.
//!
//! ## The contract
//!
//! You bring the server (hyper), the checks (authentication, feature flags,
//! tenancy, whatever) and the handler. tollgate runs the checks in order,
//! stops at the first one that says no, and answers with one uniform error
//! response:
//!
//! ```text
//! HTTP/1.1 401 Unauthorized
//! content-type: application/json
//!
//! {"error":"missing api key"}
//! ```
//!
//! What tollgate intentionally ignores:
//!
//! - **Routing**: mount each [`Route`] wherever your router wants it
//! - **Networking**: [`Route::into_service`] plugs into hyper; hyper does I/O
//! - **Authentication logic**: your [`Middleware`] decides, tollgate obeys
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use http::StatusCode;
//! use tollgate::{
//!     make_route, Context, ErrorDescriptor, Middleware, Outcome, Request, Response, RouteConfig,
//! };
//!
//! struct Caller(String);
//!
//! struct Authenticate;
//!
//! #[async_trait]
//! impl Middleware for Authenticate {
//!     fn error(&self) -> Option<ErrorDescriptor> {
//!         Some(ErrorDescriptor::new(StatusCode::UNAUTHORIZED, "missing api key"))
//!     }
//!
//!     async fn execute(&self, ctx: &mut Context, req: &Request, _: &mut Response) -> Outcome {
//!         let Some(key) = req.header("x-api-key") else { return Outcome::Reject };
//!         ctx.insert(Caller(key.to_owned()));
//!         Outcome::Proceed
//!     }
//! }
//!
//! async fn whoami(ctx: Context, _req: Request, _res: Response) -> String {
//!     ctx.get::<Caller>().map(|c| c.0.clone()).unwrap_or_default()
//! }
//!
//! let route = make_route(whoami, RouteConfig::new().middleware(Authenticate));
//! ```

mod context;
mod error;
mod handler;
mod request;
mod responder;
mod response;
mod route;

pub mod middleware;

pub use context::Context;
pub use error::{BoxError, Error};
pub use handler::Handler;
pub use middleware::{ErrorDescriptor, Middleware, Outcome};
pub use request::Request;
pub use responder::{ErrorResponder, send_error};
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use route::{Route, RouteConfig, make_route};
