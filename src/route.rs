//! Route composition.
//!
//! [`make_route`] wraps one handler in an ordered list of [`Middleware`]
//! checks. Per request the resulting [`Route`]:
//!
//! 1. allocates an empty [`Context`] and a `200 OK` [`Response`];
//! 2. runs each middleware in configuration order, awaiting each one before
//!    starting the next;
//! 3. on the first rejection, hands the status and message to the error
//!    responder and returns; later middlewares and the handler never run;
//! 4. otherwise resets the status to `200 OK` and calls the handler with the
//!    accumulated context.
//!
//! ```rust,no_run
//! use tollgate::{make_route, Context, Request, Response, RouteConfig};
//! # use tollgate::{Middleware, Outcome};
//! # struct RequireApiKey;
//! # #[async_trait::async_trait]
//! # impl Middleware for RequireApiKey {
//! #     async fn execute(&self, _: &mut Context, _: &Request, _: &mut Response) -> Outcome { Outcome::Proceed }
//! # }
//!
//! async fn list_orders(_ctx: Context, _req: Request, res: Response) -> Response {
//!     res
//! }
//!
//! let route = make_route(list_orders, RouteConfig::new().middleware(RequireApiKey));
//! let service = route.into_service::<hyper::body::Incoming>();
//! ```

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::service::{Service, service_fn};
use tracing::{debug, trace};

use crate::context::Context;
use crate::error::{BoxError, Error};
use crate::handler::{BoxedHandler, Handler};
use crate::middleware::{ErrorDescriptor, Middleware, Outcome};
use crate::request::Request;
use crate::responder::{ErrorResponder, send_error};
use crate::response::Response;

// ── RouteConfig ───────────────────────────────────────────────────────────────

/// Checks and error responder for one route.
///
/// | Field | Default |
/// |---|---|
/// | middlewares | none, the handler runs unconditionally |
/// | error handler | [`send_error`], `{"error": message}` as JSON |
///
/// Cheap to clone: everything inside is behind an `Arc`, so one config can
/// seed several routes.
#[derive(Clone, Default)]
pub struct RouteConfig {
    middlewares: Vec<Arc<dyn Middleware>>,
    error_handler: Option<Arc<dyn ErrorResponder>>,
}

impl RouteConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a check. Checks run in the order they were added.
    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Appends a check that is already shared with other routes.
    pub fn shared_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Replaces the default JSON responder.
    pub fn error_handler(mut self, responder: impl ErrorResponder) -> Self {
        self.error_handler = Some(Arc::new(responder));
        self
    }
}

impl fmt::Debug for RouteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteConfig")
            .field("middlewares", &self.middlewares.iter().map(|m| m.name()).collect::<Vec<_>>())
            .field("custom_error_handler", &self.error_handler.is_some())
            .finish()
    }
}

// ── Route ─────────────────────────────────────────────────────────────────────

/// Wraps `handler` so it only runs once every middleware in `config` passes.
///
/// Nothing runs until the returned [`Route`] is invoked.
pub fn make_route(handler: impl Handler, config: RouteConfig) -> Route {
    let RouteConfig { middlewares, error_handler } = config;
    let error_handler = error_handler.unwrap_or_else(|| Arc::new(send_error) as Arc<dyn ErrorResponder>);
    Route {
        inner: Arc::new(Inner {
            middlewares,
            error_handler,
            handler: handler.into_boxed_handler(),
        }),
    }
}

/// A handler guarded by its middlewares. Cloning is one atomic increment.
#[derive(Clone)]
pub struct Route {
    inner: Arc<Inner>,
}

struct Inner {
    middlewares: Vec<Arc<dyn Middleware>>,
    error_handler: Arc<dyn ErrorResponder>,
    handler: BoxedHandler,
}

impl Route {
    /// Runs the middleware chain and, if it passes, the handler.
    ///
    /// Panics raised by a middleware or the handler are not caught.
    pub async fn call(&self, req: Request) -> Response {
        let mut ctx = Context::new();
        let mut res = Response::new();

        for middleware in &self.inner.middlewares {
            let rejection = match middleware.execute(&mut ctx, &req, &mut res).await {
                Outcome::Proceed => {
                    trace!(middleware = middleware.name(), "check passed");
                    continue;
                }
                Outcome::Reject => middleware.error().unwrap_or_default(),
                Outcome::RejectWith(descriptor) => descriptor,
            };
            self.reject(middleware.name(), &req, &mut res, rejection).await;
            return res;
        }

        res.set_status(StatusCode::OK);
        trace!(path = req.path(), "dispatching to handler");
        self.inner.handler.call(ctx, req, res).await
    }

    async fn reject(&self, by: &str, req: &Request, res: &mut Response, rejection: ErrorDescriptor) {
        debug!(
            middleware = by,
            method = %req.method(),
            path = req.path(),
            status = rejection.code().as_u16(),
            message = rejection.message(),
            "request rejected",
        );
        self.inner
            .error_handler
            .respond(res, rejection.code(), rejection.message())
            .await;
    }

    /// Collects the body of an `http` request, runs [`Route::call`] and
    /// converts the result back.
    pub async fn serve<B>(&self, req: http::Request<B>) -> Result<http::Response<Full<Bytes>>, Error>
    where
        B: Body,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = req.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| Error::Body(e.into()))?
            .to_bytes();

        let res = self.call(Request::from_http(http::Request::from_parts(parts, body))).await;
        Ok(res.into_http())
    }

    /// Adapts the route into a hyper `Service`, ready for
    /// `serve_connection`.
    pub fn into_service<B>(
        self,
    ) -> impl Service<http::Request<B>, Response = http::Response<Full<Bytes>>, Error = Error>
    where
        B: Body + Send + 'static,
        B::Data: Send,
        B::Error: Into<BoxError>,
    {
        service_fn(move |req: http::Request<B>| {
            let route = self.clone();
            async move { route.serve(req).await }
        })
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("middlewares", &self.inner.middlewares.iter().map(|m| m.name()).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
