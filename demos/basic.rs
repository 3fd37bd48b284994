//! Minimal tollgate demo: two guarded endpoints behind hyper.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl -i http://localhost:3000/orders                          → 401
//!   curl -i -H 'x-api-key: 7' http://localhost:3000/orders        → 200
//!   curl -i -H 'x-api-key: 7' http://localhost:3000/admin         → 403
//!   curl -i -H 'x-api-key: 1' http://localhost:3000/admin         → 200

use std::net::SocketAddr;

use async_trait::async_trait;
use http::StatusCode;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tollgate::{
    Context, ErrorDescriptor, Middleware, Outcome, Request, Response, RouteConfig, make_route,
};
use tracing::{error, info};

// ── Checks ────────────────────────────────────────────────────────────────────

struct ApiKey(u64);

trait ApiKeyContext {
    fn api_key(&self) -> Option<u64>;
}

impl ApiKeyContext for Context {
    fn api_key(&self) -> Option<u64> {
        self.get::<ApiKey>().map(|k| k.0)
    }
}

struct RequireApiKey;

#[async_trait]
impl Middleware for RequireApiKey {
    fn name(&self) -> &str { "require-api-key" }

    fn error(&self) -> Option<ErrorDescriptor> {
        Some(ErrorDescriptor::new(StatusCode::UNAUTHORIZED, "missing api key"))
    }

    async fn execute(&self, ctx: &mut Context, req: &Request, _res: &mut Response) -> Outcome {
        match req.header("x-api-key").and_then(|k| k.parse().ok()) {
            Some(key) => {
                ctx.insert(ApiKey(key));
                Outcome::Proceed
            }
            None => Outcome::Reject,
        }
    }
}

// Key 1 is the only admin.
struct RequireAdmin;

#[async_trait]
impl Middleware for RequireAdmin {
    fn name(&self) -> &str { "require-admin" }

    async fn execute(&self, ctx: &mut Context, _req: &Request, _res: &mut Response) -> Outcome {
        match ctx.api_key() {
            Some(1) => Outcome::Proceed,
            Some(_) => ErrorDescriptor::new(StatusCode::FORBIDDEN, "admins only").into(),
            None => Outcome::Reject,
        }
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

async fn list_orders(ctx: Context, _req: Request, mut res: Response) -> Response {
    let key = ctx.api_key().unwrap_or_default();
    res.set_json(format!(r#"{{"owner":{key},"orders":[]}}"#));
    res
}

async fn admin(_ctx: Context, _req: Request, _res: Response) -> &'static str {
    "welcome, admin"
}

// ── Server ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let authenticated = RouteConfig::new().middleware(RequireApiKey);
    let orders = make_route(list_orders, authenticated.clone());
    let admin = make_route(admin, authenticated.middleware(RequireAdmin));

    let addr: SocketAddr = "0.0.0.0:3000".parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "tollgate demo listening");

    let mut tasks = tokio::task::JoinSet::new();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                break;
            }

            res = listener.accept() => {
                let (stream, peer) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        error!("accept error: {e}");
                        continue;
                    }
                };

                // Path matching is the host's job; this demo does the
                // smallest possible version of it per connection.
                let (orders, admin) = (orders.clone(), admin.clone());
                let svc = hyper::service::service_fn(move |req: hyper::Request<hyper::body::Incoming>| {
                    let route = if req.uri().path() == "/admin" { admin.clone() } else { orders.clone() };
                    async move { route.serve(req).await }
                });

                tasks.spawn(async move {
                    if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                        .serve_connection(TokioIo::new(stream), svc)
                        .await
                    {
                        error!(%peer, "connection error: {e}");
                    }
                });
            }

            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    while tasks.join_next().await.is_some() {}

    info!("tollgate demo stopped");
    Ok(())
}
