use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::service::Service;
use tollgate::{
    Context, ErrorDescriptor, ErrorResponder, Middleware, Outcome, Request, Response, RouteConfig,
    make_route,
};

// ── Fixtures ──────────────────────────────────────────────────────────────────

/// Records middleware names in execution order, shared with the test body.
type Log = Arc<Mutex<Vec<&'static str>>>;

/// Per-request trail the middlewares append to.
#[derive(Default)]
struct Trail(Vec<&'static str>);

struct Check {
    name: &'static str,
    outcome: Outcome,
    error: Option<ErrorDescriptor>,
    log: Log,
}

impl Check {
    fn new(name: &'static str, outcome: impl Into<Outcome>, log: &Log) -> Self {
        Self { name, outcome: outcome.into(), error: None, log: Arc::clone(log) }
    }

    fn with_error(mut self, code: StatusCode, message: &str) -> Self {
        self.error = Some(ErrorDescriptor::new(code, message));
        self
    }
}

#[async_trait]
impl Middleware for Check {
    fn name(&self) -> &str { self.name }

    fn error(&self) -> Option<ErrorDescriptor> { self.error.clone() }

    async fn execute(&self, ctx: &mut Context, _req: &Request, _res: &mut Response) -> Outcome {
        self.log.lock().unwrap().push(self.name);
        if ctx.get::<Trail>().is_none() {
            ctx.insert(Trail::default());
        }
        if let Some(trail) = ctx.get_mut::<Trail>() {
            trail.0.push(self.name);
        }
        self.outcome.clone()
    }
}

/// Handler that logs itself and echoes the trail (or `empty`) as the body.
fn echo_trail(
    log: &Log,
) -> impl Fn(Context, Request, Response) -> std::future::Ready<Response> + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |ctx: Context, _req: Request, mut res: Response| {
        log.lock().unwrap().push("handler");
        let body = match ctx.get::<Trail>() {
            Some(trail) => trail.0.join(","),
            None if ctx.is_empty() => "empty".to_owned(),
            None => "unexpected".to_owned(),
        };
        res.set_body(body);
        std::future::ready(res)
    }
}

fn get(path: &str) -> Request {
    http::Request::get(path).body(Bytes::new()).unwrap().into()
}

fn json(res: &Response) -> serde_json::Value {
    serde_json::from_slice(res.body()).unwrap()
}

fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

// ── Composition ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn no_middlewares_calls_handler_once_with_empty_context() {
    let log = log();
    let route = make_route(echo_trail(&log), RouteConfig::new());

    let res = route.call(get("/")).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body().as_ref(), b"empty");
    assert_eq!(*log.lock().unwrap(), ["handler"]);
}

#[tokio::test]
async fn all_pass_chain_runs_in_order_then_handler() {
    let log = log();
    let config = RouteConfig::new()
        .middleware(Check::new("a", true, &log))
        .middleware(Check::new("b", true, &log))
        .middleware(Check::new("c", Outcome::Proceed, &log));
    let route = make_route(echo_trail(&log), config);

    let res = route.call(get("/")).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body().as_ref(), b"a,b,c");
    assert_eq!(*log.lock().unwrap(), ["a", "b", "c", "handler"]);
}

#[tokio::test]
async fn boolean_failure_uses_static_error_and_short_circuits() {
    let log = log();
    let config = RouteConfig::new()
        .middleware(Check::new("a", false, &log).with_error(StatusCode::METHOD_NOT_ALLOWED, "no"))
        .middleware(Check::new("b", true, &log));
    let route = make_route(echo_trail(&log), config);

    let res = route.call(get("/")).await;

    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(res.body().as_ref(), br#"{"error":"no"}"#);
    assert_eq!(*log.lock().unwrap(), ["a"]);
}

#[tokio::test]
async fn explicit_descriptor_overrides_static_error() {
    let log = log();
    let forbidden = ErrorDescriptor::new(StatusCode::FORBIDDEN, "forbidden");
    let config = RouteConfig::new().middleware(
        Check::new("a", forbidden, &log).with_error(StatusCode::METHOD_NOT_ALLOWED, "no"),
    );
    let route = make_route(echo_trail(&log), config);

    let res = route.call(get("/")).await;

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(json(&res), serde_json::json!({ "error": "forbidden" }));
    assert_eq!(*log.lock().unwrap(), ["a"]);
}

#[tokio::test]
async fn failure_without_static_error_is_500_server_error() {
    let log = log();
    let config = RouteConfig::new()
        .middleware(Check::new("a", true, &log))
        .middleware(Check::new("b", false, &log));
    let route = make_route(echo_trail(&log), config);

    let res = route.call(get("/")).await;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json(&res), serde_json::json!({ "error": "Server error" }));
    assert_eq!(*log.lock().unwrap(), ["a", "b"]);
}

// ── Error responders ──────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<(StatusCode, String)>>>,
}

#[async_trait]
impl ErrorResponder for Recorder {
    async fn respond(&self, res: &mut Response, code: StatusCode, message: &str) {
        self.calls.lock().unwrap().push((code, message.to_owned()));
        res.set_status(code);
        res.set_body(format!("custom: {message}"));
    }
}

#[tokio::test]
async fn custom_error_handler_replaces_default_responder() {
    let log = log();
    let recorder = Recorder::default();
    let config = RouteConfig::new()
        .middleware(Check::new("a", false, &log).with_error(StatusCode::UNAUTHORIZED, "who"))
        .error_handler(recorder.clone());
    let route = make_route(echo_trail(&log), config);

    let res = route.call(get("/")).await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.body().as_ref(), b"custom: who");
    assert!(res.headers().get("content-type").is_none());
    assert_eq!(
        *recorder.calls.lock().unwrap(),
        [(StatusCode::UNAUTHORIZED, "who".to_owned())],
    );
}

#[tokio::test]
async fn custom_error_handler_is_not_called_when_checks_pass() {
    let log = log();
    let recorder = Recorder::default();
    let config = RouteConfig::new()
        .middleware(Check::new("a", true, &log))
        .error_handler(recorder.clone());

    let res = make_route(echo_trail(&log), config).call(get("/")).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(recorder.calls.lock().unwrap().is_empty());
}

// ── Isolation ─────────────────────────────────────────────────────────────────

struct Counter(usize);

/// Bumps a per-request counter; a leaked context would show up as 2.
struct CountVisits {
    seen: Arc<AtomicUsize>,
}

#[async_trait]
impl Middleware for CountVisits {
    async fn execute(&self, ctx: &mut Context, _req: &Request, _res: &mut Response) -> Outcome {
        self.seen.fetch_add(1, Ordering::SeqCst);
        let next = ctx.get::<Counter>().map_or(1, |c| c.0 + 1);
        ctx.insert(Counter(next));
        Outcome::Proceed
    }
}

async fn report_count(ctx: Context, _req: Request, _res: Response) -> String {
    ctx.get::<Counter>().map_or(0, |c| c.0).to_string()
}

#[tokio::test]
async fn each_invocation_gets_its_own_context() {
    let seen = Arc::new(AtomicUsize::new(0));
    let route = make_route(
        report_count,
        RouteConfig::new().middleware(CountVisits { seen: Arc::clone(&seen) }),
    );

    let (first, second) = tokio::join!(route.call(get("/a")), route.call(get("/b")));

    assert_eq!(first.body().as_ref(), b"1");
    assert_eq!(second.body().as_ref(), b"1");
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}

// ── Response handling ─────────────────────────────────────────────────────────

/// Adds a header, then tries to pre-empt the handler's status.
struct Tag;

#[async_trait]
impl Middleware for Tag {
    async fn execute(&self, _ctx: &mut Context, _req: &Request, res: &mut Response) -> Outcome {
        res.insert_header("x-checked", "yes");
        res.set_status(StatusCode::ACCEPTED);
        Outcome::Proceed
    }
}

#[tokio::test]
async fn handler_sees_headers_from_middlewares_and_a_200_status() {
    async fn passthrough(_ctx: Context, _req: Request, res: Response) -> Response {
        res
    }

    let res = make_route(passthrough, RouteConfig::new().middleware(Tag))
        .call(get("/"))
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-checked"], "yes");
}

// ── Host adapter ──────────────────────────────────────────────────────────────

struct RequireBody;

#[async_trait]
impl Middleware for RequireBody {
    fn error(&self) -> Option<ErrorDescriptor> {
        Some(ErrorDescriptor::new(StatusCode::BAD_REQUEST, "empty body"))
    }

    async fn execute(&self, _ctx: &mut Context, req: &Request, _res: &mut Response) -> Outcome {
        (!req.body().is_empty()).into()
    }
}

async fn echo_body(_ctx: Context, req: Request, mut res: Response) -> Response {
    res.set_status(StatusCode::CREATED);
    res.set_json(req.body().clone());
    res
}

#[tokio::test]
async fn serve_converts_through_http_types() {
    let route = make_route(echo_body, RouteConfig::new().middleware(RequireBody));

    let req = http::Request::post("/items").body(Full::new(Bytes::from_static(b"[1]"))).unwrap();
    let res = route.serve(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.headers()["content-type"], "application/json");
    let body = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(body.as_ref(), b"[1]");
}

#[tokio::test]
async fn service_rejects_with_default_json_body() {
    let route = make_route(echo_body, RouteConfig::new().middleware(RequireBody));
    let svc = route.into_service::<Full<Bytes>>();

    let req = http::Request::post("/items").body(Full::new(Bytes::new())).unwrap();
    let res = svc.call(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(body.as_ref(), br#"{"error":"empty body"}"#);
}
