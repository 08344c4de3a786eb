// tests/load_balancer_tests.rs
use hyper::{Body, Client, Request, StatusCode};
use mockito::{Matcher, Mock, ServerGuard};
use roundrobin_proxy::health::{HealthChecker, HttpProbe};
use roundrobin_proxy::load_balancer::Dispatcher;
use roundrobin_proxy::proxy::build_pool;
use roundrobin_proxy::server::{accept_loop, RequestHandler};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceExt;

const DEAD_BACKEND: &str = "http://127.0.0.1:1";

fn checker() -> Arc<dyn HealthChecker> {
    Arc::new(HttpProbe::new(Duration::from_secs(2)).unwrap())
}

fn handler(addresses: &[String]) -> RequestHandler {
    let pool = build_pool(addresses, checker(), None).unwrap();
    RequestHandler::new(Arc::new(Dispatcher::new(pool).unwrap()))
}

/// Upstream answering probes on `/` and real traffic on `/work`.
struct Upstream {
    server: ServerGuard,
    _probe: Mock,
    work: Mock,
}

async fn upstream(name: &str) -> Upstream {
    let mut server = mockito::Server::new_async().await;
    let probe = server.mock("GET", "/").with_status(200).create_async().await;
    let work = server
        .mock("GET", "/work")
        .match_header("x-request-id", Matcher::Regex("^[0-9a-f-]{36}$".into()))
        .with_body(name)
        .expect_at_least(1)
        .create_async()
        .await;
    Upstream {
        server,
        _probe: probe,
        work,
    }
}

async fn body_of(response: hyper::Response<Body>) -> String {
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_round_robin_skips_dead_backend() {
    let a = upstream("A").await;
    let b = upstream("B").await;
    let handler = handler(&[a.server.url(), DEAD_BACKEND.to_string(), b.server.url()]);

    let mut bodies = Vec::new();
    for _ in 0..4 {
        let req = Request::get("/work").body(Body::empty()).unwrap();
        let response = handler.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        bodies.push(body_of(response).await);
    }

    assert_eq!(bodies, ["A", "B", "A", "B"]);
    a.work.assert_async().await;
    b.work.assert_async().await;
}

#[tokio::test]
async fn test_backend_answering_error_on_probe_is_skipped() {
    let mut sick = mockito::Server::new_async().await;
    let _sick_probe = sick.mock("GET", "/").with_status(500).create_async().await;
    let sick_work = sick.mock("GET", "/work").expect(0).create_async().await;
    let healthy = upstream("healthy").await;

    let handler = handler(&[sick.url(), healthy.server.url()]);

    for _ in 0..3 {
        let req = Request::get("/work").body(Body::empty()).unwrap();
        let response = handler.clone().oneshot(req).await.unwrap();
        assert_eq!(body_of(response).await, "healthy");
    }
    sick_work.assert_async().await;
}

#[tokio::test]
async fn test_total_outage_returns_service_unavailable() {
    let handler = handler(&[DEAD_BACKEND.to_string(), "http://127.0.0.1:2".to_string()]);

    let req = Request::get("/anything").body(Body::empty()).unwrap();
    let response = handler.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_of(response).await, "Service unavailable");
}

#[tokio::test]
async fn test_served_requests_carry_client_address() {
    let mut upstream = mockito::Server::new_async().await;
    let _probe = upstream.mock("GET", "/").with_status(200).create_async().await;
    let echo = upstream
        .mock("GET", "/echo")
        .match_header("x-forwarded-for", "127.0.0.1")
        .match_header("host", upstream.host_with_port().as_str())
        .with_status(202)
        .with_body("seen")
        .create_async()
        .await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(accept_loop(listener, handler(&[upstream.url()]), async move {
        let _ = stop_rx.await;
    }));

    let client = Client::new();
    let uri = format!("http://{}/echo", addr).parse().unwrap();
    let response = client.get(uri).await.unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(body_of(response).await, "seen");
    echo.assert_async().await;

    stop_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}
