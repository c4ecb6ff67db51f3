use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::http::{Method, StatusCode};
use sales_api::middleware::standard;
use sales_api::web::{App, Context, Phase, ServerError, ShutdownSignal, handler, serve};
use sales_config::WebConfig;
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};

/// An app whose `/slow` handler sleeps for `work` before answering.
fn slow_app(shutdown: &ShutdownSignal, work: Duration, in_flight: Arc<AtomicUsize>) -> App {
    let mut app = App::new(shutdown.clone(), standard());
    app.handle(
        Method::GET,
        "/slow",
        handler(move |ctx: Context, _req| {
            let in_flight = Arc::clone(&in_flight);
            async move {
                in_flight.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(work).await;
                ctx.respond(&json!({ "status": "done" }), StatusCode::OK)
            }
        }),
        &[],
    );
    app
}

fn config(shutdown_timeout: Duration) -> WebConfig {
    WebConfig {
        api_host: "127.0.0.1:0".to_string(),
        debug_host: "127.0.0.1:0".to_string(),
        read_timeout: Duration::from_secs(5),
        write_timeout: Duration::from_secs(30),
        idle_timeout: Duration::from_secs(120),
        shutdown_timeout,
    }
}

async fn wait_for(in_flight: &AtomicUsize, n: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while in_flight.load(Ordering::SeqCst) < n {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("requests never reached the handler");
}

async fn bind() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

#[tokio::test]
async fn test_in_flight_requests_finish_during_drain() {
    let shutdown = ShutdownSignal::new();
    let in_flight = Arc::new(AtomicUsize::new(0));
    let app = slow_app(&shutdown, Duration::from_millis(300), Arc::clone(&in_flight));
    let lifecycle = app.lifecycle().clone();

    let (listener, addr) = bind().await;
    let server = tokio::spawn(async move { serve(listener, app, &config(Duration::from_secs(5))).await });

    let client = reqwest::Client::new();
    let requests: Vec<_> = (0..3)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.get(format!("http://{addr}/slow")).send().await })
        })
        .collect();

    wait_for(&in_flight, 3).await;
    assert_eq!(lifecycle.phase(), Phase::Serving);
    shutdown.trigger("test drain");

    for request in requests {
        let response = request.await.unwrap().unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], "done");
    }

    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
    assert_eq!(lifecycle.phase(), Phase::Stopped);

    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_drain_gives_up_after_grace_period() {
    let shutdown = ShutdownSignal::new();
    let in_flight = Arc::new(AtomicUsize::new(0));
    let app = slow_app(&shutdown, Duration::from_secs(30), Arc::clone(&in_flight));
    let lifecycle = app.lifecycle().clone();

    let (listener, addr) = bind().await;
    let grace = Duration::from_millis(200);
    let server = tokio::spawn(async move { serve(listener, app, &config(grace)).await });

    let request = tokio::spawn(async move {
        reqwest::Client::new()
            .get(format!("http://{addr}/slow"))
            .send()
            .await
    });

    wait_for(&in_flight, 1).await;
    shutdown.trigger("test timeout");

    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(result, Err(ServerError::ShutdownTimeout(d)) if d == grace));
    assert_eq!(lifecycle.phase(), Phase::Stopped);

    // The abandoned request sees its connection closed rather than a reply.
    let outcome = tokio::time::timeout(Duration::from_secs(5), request)
        .await
        .unwrap()
        .unwrap();
    assert!(outcome.is_err());
}

#[tokio::test]
async fn test_idle_server_stops_immediately() {
    let shutdown = ShutdownSignal::new();
    let app = slow_app(&shutdown, Duration::ZERO, Arc::new(AtomicUsize::new(0)));
    let (listener, addr) = bind().await;
    let server = tokio::spawn(async move { serve(listener, app, &config(Duration::from_secs(5))).await });

    let response = reqwest::get(format!("http://{addr}/slow")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    shutdown.trigger("done");
    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}
