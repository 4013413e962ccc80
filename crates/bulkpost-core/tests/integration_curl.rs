//! Integration test: libcurl transport against a local POST server.

mod common;

use std::time::Duration;

use bulkpost_core::batch::BatchCoordinator;
use bulkpost_core::codec::RawJsonCodec;
use bulkpost_core::dispatcher::{DispatchConfig, Dispatcher, WorkerPool};
use bulkpost_core::model::{Resolution, WorkItem};
use bulkpost_core::retry::{ItemError, RetryPolicy, TransportError};
use bulkpost_core::transport::{CurlTransport, RequestTemplate};

fn dispatcher(url: &str, max_retries: u32) -> Dispatcher<CurlTransport, RawJsonCodec> {
    let request = RequestTemplate::new(url)
        .with_timeouts(Duration::from_secs(5), Duration::from_secs(2))
        .with_header("X-Test", "1");
    let config = DispatchConfig::new(request)
        .with_concurrency(2)
        .with_retry(RetryPolicy::new(max_retries, Duration::from_millis(10)));
    Dispatcher::new(config, CurlTransport::new(), RawJsonCodec, WorkerPool::new(2).unwrap())
}

#[tokio::test]
async fn service_unavailable_then_ok_succeeds_on_retry() {
    let server = common::post_server::start(vec![503, 200]);
    let d = dispatcher(&server.url, 3);
    let r = d
        .submit(WorkItem::new("a", "{\"hello\":\"world\"}".to_string()))
        .unwrap()
        .await
        .unwrap();
    assert!(r.success());
    assert_eq!(r.attempts, 2);
    assert_eq!(r.body(), Some(&serde_json::json!({"status": 200})));
    assert_eq!(server.bodies(), vec!["{\"hello\":\"world\"}"; 2]);
    d.shutdown().await;
}

#[tokio::test]
async fn json_and_extra_headers_reach_the_wire() {
    let server = common::post_server::start(vec![200]);
    let d = dispatcher(&server.url, 0);
    d.submit(WorkItem::new("a", "{\"k\":1}".to_string()))
        .unwrap()
        .await
        .unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.request_line, "POST /ingest HTTP/1.1");
    assert_eq!(req.header("Content-Type"), Some("application/json"));
    assert_eq!(req.header("Accept"), Some("application/json"));
    assert_eq!(req.header("X-Test"), Some("1"));
    assert_eq!(req.header("Content-Length"), Some("7"));
    assert!(req.header("Expect").is_none());
    assert_eq!(req.body, "{\"k\":1}");
    d.shutdown().await;
}

#[tokio::test]
async fn batch_against_local_server_posts_every_line() {
    let server = common::post_server::start(vec![200]);
    let d = dispatcher(&server.url, 0);
    let items = WorkItem::numbered("n", (0..5).map(|i| format!("{{\"i\":{i}}}")));
    let report = BatchCoordinator::new(&d).run(items, 2).await.unwrap();
    assert_eq!(report.succeeded, 5);
    let mut bodies = server.bodies();
    bodies.sort();
    assert_eq!(bodies.len(), 5);
    assert_eq!(bodies[0], "{\"i\":0}");
    d.shutdown().await;
}

#[tokio::test]
async fn connection_refused_is_retried_then_exhausted() {
    let d = dispatcher(&common::post_server::refused_url(), 1);
    let r = d
        .submit(WorkItem::new("a", "{}".to_string()))
        .unwrap()
        .await
        .unwrap();
    assert_eq!(r.attempts, 2);
    match r.resolution {
        Resolution::Exhausted(ItemError::RetriesExhausted { last, .. }) => {
            assert!(matches!(*last, ItemError::Transport(TransportError::Connection(_))));
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
    d.shutdown().await;
}
