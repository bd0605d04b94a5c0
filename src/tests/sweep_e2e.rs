//! Full scheduled runs against a wiremock Elasticsearch.
//!
//! Each test wires the real HTTP connector, sweeper and scheduler together
//! and checks the requests the cluster actually received.

use std::{sync::Arc, time::Duration};

use serde_json::json;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, path_regex},
};

use crate::{
    observability::RecordingSink,
    retry::BackoffPolicy,
    scheduler::{ScheduleExit, Scheduler},
    store::ElasticsearchConnector,
    sweeper::{RunStatus, SweepPolicy, Sweeper},
};

fn fast_policy(max_retries: Option<u32>, max_elapsed: Option<Duration>) -> BackoffPolicy {
    BackoffPolicy {
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(10),
        multiplier: 2.0,
        jitter: 0.0,
        max_retries,
        max_elapsed,
    }
}

fn scheduler_for(uri: &str, prefixes: &[&str], keep: u32) -> (Scheduler, Arc<RecordingSink>) {
    let connector = ElasticsearchConnector::new(
        Url::parse(uri).unwrap(),
        Duration::from_secs(5),
        fast_policy(Some(1), None),
    );
    let sink = Arc::new(RecordingSink::default());
    let sweeper = Sweeper::new(
        SweepPolicy {
            prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
            keep,
            delete_pause: Duration::ZERO,
            dry_run: false,
        },
        sink.clone(),
    );
    let scheduler = Scheduler::new(
        Arc::new(connector),
        sweeper,
        sink.clone(),
        fast_policy(None, Some(Duration::from_millis(200))),
        Duration::ZERO,
    );
    (scheduler, sink)
}

async fn mount_cluster(server: &MockServer, indices: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cluster_name": "e2e",
            "version": { "number": "7.17.0" }
        })))
        .mount(server)
        .await;

    let listing: Vec<_> = indices.iter().map(|i| json!({ "index": i })).collect();
    Mock::given(method("GET"))
        .and(path("/_cat/indices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing))
        .mount(server)
        .await;
}

async fn mount_delete_ok(server: &MockServer) {
    Mock::given(method("DELETE"))
        .and(path_regex(r"^/[^/_][^/]*$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "acknowledged": true })))
        .mount(server)
        .await;
}

async fn deleted_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method == http::Method::DELETE)
        .map(|r| r.url.path().to_string())
        .collect()
}

#[tokio::test]
async fn test_run_once_deletes_oldest_per_prefix() {
    let server = MockServer::start().await;
    mount_cluster(
        &server,
        &[
            "metrics-2024.01.03",
            "logstash-2024.01.02",
            "logstash-2024.01.04",
            "metrics-2024.01.01",
            "logstash-2024.01.01",
            "logstash-2024.01.03",
            "metrics-2024.01.02",
            ".kibana",
        ],
    )
    .await;
    mount_delete_ok(&server).await;
    let (scheduler, sink) = scheduler_for(&server.uri(), &["logstash-", "metrics-"], 1);

    let exit = scheduler.run(CancellationToken::new()).await;

    assert_eq!(exit, ScheduleExit::RunOnce);
    assert_eq!(
        deleted_paths(&server).await,
        vec![
            "/logstash-2024.01.01",
            "/logstash-2024.01.02",
            "/metrics-2024.01.01",
        ]
    );
    let runs = sink.runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Ok);
    assert_eq!(runs[0].deleted, 3);
    assert_eq!(sink.deleted().len(), 3);
}

#[tokio::test]
async fn test_failed_delete_does_not_stop_batch() {
    let server = MockServer::start().await;
    mount_cluster(&server, &["a-1", "a-2", "a-3", "a-4", "a-5"]).await;
    Mock::given(method("DELETE"))
        .and(path("/a-2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("shard failure"))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_delete_ok(&server).await;
    let (scheduler, sink) = scheduler_for(&server.uri(), &["a-"], 1);

    let outcome = scheduler.run_once(&CancellationToken::new()).await;

    assert_eq!(outcome.status, RunStatus::Ok);
    assert_eq!(outcome.deleted, 2);
    assert_eq!(outcome.failed_deletions, 1);
    // a-2 is tried twice by the request retry, then skipped
    assert_eq!(
        deleted_paths(&server).await,
        vec!["/a-1", "/a-2", "/a-2", "/a-3"]
    );
    assert_eq!(sink.failed(), vec![("a-".to_string(), "a-2".to_string())]);
}

#[tokio::test]
async fn test_nothing_deleted_within_retention() {
    let server = MockServer::start().await;
    mount_cluster(&server, &["a-1", "a-2", "a-3"]).await;
    mount_delete_ok(&server).await;
    let (scheduler, sink) = scheduler_for(&server.uri(), &["a-"], 5);

    let outcome = scheduler.run_once(&CancellationToken::new()).await;

    assert_eq!(outcome.status, RunStatus::Ok);
    assert!(deleted_paths(&server).await.is_empty());
    assert!(sink.deleted().is_empty());
}

#[tokio::test]
async fn test_unreachable_cluster_is_a_failed_run() {
    // Bind and drop a listener to get a port nothing listens on
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let (scheduler, sink) = scheduler_for(&format!("http://{addr}"), &["a-"], 1);

    let exit = scheduler.run(CancellationToken::new()).await;

    assert_eq!(exit, ScheduleExit::RunOnce);
    let runs = sink.runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Failed);
}

#[tokio::test]
async fn test_forbidden_listing_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/_cat/indices"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .expect(1)
        .mount(&server)
        .await;
    let (scheduler, sink) = scheduler_for(&server.uri(), &["a-"], 1);

    let outcome = scheduler.run_once(&CancellationToken::new()).await;

    assert_eq!(outcome.status, RunStatus::Failed);
    assert_eq!(sink.runs()[0].status, RunStatus::Failed);
}
