use std::net::TcpListener as StdTcpListener;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use file_reconstruction::{EncodingProfile, FileReader};
use ledger_client::test_utils::{self, MemoryLedger};
use tokio::sync::oneshot;
use upfile_server::{HealthState, Server};

const TAG: &str = "upfile ";

/// Server bound to an ephemeral local port, torn down on drop.
struct TestServer {
    endpoint: String,
    health: HealthState,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestServer {
    async fn start(ledger: Arc<MemoryLedger>) -> Self {
        let port = find_available_port();
        let health = HealthState::new();
        let reader = FileReader::new(ledger, EncodingProfile::upfile());
        let server = Server::new(reader, health.clone(), "127.0.0.1", port);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        tokio::spawn(async move {
            server.run_until_stopped(shutdown_rx).await.unwrap();
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        Self {
            endpoint: format!("http://127.0.0.1:{port}"),
            health,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.endpoint)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn find_available_port() -> u16 {
    let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn record_id(n: u64) -> String {
    format!("{n:064x}")
}

fn test_data(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn publish_chunked(ledger: &MemoryLedger, root_id: &str, data: &[u8], chunk_size: u64, mime: &str) {
    let mut chunks = Vec::new();
    for (i, piece) in data.chunks(chunk_size as usize).enumerate() {
        let id = record_id(0xc000 + i as u64);
        if i % 2 == 1 {
            // Exercise compound references with an explicit output index.
            ledger.insert(test_utils::record(
                &id,
                vec![
                    test_utils::data_output(0, b"decoy", None),
                    test_utils::data_output(1, piece, Some(TAG)),
                ],
            ));
            chunks.push(format!("{id}:1"));
        } else {
            ledger.insert(test_utils::record(&id, vec![test_utils::data_output(0, piece, None)]));
            chunks.push(id);
        }
    }
    let header = serde_json::json!({
        "filename": "payload.bin",
        "mime": mime,
        "size": data.len(),
        "chuncksize": chunk_size,
        "chunks": chunks,
    });
    ledger.insert(test_utils::record(
        root_id,
        vec![test_utils::data_output(0, header.to_string().as_bytes(), Some(TAG))],
    ));
}

fn publish_single(ledger: &MemoryLedger, root_id: &str, data: &[u8]) {
    let header = serde_json::json!({
        "filename": "note.txt",
        "mime": "text/plain",
        "size": data.len(),
        "data": BASE64.encode(data),
    });
    ledger.insert(test_utils::record(
        root_id,
        vec![test_utils::data_output(0, header.to_string().as_bytes(), Some(TAG))],
    ));
}

#[tokio::test]
async fn serves_the_full_file_without_a_range() {
    let ledger = Arc::new(MemoryLedger::new());
    let id = record_id(1);
    let data = test_data(1000);
    publish_chunked(&ledger, &id, &data, 100, "video/mp4");
    let server = TestServer::start(ledger).await;

    let response = reqwest::get(server.url(&id)).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "video/mp4");
    assert_eq!(response.headers()["content-length"], "1000");
    assert_eq!(response.headers()["accept-ranges"], "bytes");
    assert_eq!(response.bytes().await.unwrap().as_ref(), data);
}

#[tokio::test]
async fn serves_a_bounded_range() {
    let ledger = Arc::new(MemoryLedger::new());
    let id = record_id(2);
    let data = test_data(1000);
    publish_chunked(&ledger, &id, &data, 100, "application/pdf");
    let server = TestServer::start(ledger).await;

    let response = reqwest::Client::new()
        .get(server.url(&id))
        .header("Range", "bytes=100-200")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.headers()["content-range"], "bytes 100-200/1000");
    assert_eq!(response.headers()["content-length"], "101");
    assert_eq!(response.headers()["cache-control"], "no-cache");
    assert_eq!(response.bytes().await.unwrap().as_ref(), &data[100..=200]);
}

#[tokio::test]
async fn serves_suffix_and_open_ended_ranges() {
    let ledger = Arc::new(MemoryLedger::new());
    let id = record_id(3);
    let data = test_data(1000);
    publish_chunked(&ledger, &id, &data, 100, "application/octet-stream");
    let server = TestServer::start(ledger).await;
    let client = reqwest::Client::new();

    let suffix = client
        .get(server.url(&id))
        .header("Range", "bytes=-200")
        .send()
        .await
        .unwrap();
    assert_eq!(suffix.status(), reqwest::StatusCode::PARTIAL_CONTENT);
    assert_eq!(suffix.headers()["content-range"], "bytes 800-999/1000");
    assert_eq!(suffix.bytes().await.unwrap().as_ref(), &data[800..]);

    let open = client
        .get(server.url(&id))
        .header("Range", "bytes=100-")
        .send()
        .await
        .unwrap();
    assert_eq!(open.status(), reqwest::StatusCode::PARTIAL_CONTENT);
    assert_eq!(open.headers()["content-range"], "bytes 100-999/1000");
    assert_eq!(open.bytes().await.unwrap().as_ref(), &data[100..]);
}

#[tokio::test]
async fn degenerate_single_byte_range_has_no_body() {
    let ledger = Arc::new(MemoryLedger::new());
    let id = record_id(4);
    publish_chunked(&ledger, &id, &test_data(1000), 100, "application/octet-stream");
    let server = TestServer::start(ledger).await;

    let response = reqwest::Client::new()
        .get(server.url(&id))
        .header("Range", "bytes=0-0")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.headers()["content-range"], "bytes 0-0/1000");
    assert_eq!(response.headers()["content-length"], "0");
    assert!(response.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn out_of_bounds_range_is_unsatisfiable() {
    let ledger = Arc::new(MemoryLedger::new());
    let id = record_id(5);
    publish_chunked(&ledger, &id, &test_data(1000), 100, "application/octet-stream");
    let server = TestServer::start(ledger).await;

    let response = reqwest::Client::new()
        .get(server.url(&id))
        .header("Range", "bytes=1500-1600")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(response.headers()["content-range"], "bytes */1000");
}

#[tokio::test]
async fn range_spanning_chunk_boundary_stitches_in_order() {
    let ledger = Arc::new(MemoryLedger::new());
    let id = record_id(6);
    // Chunk lengths [10, 10, 4].
    let data = test_data(24);
    publish_chunked(&ledger, &id, &data, 10, "application/octet-stream");
    let server = TestServer::start(ledger).await;

    let response = reqwest::Client::new()
        .get(server.url(&id))
        .header("Range", "bytes=15-20")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.headers()["content-range"], "bytes 15-20/24");
    assert_eq!(response.bytes().await.unwrap().as_ref(), &data[15..=20]);
}

#[tokio::test]
async fn serves_inline_single_record_files() {
    let ledger = Arc::new(MemoryLedger::new());
    let id = record_id(7);
    let data = test_data(64);
    publish_single(&ledger, &id, &data);
    let server = TestServer::start(ledger).await;
    let client = reqwest::Client::new();

    let full = client.get(server.url(&id)).send().await.unwrap();
    assert_eq!(full.status(), reqwest::StatusCode::OK);
    assert_eq!(full.headers()["content-type"], "text/plain");
    assert_eq!(full.bytes().await.unwrap().as_ref(), data);

    let partial = client
        .get(server.url(&id))
        .header("Range", "bytes=10-19")
        .send()
        .await
        .unwrap();
    assert_eq!(partial.status(), reqwest::StatusCode::PARTIAL_CONTENT);
    assert_eq!(partial.bytes().await.unwrap().as_ref(), &data[10..=19]);
}

#[tokio::test]
async fn extension_suffix_is_ignored_for_lookup() {
    let ledger = Arc::new(MemoryLedger::new());
    let id = record_id(8);
    let data = test_data(32);
    publish_single(&ledger, &id, &data);
    let server = TestServer::start(ledger).await;

    let response = reqwest::get(server.url(&format!("{id}.png"))).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.bytes().await.unwrap().as_ref(), data);
}

#[tokio::test]
async fn malformed_and_unknown_identifiers_are_not_found() {
    let ledger = Arc::new(MemoryLedger::new());
    let server = TestServer::start(ledger).await;
    let client = reqwest::Client::new();

    for key in ["not-hex", "abc123", &"z".repeat(64)] {
        let response = client.get(server.url(key)).send().await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND, "key {key}");
    }

    // Well-formed identifier that no record answers to.
    let response = client.get(server.url(&record_id(0xdead))).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn corrupt_header_record_is_not_found() {
    let ledger = Arc::new(MemoryLedger::new());
    let id = record_id(9);
    ledger.insert(test_utils::record(
        &id,
        vec![test_utils::data_output(0, b"not a json header", Some(TAG))],
    ));
    let server = TestServer::start(ledger).await;

    let response = reqwest::get(server.url(&id)).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rejects_non_get_methods() {
    let ledger = Arc::new(MemoryLedger::new());
    let id = record_id(10);
    publish_single(&ledger, &id, &test_data(8));
    let server = TestServer::start(ledger).await;

    let response = reqwest::Client::new().post(server.url(&id)).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()["allow"], "GET");
}

#[tokio::test]
async fn health_probes_reflect_readiness() {
    let ledger = Arc::new(MemoryLedger::new());
    let server = TestServer::start(ledger).await;
    let client = reqwest::Client::new();

    let liveness = client.get(server.url("liveness")).send().await.unwrap();
    assert_eq!(liveness.status(), reqwest::StatusCode::OK);

    let readiness = client.get(server.url("readiness")).send().await.unwrap();
    assert_eq!(readiness.status(), reqwest::StatusCode::OK);

    server.health.set_ready(false);
    let drained = client.get(server.url("readiness")).send().await.unwrap();
    assert_eq!(drained.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn missing_chunk_record_aborts_the_body() {
    let ledger = Arc::new(MemoryLedger::new());
    let id = record_id(11);
    let present = record_id(0xc100);
    let absent = record_id(0xc101);
    ledger.insert(test_utils::record(&present, vec![test_utils::data_output(0, &test_data(10), None)]));
    let header = serde_json::json!({
        "size": 20,
        "chuncksize": 10,
        "chunks": [present, absent],
    });
    ledger.insert(test_utils::record(
        &id,
        vec![test_utils::data_output(0, header.to_string().as_bytes(), Some(TAG))],
    ));
    let server = TestServer::start(ledger).await;

    // Headers are flushed before the failing chunk is reached; the body read
    // then fails at the transport level.
    let response = reqwest::get(server.url(&id)).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(response.bytes().await.is_err());
}
