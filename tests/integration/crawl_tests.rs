//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small hierarchy and run the full
//! crawl cycle end-to-end against a temporary mirror directory.

use precinct_mirror::config::{Config, CrawlerConfig, OutputConfig, RemoteConfig, UserAgentConfig};
use precinct_mirror::crawler::{Coordinator, NodeCompletion};
use ignore::WalkBuilder;
use precinct_mirror::{MirrorError, NodeOutcome, RegionKind};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing every endpoint at the mock server
fn create_test_config(server: &MockServer, mirror_root: &Path, max_retries: u32) -> Config {
    let base = server.uri();
    Config {
        crawler: CrawlerConfig {
            max_concurrent_fetches: 4,
            max_depth: 5,
            max_retries,
            initial_backoff_ms: 1,
            max_total_backoff_ms: None,
            request_timeout_secs: 5,
        },
        remote: RemoteConfig {
            area_local_url: format!("{}/regions/local/", base),
            area_overseas_url: format!("{}/regions/overseas/", base),
            precinct_url: format!("{}/regions/precinct/", base),
            record_url: format!("{}/er/", base),
            region_kind: RegionKind::Local,
            start_code: "0".to_string(),
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestMirror".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: Some("https://example.com/contact".to_string()),
        },
        output: OutputConfig {
            mirror_root: mirror_root.to_path_buf(),
        },
    }
}

fn listing(children: &[(&str, &str)]) -> ResponseTemplate {
    let regions: Vec<Value> = children
        .iter()
        .map(|(code, name)| json!({ "code": code, "name": name }))
        .collect();
    ResponseTemplate::new(200).set_body_json(json!({ "regions": regions }))
}

async fn mount(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Root "0" -> Region A "01" -> Province A "0101" (record)
async fn mount_small_tree(server: &MockServer) {
    mount(server, "/regions/local/0.json", listing(&[("01", "Region A")])).await;
    mount(server, "/regions/local/01.json", listing(&[("0101", "Province A")])).await;
    mount(
        server,
        "/regions/local/0101.json",
        ResponseTemplate::new(200).set_body_json(json!({ "totalReceived": 5 })),
    )
    .await;
}

async fn requests_to(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == route)
        .count()
}

fn read_json(path: &Path) -> Value {
    let bytes = std::fs::read(path).unwrap_or_else(|e| panic!("{}: {}", path.display(), e));
    serde_json::from_slice(&bytes).unwrap()
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Every file under `dir` with its contents
fn snapshot(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files: Vec<(PathBuf, Vec<u8>)> = WalkBuilder::new(dir)
        .standard_filters(false)
        .build()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().map_or(false, |t| t.is_file()))
        .map(|entry| {
            let contents = std::fs::read(entry.path()).unwrap();
            (entry.into_path(), contents)
        })
        .collect();
    files.sort();
    files
}

#[tokio::test]
async fn test_full_crawl_small_tree() {
    let server = MockServer::start().await;
    mount_small_tree(&server).await;
    let tmp = TempDir::new().unwrap();

    let stats = Coordinator::new(create_test_config(&server, tmp.path(), 2))
        .unwrap()
        .run()
        .await
        .unwrap();

    let root = tmp.path();
    let region = root.join("Region A");
    let province = region.join("Province A");

    assert_eq!(
        read_json(&root.join("_INFO.0.json"))["regions"][0]["code"],
        json!("01")
    );
    assert_eq!(
        read_json(&region.join("_INFO.01.json"))["regions"][0]["name"],
        json!("Province A")
    );
    assert_eq!(
        read_json(&province.join("RECORD.0101.json")),
        json!({ "totalReceived": 5 })
    );
    assert_eq!(file_names(&province), vec!["RECORD.0101.json"]);

    assert_eq!(stats.nodes_saved, 3);
    assert_eq!(stats.branches, 2);
    assert_eq!(stats.leaves, 1);
    assert_eq!(stats.requests, 3);
    assert!(stats.is_complete());
}

#[tokio::test]
async fn test_rerun_makes_no_requests() {
    let server = MockServer::start().await;
    mount_small_tree(&server).await;
    let tmp = TempDir::new().unwrap();

    Coordinator::new(create_test_config(&server, tmp.path(), 2))
        .unwrap()
        .run()
        .await
        .unwrap();
    let before = snapshot(tmp.path());
    server.reset().await;

    let stats = Coordinator::new(create_test_config(&server, tmp.path(), 2))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(stats.requests, 0);
    assert_eq!(stats.nodes_cached, 3);
    assert_eq!(stats.nodes_saved, 0);
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
    assert_eq!(snapshot(tmp.path()), before);
}

#[tokio::test]
async fn test_fresh_run_refetches_everything() {
    let server = MockServer::start().await;
    mount_small_tree(&server).await;
    let tmp = TempDir::new().unwrap();

    Coordinator::new(create_test_config(&server, tmp.path(), 2))
        .unwrap()
        .run()
        .await
        .unwrap();

    let stats = Coordinator::new(create_test_config(&server, tmp.path(), 2))
        .unwrap()
        .with_fresh(true)
        .run()
        .await
        .unwrap();

    assert_eq!(stats.nodes_saved, 3);
    assert_eq!(stats.nodes_cached, 0);
    assert_eq!(stats.requests, 3);
}

#[tokio::test]
async fn test_forbidden_writes_missing_sentinel() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/regions/local/0.json",
        listing(&[("01", "Region A"), ("02", "Region B")]),
    )
    .await;
    mount(
        &server,
        "/regions/local/01.json",
        ResponseTemplate::new(200).set_body_json(json!({ "totalReceived": 1 })),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/regions/local/02.json"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/regions/local/02\d+\.json$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;
    let tmp = TempDir::new().unwrap();

    let stats = Coordinator::new(create_test_config(&server, tmp.path(), 3))
        .unwrap()
        .run()
        .await
        .unwrap();

    let region_b = tmp.path().join("Region B");
    assert_eq!(file_names(&region_b), vec!["_MISSING.02.json"]);
    assert_eq!(read_json(&region_b.join("_MISSING.02.json")), json!({}));
    assert_eq!(stats.nodes_missing, 1);
    assert_eq!(stats.nodes_saved, 2);
    assert_eq!(stats.retries, 0);
    assert!(stats.is_complete());
}

#[tokio::test]
async fn test_missing_sentinel_is_not_refetched() {
    let server = MockServer::start().await;
    mount(&server, "/regions/local/0.json", listing(&[("02", "Region B")])).await;
    mount(&server, "/regions/local/02.json", ResponseTemplate::new(403)).await;
    let tmp = TempDir::new().unwrap();

    Coordinator::new(create_test_config(&server, tmp.path(), 3))
        .unwrap()
        .run()
        .await
        .unwrap();
    let stats = Coordinator::new(create_test_config(&server, tmp.path(), 3))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(requests_to(&server, "/regions/local/02.json").await, 1);
    assert_eq!(stats.requests, 0);
    assert_eq!(stats.nodes_cached, 2);
}

#[tokio::test]
async fn test_retry_exhaustion_leaves_no_artifact() {
    let server = MockServer::start().await;
    mount(&server, "/regions/local/0.json", listing(&[("01", "Region A")])).await;
    mount(&server, "/regions/local/01.json", ResponseTemplate::new(500)).await;
    let tmp = TempDir::new().unwrap();
    let max_retries = 3;

    let stats = Coordinator::new(create_test_config(&server, tmp.path(), max_retries))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(
        requests_to(&server, "/regions/local/01.json").await,
        1 + max_retries as usize
    );
    assert_eq!(stats.nodes_failed, 1);
    assert_eq!(stats.retries, max_retries as u64);
    assert!(!stats.is_complete());
    assert!(!tmp.path().join("Region A").exists());

    // The next run skips the root but tries the failed node again
    let stats = Coordinator::new(create_test_config(&server, tmp.path(), max_retries))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(requests_to(&server, "/regions/local/0.json").await, 1);
    assert_eq!(
        requests_to(&server, "/regions/local/01.json").await,
        2 * (1 + max_retries as usize)
    );
    assert_eq!(stats.nodes_cached, 1);
    assert_eq!(stats.nodes_failed, 1);
}

#[tokio::test]
async fn test_transient_failure_recovers_within_retries() {
    let server = MockServer::start().await;
    mount(&server, "/regions/local/0.json", listing(&[("01", "Region A")])).await;
    Mock::given(method("GET"))
        .and(path("/regions/local/01.json"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount(
        &server,
        "/regions/local/01.json",
        ResponseTemplate::new(200).set_body_json(json!({ "totalReceived": 2 })),
    )
    .await;
    let tmp = TempDir::new().unwrap();

    let stats = Coordinator::new(create_test_config(&server, tmp.path(), 5))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(stats.nodes_saved, 2);
    assert_eq!(stats.retries, 2);
    assert!(tmp.path().join("Region A").join("RECORD.01.json").exists());
}

#[tokio::test]
async fn test_concurrency_ceiling() {
    let server = MockServer::start().await;
    let codes: Vec<String> = (1..=12).map(|i| format!("{:02}", i)).collect();
    let children: Vec<(&str, &str)> = codes.iter().map(|c| (c.as_str(), c.as_str())).collect();
    mount(&server, "/regions/local/0.json", listing(&children)).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/regions/local/\d{2}\.json$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "totalReceived": 0 }))
                .set_delay(Duration::from_millis(100)),
        )
        .mount(&server)
        .await;
    let tmp = TempDir::new().unwrap();
    let mut config = create_test_config(&server, tmp.path(), 0);
    config.crawler.max_concurrent_fetches = 3;

    let stats = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(stats.nodes_saved, 13);
    assert!(stats.peak_in_flight <= 3, "peak was {}", stats.peak_in_flight);
    assert!(stats.peak_in_flight >= 2, "peak was {}", stats.peak_in_flight);
}

#[tokio::test]
async fn test_parent_finishes_after_all_descendants() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/regions/local/0.json",
        listing(&[("01", "Region A"), ("02", "Region B")]),
    )
    .await;
    mount(
        &server,
        "/regions/local/01.json",
        listing(&[("0101", "Province A"), ("0102", "Province B")]),
    )
    .await;
    mount(
        &server,
        "/regions/local/02.json",
        ResponseTemplate::new(200).set_body_json(json!({ "totalReceived": 1 })),
    )
    .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/regions/local/010\d\.json$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "totalReceived": 3 }))
                .set_delay(Duration::from_millis(50)),
        )
        .mount(&server)
        .await;
    let tmp = TempDir::new().unwrap();

    let completions: Arc<Mutex<Vec<NodeCompletion>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&completions);
    Coordinator::new(create_test_config(&server, tmp.path(), 0))
        .unwrap()
        .with_completion_callback(Arc::new(move |done: &NodeCompletion| {
            sink.lock().unwrap().push(done.clone());
        }))
        .run()
        .await
        .unwrap();

    let completions = completions.lock().unwrap();
    assert_eq!(completions.len(), 5);
    assert_eq!(completions.last().unwrap().code, "0");

    for parent in completions.iter() {
        for child in completions.iter() {
            if child.mirror_path != parent.mirror_path
                && child.mirror_path.starts_with(&parent.mirror_path)
            {
                assert!(
                    child.finished_at <= parent.finished_at,
                    "{} finished after its ancestor {}",
                    child.code,
                    parent.code
                );
            }
        }
    }
}

#[tokio::test]
async fn test_malformed_payload_is_soft_failure() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/regions/local/0.json",
        listing(&[("01", "Region A"), ("02", "Region B")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/regions/local/01.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>checking your browser</html>"))
        .expect(1)
        .mount(&server)
        .await;
    mount(
        &server,
        "/regions/local/02.json",
        ResponseTemplate::new(200).set_body_json(json!({ "totalReceived": 4 })),
    )
    .await;
    let tmp = TempDir::new().unwrap();

    let stats = Coordinator::new(create_test_config(&server, tmp.path(), 5))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(stats.nodes_failed, 1);
    assert_eq!(stats.retries, 0);
    assert!(!tmp.path().join("Region A").exists());
    assert!(tmp.path().join("Region B").join("RECORD.02.json").exists());
}

#[tokio::test]
async fn test_failed_sibling_does_not_stop_subtree() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/regions/local/0.json",
        listing(&[("01", "Region A"), ("02", "Region B")]),
    )
    .await;
    mount(&server, "/regions/local/01.json", ResponseTemplate::new(503)).await;
    mount(&server, "/regions/local/02.json", listing(&[("0201", "Province C")])).await;
    mount(&server, "/regions/local/0201.json", listing(&[("020101", "City D")])).await;
    mount(
        &server,
        "/regions/local/020101.json",
        ResponseTemplate::new(200).set_body_json(json!({ "totalReceived": 7 })),
    )
    .await;
    let tmp = TempDir::new().unwrap();

    let stats = Coordinator::new(create_test_config(&server, tmp.path(), 1))
        .unwrap()
        .run()
        .await
        .unwrap();

    let city = tmp
        .path()
        .join("Region B")
        .join("Province C")
        .join("City D");
    assert_eq!(read_json(&city.join("RECORD.020101.json")), json!({ "totalReceived": 7 }));
    assert_eq!(stats.nodes_failed, 1);
    assert_eq!(stats.nodes_saved, 4);
}

#[tokio::test]
async fn test_deep_levels_use_precinct_and_record_endpoints() {
    let server = MockServer::start().await;
    mount(&server, "/regions/local/0.json", listing(&[("14", "CAR")])).await;
    mount(&server, "/regions/local/14.json", listing(&[("1401", "Abra")])).await;
    mount(&server, "/regions/local/1401.json", listing(&[("140101", "Bangued")])).await;
    mount(
        &server,
        "/regions/local/140101.json",
        listing(&[("14010101", "Agtangao")]),
    )
    .await;
    mount(
        &server,
        "/regions/precinct/14/14010101.json",
        listing(&[("14010001", "Precinct 0001A")]),
    )
    .await;
    mount(
        &server,
        "/er/140/14010001.json",
        ResponseTemplate::new(200).set_body_json(json!({ "totalReceived": 180 })),
    )
    .await;
    let tmp = TempDir::new().unwrap();

    let stats = Coordinator::new(create_test_config(&server, tmp.path(), 0))
        .unwrap()
        .run()
        .await
        .unwrap();

    let precinct = tmp
        .path()
        .join("CAR")
        .join("Abra")
        .join("Bangued")
        .join("Agtangao")
        .join("Precinct 0001A");
    assert_eq!(
        read_json(&precinct.join("RECORD.14010001.json")),
        json!({ "totalReceived": 180 })
    );
    assert_eq!(stats.nodes_saved, 6);
    assert_eq!(stats.leaves, 1);
    assert!(stats.is_complete());
}

#[tokio::test]
async fn test_listing_at_depth_limit_is_not_descended() {
    let server = MockServer::start().await;
    mount_small_tree(&server).await;
    let tmp = TempDir::new().unwrap();
    let mut config = create_test_config(&server, tmp.path(), 0);
    config.crawler.max_depth = 1;

    let stats = Coordinator::new(config).unwrap().run().await.unwrap();

    assert!(tmp.path().join("Region A").join("_INFO.01.json").exists());
    assert!(!tmp.path().join("Region A").join("Province A").exists());
    assert_eq!(requests_to(&server, "/regions/local/0101.json").await, 0);
    assert_eq!(stats.nodes_saved, 2);
}

#[tokio::test]
async fn test_outcomes_reported_per_node() {
    let server = MockServer::start().await;
    mount_small_tree(&server).await;
    let tmp = TempDir::new().unwrap();

    let outcomes: Arc<Mutex<Vec<(String, NodeOutcome)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&outcomes);
    let coordinator = Coordinator::new(create_test_config(&server, tmp.path(), 0))
        .unwrap()
        .with_completion_callback(Arc::new(move |done: &NodeCompletion| {
            sink.lock().unwrap().push((done.code.clone(), done.outcome));
        }));

    coordinator.run().await.unwrap();
    coordinator.run().await.unwrap();

    let outcomes = outcomes.lock().unwrap();
    assert_eq!(
        *outcomes,
        vec![
            ("0101".to_string(), NodeOutcome::Saved),
            ("01".to_string(), NodeOutcome::Saved),
            ("0".to_string(), NodeOutcome::Saved),
            ("0101".to_string(), NodeOutcome::Cached),
            ("01".to_string(), NodeOutcome::Cached),
            ("0".to_string(), NodeOutcome::Cached),
        ]
    );
}

#[tokio::test]
async fn test_local_write_failure_ends_the_run() {
    let server = MockServer::start().await;
    mount_small_tree(&server).await;
    let tmp = TempDir::new().unwrap();
    // A regular file where the region directory has to go
    std::fs::write(tmp.path().join("Region A"), b"not a directory").unwrap();

    let result = Coordinator::new(create_test_config(&server, tmp.path(), 0))
        .unwrap()
        .run()
        .await;

    match result {
        Err(MirrorError::Io { path, .. }) => assert_eq!(path, tmp.path().join("Region A")),
        other => panic!("expected an io error, got {:?}", other),
    }
    assert_eq!(requests_to(&server, "/regions/local/0101.json").await, 0);
}

#[tokio::test]
async fn test_overseas_crawl_uses_overseas_listings() {
    let server = MockServer::start().await;
    mount(&server, "/regions/overseas/0.json", listing(&[("R9", "Asia")])).await;
    mount(
        &server,
        "/regions/overseas/R9.json",
        ResponseTemplate::new(200).set_body_json(json!({ "totalReceived": 12 })),
    )
    .await;
    let tmp = TempDir::new().unwrap();
    let mut config = create_test_config(&server, tmp.path(), 0);
    config.remote.region_kind = RegionKind::Overseas;

    let stats = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(
        read_json(&tmp.path().join("Asia").join("RECORD.R9.json")),
        json!({ "totalReceived": 12 })
    );
    assert!(tmp.path().join("_INFO.0.json").exists());
    assert_eq!(stats.nodes_saved, 2);
    assert_eq!(requests_to(&server, "/regions/local/0.json").await, 0);
}
