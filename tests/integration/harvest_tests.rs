//! Integration tests for the harvest pipeline
//!
//! These tests use wiremock to stand in for the catalog site and run the
//! full plan, fetch and persist cycle end-to-end.

use catalog_harvest::config::{FetcherConfig, FileConfig, RunConfig, RunMode, ShardConfig, SourceConfig};
use catalog_harvest::crawler::run_harvest;
use catalog_harvest::storage::{load_manifest, manifest_path, CheckpointStore, CsvCheckpointStore};
use catalog_harvest::{ConfigError, HarvestError, PersistenceError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{any, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates file-level settings pointing at the mock server
fn file_config(origin: &str) -> FileConfig {
    FileConfig {
        source: SourceConfig {
            origin: origin.to_string(),
            ..SourceConfig::default()
        },
        fetcher: FetcherConfig {
            workers: 2,
            timeout_secs: 5,
            connect_timeout_secs: 2,
            ..FetcherConfig::default()
        },
        ..FileConfig::default()
    }
}

fn pages_config(origin: &str, output: &Path, end: u32, shard: ShardConfig) -> RunConfig {
    RunConfig::new(
        RunMode::Pages {
            page_start: 1,
            page_end: end,
        },
        shard,
        output.to_path_buf(),
        file_config(origin),
    )
}

fn images_config(origin: &str, input: &Path, output: &Path) -> RunConfig {
    RunConfig::new(
        RunMode::Images {
            input_file: input.to_path_buf(),
            id_column: "chapter_url".to_string(),
        },
        ShardConfig::default(),
        output.to_path_buf(),
        file_config(origin),
    )
}

/// A list page with two entries
fn list_html(page: u32) -> String {
    format!(
        r#"<html><body>
        <p><span class="tiptip fs-12 ellipsis" data-tiptip="tip-{page}-a"><a href="/m{page}a">Manga {page}A</a></span>
           <span class="fs-12">{page}</span><span class="fs-12">100</span><span class="fs-12">1</span></p>
        <p><span class="tiptip fs-12 ellipsis" data-tiptip="tip-{page}-b"><a href="/m{page}b">Manga {page}B</a></span>
           <span class="fs-12">2</span></p>
        <div id="tip-{page}-a"><img src="https://cdn.test/{page}a.jpg"/>Story {page}A</div>
        </body></html>"#,
        page = page
    )
}

/// A chapter page with `images` images
fn chapter_html(images: usize) -> String {
    let imgs: String = (1..=images)
        .map(|i| format!(r#"<img src="https://cdn.test/img/{}.jpg"/>"#, i))
        .collect();
    format!(r#"<html><body><article id="content">{}</article></body></html>"#, imgs)
}

async fn mount_list_page(server: &MockServer, page: u32, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/ajax/Search/AjaxLoadListManga"))
        .and(query_param("p", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(list_html(page)))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn store_keys(output: &Path, key_column: &str) -> Vec<String> {
    CsvCheckpointStore::new(output, key_column)
        .load()
        .unwrap()
        .map(|s| s.keys().map(|k| k.to_string()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_pages_harvest_and_resume() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("list.csv");

    // First run: page 2 is down
    {
        let server = MockServer::start().await;
        mount_list_page(&server, 1, 1).await;
        mount_list_page(&server, 3, 1).await;
        Mock::given(method("GET"))
            .and(query_param("p", "2"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let summary = run_harvest(pages_config(&server.uri(), &output, 3, ShardConfig::default()))
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.records_written, 4);
        assert_eq!(store_keys(&output, "page"), vec!["1", "1", "3", "3"]);
    }

    // Second run: only page 2 is requested
    {
        let server = MockServer::start().await;
        mount_list_page(&server, 1, 0).await;
        mount_list_page(&server, 2, 1).await;
        mount_list_page(&server, 3, 0).await;

        let summary = run_harvest(pages_config(&server.uri(), &output, 3, ShardConfig::default()))
            .await
            .unwrap();

        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.succeeded, 1);
        assert!(summary.is_complete());
    }

    let content = std::fs::read_to_string(&output).unwrap();
    let mut lines = content.lines();
    assert_eq!(
        lines.next(),
        Some("page,title,url,chapters,views,comments,cover_image_url,description")
    );
    assert_eq!(
        lines.next(),
        Some("1,Manga 1A,/m1a,1,100,1,https://cdn.test/1a.jpg,Story 1A")
    );
    assert_eq!(
        lines.next(),
        Some("1,Manga 1B,/m1b,2,N/A,N/A,No Image,No Description")
    );
    assert_eq!(store_keys(&output, "page"), vec!["1", "1", "3", "3", "2", "2"]);
    assert!(manifest_path(&output).exists());
}

#[tokio::test]
async fn test_images_resume_skips_existing_chapter() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("list.csv");
    let output = dir.path().join("images.csv");

    std::fs::write(
        &input,
        format!(
            "title,chapter_url\nA,/ch-41\nB,{}/ch-42\nC,ch-43\nA again,ch-41/\n",
            server.uri()
        ),
    )
    .unwrap();

    let mut existing = String::from("chapter_url,image_n,image_url\n");
    for i in 1..=10 {
        existing.push_str(&format!("ch-42,{},https://cdn.test/old/{}.jpg\n", i, i));
    }
    std::fs::write(&output, &existing).unwrap();

    Mock::given(method("GET"))
        .and(path("/ch-42"))
        .respond_with(ResponseTemplate::new(200).set_body_string(chapter_html(3)))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ch-41"))
        .respond_with(ResponseTemplate::new(200).set_body_string(chapter_html(2)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ch-43"))
        .respond_with(ResponseTemplate::new(200).set_body_string(chapter_html(1)))
        .expect(1)
        .mount(&server)
        .await;

    let summary = run_harvest(images_config(&server.uri(), &input, &output))
        .await
        .unwrap();

    assert_eq!(summary.shard_units, 3);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.records_written, 3);
    assert_eq!(summary.total_records, 13);

    let content = std::fs::read_to_string(&output).unwrap();
    assert!(content.starts_with(&existing));
    assert!(content.ends_with(
        "ch-41,1,https://cdn.test/img/1.jpg\nch-41,2,https://cdn.test/img/2.jpg\nch-43,1,https://cdn.test/img/1.jpg\n"
    ));
}

#[tokio::test]
async fn test_failures_are_isolated() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("list.csv");
    let output = dir.path().join("images.csv");
    std::fs::write(&input, "chapter_url\nok-1\nmissing\nempty\nok-2\nremoved\n").unwrap();

    Mock::given(path("/ok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(chapter_html(2)))
        .mount(&server)
        .await;
    Mock::given(path("/ok-2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(chapter_html(1)))
        .mount(&server)
        .await;
    Mock::given(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(path("/empty"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"<article id="content"></article>"#),
        )
        .mount(&server)
        .await;
    Mock::given(path("/removed"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>This chapter was removed</p>"))
        .mount(&server)
        .await;

    let summary = run_harvest(images_config(&server.uri(), &input, &output))
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.empty, 1);
    assert_eq!(summary.failed, 2);

    let failed: HashSet<&str> = summary.failures.iter().map(|f| f.key.as_str()).collect();
    assert_eq!(failed, HashSet::from(["missing", "removed"]));
    assert_eq!(
        store_keys(&output, "chapter_url"),
        vec!["ok-1", "ok-1", "ok-2"]
    );
}

#[tokio::test]
async fn test_all_failed_on_empty_store_creates_nothing() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out/list.csv");

    Mock::given(any())
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = run_harvest(pages_config(&server.uri(), &output, 4, ShardConfig::default())).await;

    assert!(matches!(
        result,
        Err(HarvestError::Persistence(
            PersistenceError::NothingToPersist { .. }
        ))
    ));
    assert!(!output.exists());
    assert!(!manifest_path(&output).exists());
}

#[tokio::test]
async fn test_rerun_is_byte_identical() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("list.csv");

    for page in 1..=3 {
        mount_list_page(&server, page, 1).await;
    }

    let config = pages_config(&server.uri(), &output, 3, ShardConfig::default());
    run_harvest(config.clone()).await.unwrap();
    let store_before = std::fs::read(&output).unwrap();
    let manifest_before = std::fs::read(manifest_path(&output)).unwrap();

    let summary = run_harvest(config).await.unwrap();

    assert_eq!(summary.pending, 0);
    assert!(!summary.store_written);
    assert_eq!(std::fs::read(&output).unwrap(), store_before);
    assert_eq!(std::fs::read(manifest_path(&output)).unwrap(), manifest_before);
}

#[tokio::test]
async fn test_nodes_cover_all_pages_exactly_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    for page in 1..=5 {
        mount_list_page(&server, page, 1).await;
    }

    let mut outputs: Vec<PathBuf> = Vec::new();
    for node_id in 0..2 {
        let output = dir.path().join(format!("list-{}.csv", node_id));
        let shard = ShardConfig {
            num_nodes: 2,
            node_id,
        };
        run_harvest(pages_config(&server.uri(), &output, 5, shard))
            .await
            .unwrap();
        outputs.push(output);
    }

    let node0: HashSet<String> = store_keys(&outputs[0], "page").into_iter().collect();
    let node1: HashSet<String> = store_keys(&outputs[1], "page").into_iter().collect();

    assert_eq!(node0, HashSet::from(["1", "2", "3"].map(String::from)));
    assert_eq!(node1, HashSet::from(["4", "5"].map(String::from)));

    let manifest = load_manifest(&outputs[1]).unwrap().unwrap();
    assert_eq!(manifest.num_nodes, 2);
    assert_eq!(manifest.node_id, 1);
    assert_eq!(manifest.unit_count, 5);
}

#[tokio::test]
async fn test_missing_input_file_fails_before_fetching() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = run_harvest(images_config(
        &server.uri(),
        &dir.path().join("nope.csv"),
        &dir.path().join("images.csv"),
    ))
    .await;

    assert!(matches!(
        result,
        Err(HarvestError::Config(ConfigError::UnitSource { .. }))
    ));
}
