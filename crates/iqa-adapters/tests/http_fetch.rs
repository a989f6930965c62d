//! Integration tests for the HTTP fetcher against a local server.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::cast_possible_truncation)]

use std::time::Duration;

use iqa_adapters::{FetchConfig, HttpFetcher};
use iqa_core::Fetcher;
use iqa_test_support::{png_bytes, StaticHttpServer, SyntheticImageBuilder};

fn fetcher(config: FetchConfig) -> HttpFetcher {
    HttpFetcher::new(&config).unwrap()
}

#[test]
fn test_fetch_writes_body() {
    let server = StaticHttpServer::start().unwrap();
    let body = png_bytes(&SyntheticImageBuilder::checkerboard(40, 40));
    server.serve("/orig.png", body.clone());
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("orig_1");

    let fetched = fetcher(FetchConfig::default())
        .fetch(&server.url("/orig.png"), &dest)
        .unwrap();

    assert!(fetched);
    assert_eq!(std::fs::read(&dest).unwrap(), body);
    assert_eq!(server.hits(), ["/orig.png"]);
}

#[test]
fn test_large_body_streamed_intact() {
    let server = StaticHttpServer::start().unwrap();
    let body: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    server.serve("/big", body.clone());
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("big");

    assert!(fetcher(FetchConfig::default())
        .fetch(&server.url("/big"), &dest)
        .unwrap());
    assert_eq!(std::fs::read(&dest).unwrap(), body);
}

#[test]
fn test_not_found_returns_false() {
    let server = StaticHttpServer::start().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("missing");

    let fetched = fetcher(FetchConfig::default())
        .fetch(&server.url("/missing.jpg"), &dest)
        .unwrap();

    assert!(!fetched);
    assert!(!dest.exists());
}

#[test]
fn test_server_error_returns_false() {
    let server = StaticHttpServer::start().unwrap();
    server.respond("/flaky.jpg", 503, b"try later".to_vec());
    let dir = tempfile::tempdir().unwrap();

    let fetched = fetcher(FetchConfig::default())
        .fetch(&server.url("/flaky.jpg"), &dir.path().join("flaky"))
        .unwrap();

    assert!(!fetched);
}

#[test]
fn test_unreachable_host_is_error() {
    // Bind then drop to find a port with nothing listening.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("nothing");

    let result = fetcher(FetchConfig::default())
        .fetch(&format!("http://127.0.0.1:{port}/a.jpg"), &dest);

    assert!(result.is_err());
    assert!(!dest.exists());
}

#[test]
fn test_stalled_response_times_out() {
    let server = StaticHttpServer::start().unwrap();
    server.stall("/slow.jpg", Duration::from_secs(5));
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("slow");
    let config = FetchConfig {
        timeout: Duration::from_millis(500),
        ..FetchConfig::default()
    };

    let started = std::time::Instant::now();
    let result = fetcher(config).fetch(&server.url("/slow.jpg"), &dest);

    assert!(result.is_err());
    assert!(started.elapsed() < Duration::from_secs(4));
    assert!(!dest.exists());
}

#[test]
fn test_oversized_body_rejected_and_removed() {
    let server = StaticHttpServer::start().unwrap();
    server.serve("/huge", vec![0u8; 50_000]);
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("huge");
    let config = FetchConfig {
        max_bytes: Some(10_000),
        ..FetchConfig::default()
    };

    let result = fetcher(config).fetch(&server.url("/huge"), &dest);

    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("10000 byte limit"));
    assert!(!dest.exists());
}
