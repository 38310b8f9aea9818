//! End-to-end coverage of the HTTP surface against a locally bound server.

use std::sync::Arc;

use catalog_config::RuntimeConfig;
use catalog_store::CatalogStore;
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

async fn spawn_server(store_root: &std::path::Path) -> (String, tokio::task::JoinHandle<()>) {
    let mut config = RuntimeConfig::default();
    config.store.root_dir = store_root.to_string_lossy().to_string();
    config.server.listen_addr = "127.0.0.1:0".to_string();

    let store = Arc::new(
        CatalogStore::new(&config.store.root_dir, &config.store.base_url)
            .await
            .unwrap(),
    );
    let app = catalog_server::router(store, &config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base = format!("http://{addr}");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (base, handle)
}

fn write_sample_catalog(dir: &std::path::Path) {
    std::fs::write(
        dir.join("package.yaml"),
        "schema: olm.package\nname: webhook_operator_test\ndefaultChannel: preview_test\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("channel.yaml"),
        "schema: olm.channel\npackage: webhook_operator_test\nname: preview_test\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("bundle.yaml"),
        "schema: olm.bundle\npackage: webhook_operator_test\nname: bundle.v0.0.1\n",
    )
    .unwrap();
}

#[tokio::test]
async fn empty_store_returns_404() {
    let root = tempdir().unwrap();
    let (base, _handle) = spawn_server(root.path()).await;

    let resp = reqwest::get(format!("{base}/catalogs/x/api/v1/all")).await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn unmatched_path_under_prefix_returns_404() {
    let root = tempdir().unwrap();
    let (base, _handle) = spawn_server(root.path()).await;

    let resp = reqwest::get(format!("{base}/catalogs/x/y/z")).await.unwrap();
    assert_eq!(resp.status(), 404);
    assert_eq!(resp.text().await.unwrap(), "404 page not found");
}

#[tokio::test]
async fn healthz_is_always_ok() {
    let root = tempdir().unwrap();
    let (base, _handle) = spawn_server(root.path()).await;

    let resp = reqwest::get(format!("{base}/healthz")).await.unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn single_bundle_catalog_query_scenario() {
    let root = tempdir().unwrap();
    let input = tempdir().unwrap();
    write_sample_catalog(input.path());

    let store = CatalogStore::new(root.path(), "http://localhost/catalogs")
        .await
        .unwrap();
    store
        .store(CancellationToken::new(), "test-catalog", input.path())
        .await
        .unwrap();
    drop(store);

    let (base, _handle) = spawn_server(root.path()).await;

    let resp = reqwest::get(format!(
        "{base}/catalogs/test-catalog/api/v1/query?schema=olm.package"
    ))
    .await
    .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.text().await.unwrap(),
        "{\"defaultChannel\":\"preview_test\",\"name\":\"webhook_operator_test\",\"schema\":\"olm.package\"}\n"
    );

    let resp = reqwest::get(format!(
        "{base}/catalogs/test-catalog/api/v1/query?package=webhook_operator_test&name=bundle.v0.0.1"
    ))
    .await
    .unwrap();
    assert_eq!(resp.status(), 200);
    let body = resp.text().await.unwrap();
    assert!(body.contains("bundle.v0.0.1"));
}

#[tokio::test]
async fn query_with_no_params_matches_all_byte_for_byte() {
    let root = tempdir().unwrap();
    let input = tempdir().unwrap();
    write_sample_catalog(input.path());

    let store = CatalogStore::new(root.path(), "http://localhost/catalogs")
        .await
        .unwrap();
    store
        .store(CancellationToken::new(), "c", input.path())
        .await
        .unwrap();
    drop(store);

    let (base, _handle) = spawn_server(root.path()).await;

    let all = reqwest::get(format!("{base}/catalogs/c/api/v1/all"))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    let query = reqwest::get(format!("{base}/catalogs/c/api/v1/query"))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(all, query);
}

#[tokio::test]
async fn if_modified_since_round_trip_returns_304() {
    let root = tempdir().unwrap();
    let input = tempdir().unwrap();
    write_sample_catalog(input.path());

    let store = CatalogStore::new(root.path(), "http://localhost/catalogs")
        .await
        .unwrap();
    store
        .store(CancellationToken::new(), "c", input.path())
        .await
        .unwrap();
    drop(store);

    let (base, _handle) = spawn_server(root.path()).await;
    let client = reqwest::Client::new();

    let first = client
        .get(format!("{base}/catalogs/c/api/v1/query?schema=olm.package"))
        .send()
        .await
        .unwrap();
    let last_modified = first
        .headers()
        .get(reqwest::header::LAST_MODIFIED)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    let second = client
        .get(format!("{base}/catalogs/c/api/v1/query?schema=olm.package"))
        .header(reqwest::header::IF_MODIFIED_SINCE, &last_modified)
        .send()
        .await
        .unwrap();

    assert_eq!(second.status(), 304);
    assert_eq!(second.bytes().await.unwrap().len(), 0);
}

#[tokio::test]
async fn gzip_only_applied_above_threshold() {
    let root = tempdir().unwrap();
    let input = tempdir().unwrap();
    write_sample_catalog(input.path());

    let store = CatalogStore::new(root.path(), "http://localhost/catalogs")
        .await
        .unwrap();
    store
        .store(CancellationToken::new(), "c", input.path())
        .await
        .unwrap();
    drop(store);

    let (base, _handle) = spawn_server(root.path()).await;
    let client = reqwest::Client::new();

    // The sample catalog's blob file is well under the 1400-byte threshold,
    // so even with Accept-Encoding: gzip the response must be uncompressed.
    let resp = client
        .get(format!("{base}/catalogs/c/api/v1/all"))
        .header(reqwest::header::ACCEPT_ENCODING, "gzip")
        .send()
        .await
        .unwrap();
    assert!(resp.headers().get(reqwest::header::CONTENT_ENCODING).is_none());
}
