//! The HTTP surface. Implements the per-request state machine: route
//! match, catalog existence, query-parameter presence, conditional GET,
//! then gzip-aware streaming.

use std::io::{Read as _, Seek as _, SeekFrom};

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use catalog_core::Section;
use flate2::read::GzEncoder;
use flate2::Compression;
use serde::Deserialize;
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
pub(crate) struct QueryParams {
    #[serde(default)]
    pub schema: String,
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub name: String,
}

impl QueryParams {
    fn all_empty(&self) -> bool {
        self.schema.is_empty() && self.package.is_empty() && self.name.is_empty()
    }
}

pub(crate) async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// `GET {prefix}/{catalog}/api/v1/all`
pub(crate) async fn get_all(
    State(state): State<AppState>,
    Path(catalog): Path<String>,
) -> Result<Response, AppError> {
    let _guard = state.store.read_guard().await;
    if !state.store.content_exists(&catalog).await {
        return Err(AppError::not_found("Catalog not found"));
    }

    let body = tokio::fs::read(state.store.blob_path(&catalog)).await?;
    Ok(respond_jsonl(body, None, &HeaderMap::new(), state.gzip_threshold_bytes))
}

/// `GET {prefix}/{catalog}/api/v1/query?schema=&package=&name=`
pub(crate) async fn get_query(
    State(state): State<AppState>,
    Path(catalog): Path<String>,
    Query(params): Query<QueryParams>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let _guard = state.store.read_guard().await;
    if !state.store.content_exists(&catalog).await {
        return Err(AppError::not_found("Catalog not found"));
    }

    if params.all_empty() {
        let body = tokio::fs::read(state.store.blob_path(&catalog)).await?;
        return Ok(respond_jsonl(body, None, &headers, state.gzip_threshold_bytes));
    }

    let blob_path = state.store.blob_path(&catalog);
    let mtime = tokio::fs::metadata(&blob_path).await?.modified()?;
    let last_modified = httpdate::fmt_http_date(mtime);

    if let Some(since) = headers.get(header::IF_MODIFIED_SINCE).and_then(|v| v.to_str().ok()) {
        if since == last_modified {
            return Ok((StatusCode::NOT_MODIFIED, ()).into_response());
        }
    }

    let index = state.index_loader.load(&state.store, &catalog).await?;
    let plan = catalog_core::plan(&index, &params.schema, &params.package, &params.name);

    debug!(catalog, sections = plan.len(), "query planned");
    let body = read_sections(&blob_path, &plan).await?;
    Ok(respond_jsonl(
        body,
        Some(last_modified),
        &headers,
        state.gzip_threshold_bytes,
    ))
}

pub(crate) async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "404 page not found")
}

async fn read_sections(blob_path: &std::path::Path, plan: &[Section]) -> Result<Vec<u8>, AppError> {
    let path = blob_path.to_path_buf();
    let sections = plan.to_vec();
    tokio::task::spawn_blocking(move || -> std::io::Result<Vec<u8>> {
        let mut file = std::fs::File::open(&path)?;
        let mut out = Vec::new();
        for section in &sections {
            file.seek(SeekFrom::Start(section.offset))?;
            let mut buf = vec![0u8; section.length as usize];
            file.read_exact(&mut buf)?;
            out.extend_from_slice(&buf);
        }
        Ok(out)
    })
    .await
    .map_err(|e| AppError::internal(e.to_string()))?
    .map_err(AppError::from)
}

fn respond_jsonl(body: Vec<u8>, last_modified: Option<String>, headers: &HeaderMap, gzip_threshold: usize) -> Response {
    let accepts_gzip = headers
        .get(header::ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("gzip"))
        .unwrap_or(false);

    let (body, gzip) = if accepts_gzip && body.len() > gzip_threshold {
        (gzip_compress(&body), true)
    } else {
        (body, false)
    };

    let mut response = (StatusCode::OK, body).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, "application/jsonl".parse().unwrap());
    if gzip {
        response
            .headers_mut()
            .insert(header::CONTENT_ENCODING, "gzip".parse().unwrap());
    }
    if let Some(last_modified) = last_modified {
        response
            .headers_mut()
            .insert(header::LAST_MODIFIED, last_modified.parse().unwrap());
    }
    response
}

fn gzip_compress(body: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(body, Compression::default());
    let mut out = Vec::new();
    encoder.read_to_end(&mut out).expect("in-memory gzip encoding cannot fail");
    out
}
