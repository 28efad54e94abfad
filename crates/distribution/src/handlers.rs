use std::sync::Arc;

use axum::body::Bytes as AxumBytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use artifact::range::{parse_range_header, RangeStream};
use artifact::ArtifactService;
use shared::{RepositoryId, StorageId};

use crate::error::{DistributionError, DistributionResult};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ArtifactService>,
}

pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// `application/xml` has no dedicated `mime` crate constant (only `TEXT_XML` does), so it is
/// built from its components rather than reached for as a string literal.
fn application_xml() -> mime::Mime {
    "application/xml".parse().expect("static mime string")
}

fn content_type_for(path: &str) -> mime::Mime {
    if artifact::coordinates::is_checksum(path) {
        mime::TEXT_PLAIN
    } else if artifact::coordinates::is_metadata(path) {
        application_xml()
    } else {
        mime::APPLICATION_OCTET_STREAM
    }
}

fn parse_ids(storage: &str, repo: &str) -> DistributionResult<(StorageId, RepositoryId)> {
    let storage_id = StorageId::new(storage).map_err(|e| DistributionError::InvalidId(e.to_string()))?;
    let repo_id = RepositoryId::new(repo).map_err(|e| DistributionError::InvalidId(e.to_string()))?;
    Ok((storage_id, repo_id))
}

pub async fn upload(
    State(state): State<AppState>,
    Path((storage, repo, path)): Path<(String, String, String)>,
    body: AxumBytes,
) -> DistributionResult<Response> {
    let (storage_id, repo_id) = parse_ids(&storage, &repo)?;
    state.service.store(&storage_id, &repo_id, &path, body.into()).await?;
    Ok(StatusCode::OK.into_response())
}

pub async fn download(
    State(state): State<AppState>,
    Path((storage, repo, path)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> DistributionResult<Response> {
    let (storage_id, repo_id) = parse_ids(&storage, &repo)?;
    let content = state.service.resolve(&storage_id, &repo_id, &path).await?;

    let range = headers
        .get(axum::http::header::RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_range_header);

    let mut response_headers = HeaderMap::new();
    response_headers.insert(axum::http::header::ACCEPT_RANGES, "bytes".parse().unwrap());
    response_headers.insert(
        axum::http::header::CONTENT_TYPE,
        content_type_for(&path).as_ref().parse().unwrap(),
    );

    let repo_cfg = state.service.registry().repository(&storage_id, &repo_id).ok();
    if let Some(repo_cfg) = repo_cfg {
        if repo_cfg.checksum_headers_enabled {
            let digests = state.service.digests_for(&storage_id, &repo_id, &path).await;
            if let Some(md5) = digests.md5 {
                response_headers.insert("Checksum-MD5", md5.parse().unwrap());
            }
            if let Some(sha1) = digests.sha1 {
                response_headers.insert("Checksum-SHA1", sha1.parse().unwrap());
            }
        }
    }

    match range {
        None => Ok((StatusCode::OK, response_headers, content).into_response()),
        Some(range) => {
            let stream = RangeStream::new(content.len() as u64, range)?;
            response_headers.insert(
                axum::http::header::CONTENT_RANGE,
                stream.content_range_header().parse().unwrap(),
            );
            let body = stream.slice(&content).to_vec();
            Ok((StatusCode::PARTIAL_CONTENT, response_headers, body).into_response())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CopyParams {
    #[serde(rename = "srcStorageId")]
    pub src_storage_id: String,
    #[serde(rename = "srcRepositoryId")]
    pub src_repository_id: String,
    #[serde(rename = "destStorageId")]
    pub dest_storage_id: String,
    #[serde(rename = "destRepositoryId")]
    pub dest_repository_id: String,
}

pub async fn copy(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(params): Query<CopyParams>,
) -> DistributionResult<Response> {
    let (src_storage, src_repo) = parse_ids(&params.src_storage_id, &params.src_repository_id)?;
    let (dst_storage, dst_repo) = parse_ids(&params.dest_storage_id, &params.dest_repository_id)?;
    state
        .service
        .copy(&src_storage, &src_repo, &path, &dst_storage, &dst_repo)
        .await?;
    Ok(StatusCode::OK.into_response())
}

#[derive(Debug, Deserialize, Default)]
pub struct DeleteParams {
    #[serde(default)]
    pub force: bool,
}

pub async fn delete(
    State(state): State<AppState>,
    Path((storage, repo, path)): Path<(String, String, String)>,
    Query(params): Query<DeleteParams>,
) -> DistributionResult<Response> {
    let (storage_id, repo_id) = parse_ids(&storage, &repo)?;
    state.service.delete(&storage_id, &repo_id, &path, params.force).await?;
    Ok(StatusCode::OK.into_response())
}
