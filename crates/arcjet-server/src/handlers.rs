//! Request handlers.
//!
//! The index is untrusted storage: entries are checked for well-formed
//! derived fields but never verified here. Clients verify what they fetch.

use arcjet_core::Sha512Hash;
use arcjet_store::{IndexClient, IndexEntry, Query, StoreClient};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::ServerError;
use crate::AppState;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Response body for `POST /store`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoreResponse {
    pub content_hash: String,
}

/// Request body for `POST /index`.
#[derive(Deserialize)]
pub(crate) struct IndexRequest {
    pub metadata: Value,
}

// -----------------------------------------------------------------------
// POST /store
// -----------------------------------------------------------------------

pub(crate) async fn put_store(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<StoreResponse>), ServerError> {
    if body.is_empty() {
        return Err(ServerError::BadRequest("empty content".into()));
    }
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_owned();

    let len = body.len();
    let hash = state.store.put(body, &content_type).await?;
    info!(hash = %&hash.to_hex()[..16], len, %content_type, "stored content");

    Ok((
        StatusCode::CREATED,
        Json(StoreResponse {
            content_hash: hash.to_hex(),
        }),
    ))
}

// -----------------------------------------------------------------------
// GET /store/{hash}
// -----------------------------------------------------------------------

pub(crate) async fn get_store(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Response, ServerError> {
    let hash = Sha512Hash::from_hex(&hash)
        .map_err(|e| ServerError::BadRequest(format!("content hash: {e}")))?;
    let blob = state.store.get_blob(&hash).await?;

    let content_type = blob
        .content_type
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_owned());
    Ok(([(header::CONTENT_TYPE, content_type)], blob.content).into_response())
}

// -----------------------------------------------------------------------
// POST /index
// -----------------------------------------------------------------------

pub(crate) async fn put_index(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, ServerError> {
    let request: IndexRequest = parse_json(&body)?;
    let entry = IndexEntry::from_value(request.metadata)
        .map_err(|e| ServerError::BadRequest(e.to_string()))?;
    entry
        .validate()
        .map_err(|e| ServerError::BadRequest(e.to_string()))?;

    state.index.put(&entry).await?;
    debug!(id = ?entry.id().ok(), "indexed entry");
    Ok(StatusCode::OK)
}

// -----------------------------------------------------------------------
// POST /find
// -----------------------------------------------------------------------

pub(crate) async fn find(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Vec<IndexEntry>>, ServerError> {
    // An empty body is the empty query.
    let query = if body.iter().all(u8::is_ascii_whitespace) {
        Query::new()
    } else {
        Query::from_value(parse_json(&body)?)
            .map_err(|e| ServerError::BadRequest(e.to_string()))?
    };

    let entries = state.index.find(&query).await?;
    debug!(matches = entries.len(), "find");
    Ok(Json(entries))
}

/// Parse a JSON body regardless of the request's `Content-Type`.
fn parse_json<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, ServerError> {
    serde_json::from_slice(body).map_err(|e| ServerError::BadRequest(format!("invalid JSON: {e}")))
}
