use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{
    ACCEPT_RANGES, ALLOW, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, RANGE,
};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use file_reconstruction::FileStats;
use tracing::debug;

use crate::range::{RangeRequest, resolve_range};
use crate::server::AppState;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Record identifiers are fixed-length hex tokens.
const RECORD_ID_LEN: usize = 64;

pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.health.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

pub async fn method_not_allowed() -> Response {
    (StatusCode::METHOD_NOT_ALLOWED, [(ALLOW, "GET")]).into_response()
}

/// Serves a file by its root record identifier, honoring a single `Range`.
pub async fn get_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Response {
    let Some(id) = record_id(&key) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let stats = match state.reader.stats(id).await {
        Ok(stats) => stats,
        Err(err) => {
            // A fetch or decode failure is indistinguishable from a missing
            // file at this surface.
            debug!(id, error = %err, "stats lookup failed");
            return StatusCode::NOT_FOUND.into_response();
        },
    };

    let range_header = headers.get(RANGE).and_then(|value| value.to_str().ok());
    match resolve_range(range_header, stats.size) {
        None => full_content(&state, id, &stats).await,
        Some(range) if range.start >= stats.size || range.end >= stats.size => (
            StatusCode::RANGE_NOT_SATISFIABLE,
            [(CONTENT_RANGE, format!("bytes */{}", stats.size))],
        )
            .into_response(),
        Some(range) => partial_content(&state, id, &stats, range).await,
    }
}

async fn full_content(state: &AppState, id: &str, stats: &FileStats) -> Response {
    let stream = match state.reader.read(id, 0, Some(stats.size)).await {
        Ok(stream) => stream,
        Err(err) => {
            debug!(id, error = %err, "read failed");
            return StatusCode::NOT_FOUND.into_response();
        },
    };
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, content_type(stats)),
            (CONTENT_LENGTH, stats.size.to_string()),
            (ACCEPT_RANGES, "bytes".to_string()),
        ],
        Body::from_stream(stream),
    )
        .into_response()
}

async fn partial_content(state: &AppState, id: &str, stats: &FileStats, range: RangeRequest) -> Response {
    let RangeRequest { start, end } = range;
    // A degenerate one-byte range advertises zero length and carries no body.
    let content_length = if start == end { 0 } else { end - start + 1 };

    let body = if content_length == 0 {
        Body::empty()
    } else {
        match state.reader.read(id, start, Some(end - start + 1)).await {
            Ok(stream) => Body::from_stream(stream),
            Err(err) => {
                debug!(id, error = %err, "read failed");
                return StatusCode::NOT_FOUND.into_response();
            },
        }
    };

    (
        StatusCode::PARTIAL_CONTENT,
        [
            (CONTENT_RANGE, format!("bytes {start}-{end}/{}", stats.size)),
            (CONTENT_LENGTH, content_length.to_string()),
            (CONTENT_TYPE, content_type(stats)),
            (ACCEPT_RANGES, "bytes".to_string()),
            (CACHE_CONTROL, "no-cache".to_string()),
        ],
        body,
    )
        .into_response()
}

fn content_type(stats: &FileStats) -> String {
    stats.mime.clone().unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string())
}

/// The record identifier is the path segment before the first `.`; an
/// extension suffix is accepted and ignored. Anything that is not exactly a
/// 64-char hex token is rejected before touching the ledger.
fn record_id(key: &str) -> Option<&str> {
    let id = key.split('.').next().unwrap_or(key);
    if id.len() == RECORD_ID_LEN && id.bytes().all(|b| b.is_ascii_hexdigit()) {
        Some(id)
    } else {
        None
    }
}
