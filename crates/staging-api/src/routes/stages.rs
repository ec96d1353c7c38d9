//! # Stage Tree Routes
//!
//! Read-only resources for stages, segments, material suites and their
//! presform chains. Every GET handler takes its [`Address`] from the raw
//! request path through [`StagingAddress`]; the typed route patterns only
//! select the handler and document the surface.
//!
//! Mutation methods the service declares are routed to
//! [`not_implemented`] and answer 501.

use std::io::{self, Read};

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use staging_core::{escape, Address, Item, Outcome, ResponseEnvelope};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::AppError;
use crate::extractors::StagingAddress;
use crate::openapi::EnvelopeSchema;
use crate::state::AppState;

/// Build the stage-tree router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/stages", get(list_stages).post(not_implemented))
        .route(
            "/v1/stages/{stage_id}",
            get(get_stage).post(not_implemented).delete(not_implemented),
        )
        .route(
            "/v1/stages/{stage_id}/{segment_id}",
            get(get_segment).post(not_implemented).delete(not_implemented),
        )
        .route(
            "/v1/stages/{stage_id}/{segment_id}/{ms_id}",
            get(get_material_suite)
                .post(not_implemented)
                .delete(not_implemented),
        )
        .route(
            "/v1/stages/{stage_id}/{segment_id}/{ms_id}/content",
            get(get_content).delete(not_implemented),
        )
        .route(
            "/v1/stages/{stage_id}/{segment_id}/{ms_id}/premis",
            get(get_premis).delete(not_implemented),
        )
        .route(
            "/v1/stages/{stage_id}/{segment_id}/{ms_id}/techmds",
            get(list_techmds).post(not_implemented).delete(not_implemented),
        )
        .route(
            "/v1/stages/{stage_id}/{segment_id}/{ms_id}/techmds/{techmd_id}",
            get(get_techmd).delete(not_implemented),
        )
        .route(
            "/v1/stages/{stage_id}/{segment_id}/{ms_id}/presforms",
            get(list_presforms)
                .post(not_implemented)
                .delete(not_implemented),
        )
        .route(
            "/v1/stages/{stage_id}/{segment_id}/{ms_id}/presforms/{*chain}",
            get(get_presform_resource).delete(not_implemented),
        )
}

/// Execute `address` and render the outcome.
async fn respond(state: &AppState, address: Address) -> Result<Response, AppError> {
    match state.execute(address).await? {
        Outcome::Data(data) => Ok(Json(ResponseEnvelope::success(data)).into_response()),
        Outcome::Item(item) => attachment(item).await,
    }
}

/// ASCII-safe fallback name for the `filename` parameter.
fn attachment_filename(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let safe: String = last
        .chars()
        .map(|c| match c {
            ' ' => ' ',
            '"' | '\\' | '%' => '_',
            c if c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect();
    if safe.trim().is_empty() {
        "download".to_string()
    } else {
        safe
    }
}

/// `Content-Disposition` with a plain `filename` and an RFC 5987
/// `filename*` carrying the exact UTF-8 name.
fn content_disposition(name: &str) -> Result<HeaderValue, AppError> {
    let last = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let value = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        attachment_filename(name),
        escape(last)
    );
    HeaderValue::from_str(&value)
        .map_err(|e| AppError::Internal(format!("invalid Content-Disposition for {name:?}: {e}")))
}

/// Bytes read from an item per body frame.
const CHUNK_SIZE: usize = 64 * 1024;

/// Frames buffered between the reader and the response body.
const CHUNKS_IN_FLIGHT: usize = 4;

/// Serve `item` as a streamed attachment.
///
/// The item is opened before any header is sent, so an unreadable item is
/// still a fail envelope. Reading then runs on the blocking pool and feeds
/// the body through a bounded channel.
async fn attachment(item: Item) -> Result<Response, AppError> {
    let disposition = content_disposition(&item.name)?;
    let name = item.name.clone();
    let reader = tokio::task::spawn_blocking(move || item.open())
        .await?
        .map_err(AppError::Attachment)?;

    let (tx, rx) = mpsc::channel(CHUNKS_IN_FLIGHT);
    tokio::task::spawn_blocking(move || stream_chunks(reader, &tx, &name));

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(ReceiverStream::new(rx)),
    )
        .into_response())
}

/// Copy `reader` into `tx` one chunk at a time until EOF, a read error, or
/// the receiving body is dropped.
fn stream_chunks(
    mut reader: Box<dyn Read + Send>,
    tx: &mpsc::Sender<io::Result<Vec<u8>>>,
    name: &str,
) {
    let mut sent = 0usize;
    loop {
        let mut buf = vec![0; CHUNK_SIZE];
        let chunk = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                buf.truncate(n);
                sent += n;
                Ok(buf)
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::error!(item = %name, bytes = sent, error = %e, "attachment read failed mid-stream");
                Err(e)
            }
        };
        let failed = chunk.is_err();
        if tx.blocking_send(chunk).is_err() {
            tracing::debug!(item = %name, bytes = sent, "client dropped attachment stream");
            return;
        }
        if failed {
            return;
        }
    }
    tracing::debug!(item = %name, bytes = sent, "attachment streamed");
}

#[utoipa::path(
    get,
    path = "/v1/stages",
    responses(
        (status = 200, description = "Stage identifiers", body = EnvelopeSchema),
        (status = 404, description = "Stage listing unavailable", body = EnvelopeSchema),
    ),
    tag = "stages"
)]
pub async fn list_stages(
    State(state): State<AppState>,
    StagingAddress(address): StagingAddress,
) -> Result<Response, AppError> {
    respond(&state, address).await
}

#[utoipa::path(
    get,
    path = "/v1/stages/{stage_id}",
    params(("stage_id" = String, Path, description = "Stage identifier")),
    responses(
        (status = 200, description = "Segments and note attachments of the stage", body = EnvelopeSchema),
        (status = 404, description = "Bad Stage Identifier", body = EnvelopeSchema),
    ),
    tag = "stages"
)]
pub async fn get_stage(
    State(state): State<AppState>,
    StagingAddress(address): StagingAddress,
) -> Result<Response, AppError> {
    respond(&state, address).await
}

#[utoipa::path(
    get,
    path = "/v1/stages/{stage_id}/{segment_id}",
    params(
        ("stage_id" = String, Path, description = "Stage identifier"),
        ("segment_id" = String, Path, description = "Segment identifier"),
    ),
    responses(
        (status = 200, description = "Escaped material suite identifiers", body = EnvelopeSchema),
        (status = 404, description = "Bad Stage or Segment Identifier", body = EnvelopeSchema),
    ),
    tag = "stages"
)]
pub async fn get_segment(
    State(state): State<AppState>,
    StagingAddress(address): StagingAddress,
) -> Result<Response, AppError> {
    respond(&state, address).await
}

#[utoipa::path(
    get,
    path = "/v1/stages/{stage_id}/{segment_id}/{ms_id}",
    params(
        ("stage_id" = String, Path, description = "Stage identifier"),
        ("segment_id" = String, Path, description = "Segment identifier"),
        ("ms_id" = String, Path, description = "Escaped content name of the material suite"),
    ),
    responses(
        (status = 200, description = "Material suite summary", body = EnvelopeSchema),
        (status = 404, description = "Addressing failed", body = EnvelopeSchema),
    ),
    tag = "material_suites"
)]
pub async fn get_material_suite(
    State(state): State<AppState>,
    StagingAddress(address): StagingAddress,
) -> Result<Response, AppError> {
    respond(&state, address).await
}

#[utoipa::path(
    get,
    path = "/v1/stages/{stage_id}/{segment_id}/{ms_id}/content",
    params(
        ("stage_id" = String, Path, description = "Stage identifier"),
        ("segment_id" = String, Path, description = "Segment identifier"),
        ("ms_id" = String, Path, description = "Escaped content name of the material suite"),
    ),
    responses(
        (status = 200, description = "Content bytes as an application/octet-stream attachment"),
        (status = 404, description = "Addressing failed", body = EnvelopeSchema),
    ),
    tag = "material_suites"
)]
pub async fn get_content(
    State(state): State<AppState>,
    StagingAddress(address): StagingAddress,
) -> Result<Response, AppError> {
    respond(&state, address).await
}

#[utoipa::path(
    get,
    path = "/v1/stages/{stage_id}/{segment_id}/{ms_id}/premis",
    params(
        ("stage_id" = String, Path, description = "Stage identifier"),
        ("segment_id" = String, Path, description = "Segment identifier"),
        ("ms_id" = String, Path, description = "Escaped content name of the material suite"),
    ),
    responses(
        (status = 200, description = "PREMIS record as an application/octet-stream attachment"),
        (status = 404, description = "Addressing failed or no PREMIS record", body = EnvelopeSchema),
    ),
    tag = "material_suites"
)]
pub async fn get_premis(
    State(state): State<AppState>,
    StagingAddress(address): StagingAddress,
) -> Result<Response, AppError> {
    respond(&state, address).await
}

#[utoipa::path(
    get,
    path = "/v1/stages/{stage_id}/{segment_id}/{ms_id}/techmds",
    params(
        ("stage_id" = String, Path, description = "Stage identifier"),
        ("segment_id" = String, Path, description = "Segment identifier"),
        ("ms_id" = String, Path, description = "Escaped content name of the material suite"),
    ),
    responses(
        (status = 200, description = "Escaped technical metadata names", body = EnvelopeSchema),
        (status = 404, description = "Addressing failed", body = EnvelopeSchema),
    ),
    tag = "material_suites"
)]
pub async fn list_techmds(
    State(state): State<AppState>,
    StagingAddress(address): StagingAddress,
) -> Result<Response, AppError> {
    respond(&state, address).await
}

#[utoipa::path(
    get,
    path = "/v1/stages/{stage_id}/{segment_id}/{ms_id}/techmds/{techmd_id}",
    params(
        ("stage_id" = String, Path, description = "Stage identifier"),
        ("segment_id" = String, Path, description = "Segment identifier"),
        ("ms_id" = String, Path, description = "Escaped content name of the material suite"),
        ("techmd_id" = String, Path, description = "Escaped technical metadata name"),
    ),
    responses(
        (status = 200, description = "Technical metadata record as an application/octet-stream attachment"),
        (status = 404, description = "Addressing failed", body = EnvelopeSchema),
    ),
    tag = "material_suites"
)]
pub async fn get_techmd(
    State(state): State<AppState>,
    StagingAddress(address): StagingAddress,
) -> Result<Response, AppError> {
    respond(&state, address).await
}

#[utoipa::path(
    get,
    path = "/v1/stages/{stage_id}/{segment_id}/{ms_id}/presforms",
    params(
        ("stage_id" = String, Path, description = "Stage identifier"),
        ("segment_id" = String, Path, description = "Segment identifier"),
        ("ms_id" = String, Path, description = "Escaped content name of the material suite"),
    ),
    responses(
        (status = 200, description = "Raw presform identifiers", body = EnvelopeSchema),
        (status = 404, description = "Addressing failed", body = EnvelopeSchema),
    ),
    tag = "presforms"
)]
pub async fn list_presforms(
    State(state): State<AppState>,
    StagingAddress(address): StagingAddress,
) -> Result<Response, AppError> {
    respond(&state, address).await
}

/// Any resource inside a presform chain.
///
/// `chain` is `P1[/presforms/P2...]` optionally followed by `content`,
/// `premis`, `techmds`, `techmds/{techmd_id}` or `presforms`.
#[utoipa::path(
    get,
    path = "/v1/stages/{stage_id}/{segment_id}/{ms_id}/presforms/{chain}",
    params(
        ("stage_id" = String, Path, description = "Stage identifier"),
        ("segment_id" = String, Path, description = "Segment identifier"),
        ("ms_id" = String, Path, description = "Escaped content name of the material suite"),
        ("chain" = String, Path, description = "Presform chain and facet, e.g. `a.pdf/presforms/b.jpg/techmds`"),
    ),
    responses(
        (status = 200, description = "Presform summary, listing, or attachment", body = EnvelopeSchema),
        (status = 400, description = "Path does not name a presform resource", body = EnvelopeSchema),
        (status = 404, description = "Addressing failed", body = EnvelopeSchema),
    ),
    tag = "presforms"
)]
pub async fn get_presform_resource(
    State(state): State<AppState>,
    StagingAddress(address): StagingAddress,
) -> Result<Response, AppError> {
    respond(&state, address).await
}

/// Declared mutation without behavior.
pub async fn not_implemented() -> AppError {
    AppError::NotImplemented
}
