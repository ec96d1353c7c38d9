//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented stage routes into a single OpenAPI 3.1
//! spec served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::state::AppState;

/// Wire shape of every JSON reply.
///
/// Documentation mirror of [`staging_core::ResponseEnvelope`], which does
/// not depend on utoipa.
#[derive(Debug, Serialize, ToSchema)]
#[schema(as = ResponseEnvelope)]
pub struct EnvelopeSchema {
    /// `success` or `fail`.
    #[schema(example = "success")]
    pub status: String,
    /// Projection of the addressed resource; null on failure.
    #[schema(value_type = Option<Object>)]
    pub data: Option<serde_json::Value>,
    /// Exactly one message on failure; null on success.
    pub errors: Option<Vec<String>>,
}

/// Assembled OpenAPI spec for the staging API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "LDR Staging API",
        version = "0.1.0",
        description = "Read-only access to LDR staging structures.\n\nA stage holds segments, a segment holds material suites, and a material suite holds content, an optional PREMIS record, technical metadata, and nested presforms. Material suite and technical metadata identifiers are the percent-escaped stored names; presform identifiers are raw names.\n\nEvery JSON reply is a `ResponseEnvelope`. Content, PREMIS and technical metadata are served as attachments.",
        license(name = "AGPL-3.0-or-later")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    paths(
        crate::routes::stages::list_stages,
        crate::routes::stages::get_stage,
        crate::routes::stages::get_segment,
        crate::routes::stages::get_material_suite,
        crate::routes::stages::get_content,
        crate::routes::stages::get_premis,
        crate::routes::stages::list_techmds,
        crate::routes::stages::get_techmd,
        crate::routes::stages::list_presforms,
        crate::routes::stages::get_presform_resource,
    ),
    components(schemas(EnvelopeSchema)),
    tags(
        (name = "stages", description = "Stage listing, stage summaries and segments"),
        (name = "material_suites", description = "Material suite summaries, content, PREMIS and technical metadata"),
        (name = "presforms", description = "Presform listings and resources along a presform chain"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_generates_with_title() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "LDR Staging API");
    }

    #[test]
    fn spec_documents_every_stage_route() {
        let spec = ApiDoc::openapi();
        for path in [
            "/v1/stages",
            "/v1/stages/{stage_id}",
            "/v1/stages/{stage_id}/{segment_id}",
            "/v1/stages/{stage_id}/{segment_id}/{ms_id}",
            "/v1/stages/{stage_id}/{segment_id}/{ms_id}/content",
            "/v1/stages/{stage_id}/{segment_id}/{ms_id}/premis",
            "/v1/stages/{stage_id}/{segment_id}/{ms_id}/techmds",
            "/v1/stages/{stage_id}/{segment_id}/{ms_id}/techmds/{techmd_id}",
            "/v1/stages/{stage_id}/{segment_id}/{ms_id}/presforms",
            "/v1/stages/{stage_id}/{segment_id}/{ms_id}/presforms/{chain}",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
