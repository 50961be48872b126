//! Logo resolution handler.

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use folio_core::models::LogoSource;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Deserialize)]
pub struct LogoResolveQuery {
    pub org: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LogoResolveResponse {
    pub url: String,
    /// True when the answer came from the cache without an external call.
    pub cached: bool,
    pub source: LogoSource,
}

/// Resolve an organization/technology name to a cached logo URL.
///
/// Names are cache keys exactly as given (after trimming): case and
/// punctuation variants resolve independently.
#[utoipa::path(
    get,
    path = "/api/v0/logos/resolve",
    tag = "logos",
    params(
        ("org" = String, Query, description = "Organization or technology display name")
    ),
    responses(
        (status = 200, description = "Logo resolved", body = LogoResolveResponse),
        (status = 400, description = "Missing or empty name", body = ErrorResponse),
        (status = 404, description = "No logo found", body = ErrorResponse),
        (status = 502, description = "External provider failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, query), fields(operation = "resolve_logo"))]
pub async fn resolve_logo(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogoResolveQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let resolution = state.logos.resolver.resolve(&query.org).await?;

    Ok(Json(LogoResolveResponse {
        url: resolution.url,
        cached: resolution.cached,
        source: resolution.source,
    }))
}
