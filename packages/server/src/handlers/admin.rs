use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::resource::CollectReportResponse;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/orphans/collect",
    tag = "Admin",
    operation_id = "collectOrphans",
    summary = "Reclaim unreferenced storage objects",
    description = "Runs one orphan collection pass. Objects whose blob delete fails are \
        reported and left for a later pass. Requires an administrator token.",
    responses(
        (status = 200, description = "Collection finished", body = CollectReportResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "A pass is already running (COLLECTOR_BUSY)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn collect_orphans(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<CollectReportResponse>, AppError> {
    auth_user.require_admin()?;

    let report = state.engine.collect_orphans().await?;
    Ok(Json(report.into()))
}
