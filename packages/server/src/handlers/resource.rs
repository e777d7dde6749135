use std::io;

use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use futures::TryStreamExt;
use tokio_util::io::StreamReader;
use tracing::instrument;
use uuid::Uuid;

use crate::engine::{FileUpload, LinkSubmission};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::resource::{
    CreateLinkRequest, ObjectUrlResponse, ResourceListResponse, ResourceResponse,
};
use crate::state::AppState;

/// Body limit for uploads: the object size cap plus room for multipart framing.
pub fn upload_body_limit(max_object_size: u64) -> DefaultBodyLimit {
    let limit = max_object_size.saturating_add(1024 * 1024);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

#[utoipa::path(
    post,
    path = "/file/{week_id}",
    tag = "Resources",
    operation_id = "uploadFileResource",
    summary = "Upload a file to a week",
    description = "Streams the `file` multipart field into storage. An optional `name` field, \
        sent before `file`, sets the display name; otherwise the upload's filename is used. \
        Identical content already stored elsewhere is reused. Uploading content that already \
        exists in the same week is rejected.",
    params(("week_id" = String, Path, description = "Week ID")),
    request_body(content_type = "multipart/form-data", description = "File upload with optional name"),
    responses(
        (status = 201, description = "Resource created", body = ResourceResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Same content already in this week (CONFLICT)", body = ErrorBody),
        (status = 503, description = "Storage unavailable (STORAGE_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = %auth_user.user_id))]
pub async fn upload_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(week_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("name") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read name: {e}")))?;
                name = Some(text);
            }
            Some("file") => {
                let name = match name.take() {
                    Some(n) if !n.trim().is_empty() => n,
                    _ => field
                        .file_name()
                        .map(str::to_string)
                        .ok_or_else(|| AppError::Validation("Missing resource name".into()))?,
                };

                let stream = Box::pin(field.map_err(io::Error::other));
                let mut reader = StreamReader::new(stream);
                let resource = state
                    .engine
                    .upload_file(
                        FileUpload {
                            name,
                            week_id,
                            owner_id: auth_user.user_id,
                        },
                        &mut reader,
                        None,
                    )
                    .await?;

                return Ok((StatusCode::CREATED, Json(ResourceResponse::from(resource))));
            }
            _ => {} // Ignore unknown fields.
        }
    }

    Err(AppError::Validation("Missing 'file' field".into()))
}

#[utoipa::path(
    post,
    path = "/link/{week_id}",
    tag = "Resources",
    operation_id = "createLinkResource",
    summary = "Add a link to a week",
    description = "Stores an external URL as a resource. The same URL may appear once per week.",
    params(("week_id" = String, Path, description = "Week ID")),
    request_body = CreateLinkRequest,
    responses(
        (status = 201, description = "Resource created", body = ResourceResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Same URL already in this week (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn create_link(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(week_id): Path<Uuid>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state
        .engine
        .submit_link(LinkSubmission {
            name: payload.name,
            url: payload.url,
            week_id,
            owner_id: auth_user.user_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ResourceResponse::from(resource))))
}

#[utoipa::path(
    get,
    path = "/weeks/{week_id}",
    tag = "Resources",
    operation_id = "listWeekResources",
    summary = "List resources in a week",
    description = "Returns every resource bound to the week, oldest first.",
    params(("week_id" = String, Path, description = "Week ID")),
    responses(
        (status = 200, description = "Resource list", body = ResourceListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_week_resources(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(week_id): Path<Uuid>,
) -> Result<Json<ResourceListResponse>, AppError> {
    let resources = state.engine.list_for_week(week_id).await?;
    Ok(Json(resources.into()))
}

#[utoipa::path(
    get,
    path = "/users/{user_id}",
    tag = "Resources",
    operation_id = "listUserResources",
    summary = "List resources created by a user",
    description = "Returns every resource the user owns, oldest first. Users may list their own \
        resources; administrators may list anyone's.",
    params(("user_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Resource list", body = ResourceListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_user_resources(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ResourceListResponse>, AppError> {
    if auth_user.user_id != user_id {
        auth_user.require_admin()?;
    }

    let resources = state.engine.list_for_user(user_id).await?;
    Ok(Json(resources.into()))
}

#[utoipa::path(
    get,
    path = "/objects/{object_id}",
    tag = "Resources",
    operation_id = "getObjectUrl",
    summary = "Get a download URL for stored content",
    description = "Returns a presigned URL for the storage object, valid for a limited time.",
    params(("object_id" = String, Path, description = "Storage object ID")),
    responses(
        (status = 200, description = "Presigned URL", body = ObjectUrlResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Object not found (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Storage unavailable (STORAGE_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_object_url(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(object_id): Path<Uuid>,
) -> Result<Json<ObjectUrlResponse>, AppError> {
    let url = state.engine.object_url(object_id).await?;
    Ok(Json(ObjectUrlResponse {
        url,
        expires_in: u64::from(state.config.storage.presign_ttl_secs),
    }))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Resources",
    operation_id = "deleteResource",
    summary = "Delete a resource",
    description = "Deletes a resource owned by the caller. Stored content is reclaimed later \
        by the orphan collector once nothing references it.",
    params(("id" = String, Path, description = "Resource ID")),
    responses(
        (status = 204, description = "Resource deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No such resource owned by the caller (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn delete_resource(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.engine.delete_resource(id, auth_user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
