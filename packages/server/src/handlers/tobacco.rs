use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::extract::multipart::Field;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::storage::{AssetLocator, AssetStore, BoxReader};
use tokio::io::AsyncWriteExt;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::catalog::{NewTobacco, ProductKind, TobaccoPatch, TobaccoService};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthUser, Viewer};
use crate::models::shared::ApiResponse;
use crate::models::tobacco::{
    CommentView, CreatedTobacco, RemovedTobacco, TobaccoDetail, TobaccoSummary,
};
use crate::state::AppState;

const UNSUPPORTED_PHOTO: &str = "Photo is missing or has an unsupported format";
const UNSTORED_PHOTO: &str = "Photo was not stored";

pub fn tobacco_upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(16 * 1024 * 1024) // 16 MB
}

/// Raw fields of a create or update form. The image, if any, is already stored.
#[derive(Default)]
struct TobaccoForm {
    name: Option<String>,
    fabricator_id: Option<String>,
    description: Option<String>,
    image: Option<AssetLocator>,
}

impl TobaccoForm {
    fn fabricator_id(&self) -> Result<Option<Uuid>, AppError> {
        self.fabricator_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                Uuid::parse_str(s)
                    .map_err(|_| AppError::Validation("fabricatorId must be a UUID".into()))
            })
            .transpose()
    }
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Tobaccos",
    operation_id = "createTobacco",
    summary = "Create a tobacco",
    description = "Creates a tobacco from a multipart form with `name`, `fabricatorId`, optional \
        `description` and a required `image` file. The image must be an `image/*` type.",
    request_body(content_type = "multipart/form-data", description = "Tobacco fields and photo"),
    responses(
        (status = 201, description = "Tobacco created", body = ApiResponse<CreatedTobacco>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 500, description = "Tobacco was not created (INTERNAL_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(
    skip(state, auth_user, multipart),
    fields(user_id = %auth_user.user_id, login = %auth_user.login)
)]
pub async fn create_tobacco(
    auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_form(multipart, &state).await?;

    let attrs = match new_tobacco(&form) {
        Ok(attrs) => attrs,
        Err(e) => {
            discard_upload(&*state.assets, form.image.as_ref()).await;
            return Err(e);
        }
    };

    let service = TobaccoService::new(&state.db, state.assets.clone());
    let id = service
        .create(
            attrs,
            auth_user.user_id,
            form.image.as_ref().map(AssetLocator::as_str),
        )
        .await
        .map_err(|e| AppError::from_catalog(e, "Tobacco was not created"))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Tobacco created", CreatedTobacco { id })),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Tobaccos",
    operation_id = "listTobaccos",
    summary = "List tobaccos",
    description = "Returns every tobacco with its fabricator and average rating, \
        ordered by name and then by rating.",
    responses(
        (status = 200, description = "Tobacco list", body = ApiResponse<Vec<TobaccoSummary>>),
        (status = 500, description = "Failed to load tobaccos (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_tobaccos(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TobaccoSummary>>>, AppError> {
    let service = TobaccoService::new(&state.db, state.assets.clone());
    let items = service
        .get_all()
        .await
        .map_err(|e| AppError::from_catalog(e, "Failed to load tobaccos"))?;

    Ok(Json(ApiResponse::ok("Tobaccos loaded", items)))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Tobaccos",
    operation_id = "getTobacco",
    summary = "Get tobacco details",
    description = "Returns one tobacco with its aggregates. With a bearer token the \
        `isFavorite`, `isRated` and `myRating` fields reflect the caller.",
    params(("id" = Uuid, Path, description = "Tobacco ID")),
    responses(
        (status = 200, description = "Tobacco details", body = ApiResponse<TobaccoDetail>),
        (status = 404, description = "Tobacco not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Failed to load tobacco (INTERNAL_ERROR)", body = ErrorBody),
    ),
    security((), ("jwt" = [])),
)]
#[instrument(skip(state, viewer), fields(tobacco_id = %id))]
pub async fn get_tobacco(
    Viewer(viewer): Viewer,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TobaccoDetail>>, AppError> {
    let service = TobaccoService::new(&state.db, state.assets.clone());
    let detail = service
        .get_by_id(id, viewer)
        .await
        .map_err(|e| AppError::from_catalog(e, "Failed to load tobacco"))?;

    Ok(Json(ApiResponse::ok("Tobacco loaded", detail)))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Tobaccos",
    operation_id = "updateTobacco",
    summary = "Update a tobacco",
    description = "Partially updates a tobacco. Omitted fields keep their stored value. \
        A new `image` replaces the photo; the previous file is deleted afterwards.",
    params(("id" = Uuid, Path, description = "Tobacco ID")),
    request_body(content_type = "multipart/form-data", description = "Changed fields and optional photo"),
    responses(
        (status = 200, description = "Tobacco updated", body = ApiResponse<TobaccoDetail>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Tobacco not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Tobacco was not updated (INTERNAL_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(
    skip(state, auth_user, multipart),
    fields(tobacco_id = %id, user_id = %auth_user.user_id, login = %auth_user.login)
)]
pub async fn update_tobacco(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<TobaccoDetail>>, AppError> {
    let form = read_form(multipart, &state).await?;

    let patch = match form.fabricator_id() {
        Ok(fabricator_id) => TobaccoPatch {
            name: form.name.clone(),
            fabricator_id,
            description: form.description.clone(),
        },
        Err(e) => {
            discard_upload(&*state.assets, form.image.as_ref()).await;
            return Err(e);
        }
    };

    let service = TobaccoService::new(&state.db, state.assets.clone());
    let outcome = service
        .update(
            id,
            auth_user.user_id,
            patch,
            form.image.as_ref().map(AssetLocator::as_str),
        )
        .await
        .map_err(|e| AppError::from_catalog(e, "Tobacco was not updated"))?;

    Ok(Json(ApiResponse::ok("Tobacco updated", outcome.detail)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Tobaccos",
    operation_id = "deleteTobacco",
    summary = "Delete a tobacco",
    description = "Permanently deletes a tobacco, removes its comments and ratings and \
        records an archive snapshot. If any cleanup step fails the tobacco stays deleted \
        and a 500 is returned.",
    params(("id" = Uuid, Path, description = "Tobacco ID")),
    responses(
        (status = 200, description = "Tobacco deleted", body = ApiResponse<RemovedTobacco>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Tobacco not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Tobacco was not deleted (INTERNAL_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(
    skip(state, auth_user),
    fields(tobacco_id = %id, user_id = %auth_user.user_id, login = %auth_user.login)
)]
pub async fn delete_tobacco(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RemovedTobacco>>, AppError> {
    let service = TobaccoService::new(&state.db, state.assets.clone());
    let removal = service
        .delete(id)
        .await
        .map_err(|e| AppError::from_catalog(e, "Tobacco was not deleted"))?;

    Ok(Json(ApiResponse::ok(
        "Tobacco deleted",
        RemovedTobacco {
            id: removal.snapshot.id,
            archive_id: removal.archive_id,
        },
    )))
}

#[utoipa::path(
    get,
    path = "/{id}/comments",
    tag = "Tobaccos",
    operation_id = "listTobaccoComments",
    summary = "List comments on a tobacco",
    description = "Returns the comments on a tobacco, oldest first, with the commenter's \
        login and avatar. An unknown tobacco yields an empty list.",
    params(("id" = Uuid, Path, description = "Tobacco ID")),
    responses(
        (status = 200, description = "Comment list", body = ApiResponse<Vec<CommentView>>),
        (status = 500, description = "Failed to load comments (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(tobacco_id = %id))]
pub async fn list_tobacco_comments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<CommentView>>>, AppError> {
    let service = TobaccoService::new(&state.db, state.assets.clone());
    let comments = service
        .comments(id)
        .await
        .map_err(|e| AppError::from_catalog(e, "Failed to load comments"))?;

    Ok(Json(ApiResponse::ok("Comments loaded", comments)))
}

fn new_tobacco(form: &TobaccoForm) -> Result<NewTobacco, AppError> {
    let name = form
        .name
        .clone()
        .ok_or_else(|| AppError::Validation("Missing 'name' field".into()))?;
    let fabricator_id = form
        .fabricator_id()?
        .ok_or_else(|| AppError::Validation("Missing 'fabricatorId' field".into()))?;

    Ok(NewTobacco {
        name,
        fabricator_id,
        description: form.description.clone(),
    })
}

/// Read every form field, storing the image as it streams in.
///
/// If the form turns out to be malformed after the image was stored, the
/// stored file is removed again.
async fn read_form(mut multipart: Multipart, state: &AppState) -> Result<TobaccoForm, AppError> {
    let mut form = TobaccoForm::default();
    let result = read_fields(&mut multipart, state, &mut form).await;

    if let Err(e) = result {
        discard_upload(&*state.assets, form.image.as_ref()).await;
        return Err(e);
    }
    Ok(form)
}

async fn read_fields(
    multipart: &mut Multipart,
    state: &AppState,
    form: &mut TobaccoForm,
) -> Result<(), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("image") => {
                if form.image.is_some() {
                    return Err(AppError::Validation("Only one image may be uploaded".into()));
                }
                let locator = image_locator(field.file_name())?;
                stream_field_to_store(
                    field,
                    &*state.assets,
                    &locator,
                    state.config.storage.max_asset_size,
                )
                .await?;
                form.image = Some(locator);
            }
            Some(name @ ("name" | "fabricatorId" | "description")) => {
                let key = name.to_string();
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read {key}: {e}")))?;
                match key.as_str() {
                    "name" => form.name = Some(text),
                    "fabricatorId" => form.fabricator_id = Some(text),
                    _ => form.description = Some(text),
                }
            }
            _ => {} // Ignore unknown fields.
        }
    }
    Ok(())
}

/// Fresh locator for an uploaded photo, keeping the client's image extension.
fn image_locator(file_name: Option<&str>) -> Result<AssetLocator, AppError> {
    let extension = file_name
        .and_then(|name| std::path::Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| AppError::Validation(UNSUPPORTED_PHOTO.into()))?;

    let locator = AssetLocator::generate(ProductKind::Tobacco.asset_namespace(), extension)
        .map_err(|_| AppError::Validation(UNSUPPORTED_PHOTO.into()))?;
    if !locator.is_image() {
        return Err(AppError::Validation(UNSUPPORTED_PHOTO.into()));
    }
    Ok(locator)
}

/// Stream a multipart field to the asset store via a temp file.
async fn stream_field_to_store(
    mut field: Field<'_>,
    assets: &dyn AssetStore,
    locator: &AssetLocator,
    max_size: u64,
) -> Result<u64, AppError> {
    let temp_path = std::env::temp_dir().join(format!("hookah-upload-{}", Uuid::new_v4()));

    let result = async {
        let mut temp_file = tokio::fs::File::create(&temp_path).await.map_err(|e| {
            AppError::internal(format!("Failed to create temp file: {e}"), UNSTORED_PHOTO)
        })?;

        let mut total_size: u64 = 0;

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
        {
            total_size += chunk.len() as u64;
            if total_size > max_size {
                return Err(AppError::Validation(format!(
                    "File exceeds maximum size of {max_size} bytes"
                )));
            }
            temp_file.write_all(&chunk).await.map_err(|e| {
                AppError::internal(format!("Temp file write failed: {e}"), UNSTORED_PHOTO)
            })?;
        }

        temp_file.flush().await.map_err(|e| {
            AppError::internal(format!("Temp file flush failed: {e}"), UNSTORED_PHOTO)
        })?;
        drop(temp_file);

        if total_size == 0 {
            return Err(AppError::Validation(UNSUPPORTED_PHOTO.into()));
        }

        let file = tokio::fs::File::open(&temp_path).await.map_err(|e| {
            AppError::internal(format!("Failed to reopen temp file: {e}"), UNSTORED_PHOTO)
        })?;
        let reader: BoxReader = Box::new(file);
        Ok(assets.put_stream(locator, reader).await?)
    }
    .await;

    // Best effort.
    let _ = tokio::fs::remove_file(&temp_path).await;

    result
}

async fn discard_upload(assets: &dyn AssetStore, locator: Option<&AssetLocator>) {
    let Some(locator) = locator else {
        return;
    };
    if let Err(e) = assets.delete(locator).await {
        warn!(asset = %locator, error = %e, "Failed to discard rejected upload");
    }
}
