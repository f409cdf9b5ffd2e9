use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use common::storage::{AssetLocator, UPLOADS_ROOT};
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

/// Stream a stored upload, e.g. `GET /uploads/tobaccos/<uuid>.jpg`.
#[instrument(skip(state))]
pub async fn serve_asset(
    State(state): State<AppState>,
    Path(file_path): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let locator = AssetLocator::parse(&format!("{UPLOADS_ROOT}/{file_path}"))
        .map_err(|_| AppError::not_found(format!("invalid asset path {file_path:?}"), "File not found"))?;

    let size = state.assets.size(&locator).await?;
    let reader = state.assets.get_stream(&locator).await?;

    let mime = locator
        .content_type()
        .unwrap_or_else(|| mime_guess::mime::APPLICATION_OCTET_STREAM.to_string());

    Response::builder()
        .header(header::CONTENT_TYPE, mime)
        .header(header::CONTENT_LENGTH, size)
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(|e| AppError::internal(format!("response build failed: {e}"), "File could not be served"))
}
