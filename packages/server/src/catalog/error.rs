use common::storage::StorageError;
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

use super::archive::CascadeReport;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Tobacco {0} not found")]
    NotFound(Uuid),

    #[error("Store error: {0}")]
    Store(#[from] DbErr),

    #[error("Asset store error: {0}")]
    Asset(#[from] StorageError),

    /// The row is gone but at least one cleanup step failed.
    #[error("Cascade incomplete for tobacco {}: failed steps {:?}", .0.tobacco_id, .0.failed_steps())]
    PartialCascade(CascadeReport),
}
