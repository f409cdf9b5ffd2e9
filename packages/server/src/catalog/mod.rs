//! Tobacco lifecycle: persistence, read-time aggregation, photo asset
//! binding, and removal with archival.

mod aggregate;
pub mod archive;
pub mod asset;
mod comments;
mod error;
pub mod store;

pub use aggregate::{Aggregates, RatingStats};
pub use archive::{ArchivalService, CascadeReport, CascadeStep, StepOutcome};
pub use asset::{AssetLifecycle, AssetRetirement};
pub use error::CatalogError;
pub use store::{NewTobacco, Removal, TobaccoPatch, TobaccoService, UpdateOutcome};

use std::fmt;

/// Product kinds sharing the comment/rating cascade shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductKind {
    Tobacco,
}

impl ProductKind {
    /// Discriminator stored in `comment.entity_type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductKind::Tobacco => "tobacco",
        }
    }

    /// Asset namespace under `uploads/`.
    pub fn asset_namespace(&self) -> &'static str {
        match self {
            ProductKind::Tobacco => "tobaccos",
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
