use std::sync::Arc;

use common::storage::{AssetLocator, AssetStore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{CatalogError, ProductKind};

/// Binds, replaces and retires the photo assets referenced by catalog rows.
///
/// The relational store and the asset store share no transaction. The rule
/// that keeps them consistent: a committed locator is only deleted after the
/// row pointing at its replacement has committed.
#[derive(Clone)]
pub struct AssetLifecycle {
    store: Arc<dyn AssetStore>,
    kind: ProductKind,
}

/// Handle to a deferred deletion of a superseded asset.
///
/// Dropping it detaches the task; awaiting [`AssetRetirement::finished`]
/// reports whether a file was actually removed.
#[derive(Debug)]
pub struct AssetRetirement {
    locator: AssetLocator,
    task: JoinHandle<bool>,
}

impl AssetRetirement {
    pub fn locator(&self) -> &AssetLocator {
        &self.locator
    }

    pub async fn finished(self) -> bool {
        self.task.await.unwrap_or(false)
    }
}

impl AssetLifecycle {
    pub fn new(store: Arc<dyn AssetStore>, kind: ProductKind) -> Self {
        Self { store, kind }
    }

    /// Validate an uploaded locator before it is recorded on a row.
    ///
    /// The locator must be present, live in this kind's namespace, name an
    /// image, and resolve to a stored file.
    pub async fn bind(&self, photo: Option<&str>) -> Result<AssetLocator, CatalogError> {
        let raw = photo.ok_or_else(|| {
            CatalogError::Validation("Photo is missing or has an unsupported format".into())
        })?;
        let locator =
            AssetLocator::parse(raw).map_err(|e| CatalogError::Validation(e.to_string()))?;

        if locator.namespace() != Some(self.kind.asset_namespace()) || !locator.is_image() {
            return Err(CatalogError::Validation(
                "Photo is missing or has an unsupported format".into(),
            ));
        }
        if !self.store.exists(&locator).await? {
            return Err(CatalogError::Validation(format!(
                "Photo {locator} was not uploaded"
            )));
        }

        Ok(locator)
    }

    /// Schedule deletion of `previous` once its replacement `current` is committed.
    ///
    /// Returns `None` when there is nothing to retire.
    pub fn retire(
        &self,
        previous: AssetLocator,
        current: &AssetLocator,
    ) -> Option<AssetRetirement> {
        if &previous == current {
            return None;
        }

        let store = Arc::clone(&self.store);
        let locator = previous.clone();
        let task = tokio::spawn(async move {
            match store.delete(&previous).await {
                Ok(removed) => {
                    debug!(asset = %previous, removed, "Retired superseded asset");
                    removed
                }
                Err(e) => {
                    warn!(asset = %previous, error = %e, "Failed to delete superseded asset");
                    false
                }
            }
        });

        Some(AssetRetirement { locator, task })
    }

    /// Best-effort removal of a fresh upload whose row write did not commit.
    pub async fn discard(&self, locator: &AssetLocator) {
        match self.store.delete(locator).await {
            Ok(_) => info!(asset = %locator, "Discarded unbound upload"),
            Err(e) => warn!(asset = %locator, error = %e, "Failed to discard unbound upload"),
        }
    }
}
