use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use common::storage::{AssetLocator, AssetStore};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::aggregate;
use super::archive::ArchivalService;
use super::asset::{AssetLifecycle, AssetRetirement};
use super::comments;
use super::{CatalogError, ProductKind};
use crate::entity::{deleted_tobacco, fabricator, tobacco};
use crate::models::shared::validate_name;
use crate::models::tobacco::{CommentView, TobaccoDetail, TobaccoSummary};

/// Attributes of a tobacco being created.
#[derive(Debug, Clone)]
pub struct NewTobacco {
    pub name: String,
    pub fabricator_id: Uuid,
    pub description: Option<String>,
}

/// Partial update. `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TobaccoPatch {
    pub name: Option<String>,
    pub fabricator_id: Option<Uuid>,
    pub description: Option<String>,
}

/// Result of [`TobaccoService::update`].
#[derive(Debug)]
pub struct UpdateOutcome {
    pub detail: TobaccoDetail,
    /// Pending deletion of the photo this update replaced.
    pub retired: Option<AssetRetirement>,
}

/// Result of a fully cascaded [`TobaccoService::delete`].
#[derive(Debug)]
pub struct Removal {
    pub snapshot: tobacco::Model,
    pub archive_id: Uuid,
}

pub struct TobaccoService<'a> {
    db: &'a DatabaseConnection,
    assets: AssetLifecycle,
}

impl<'a> TobaccoService<'a> {
    pub fn new(db: &'a DatabaseConnection, store: Arc<dyn AssetStore>) -> Self {
        Self {
            db,
            assets: AssetLifecycle::new(store, ProductKind::Tobacco),
        }
    }

    /// Create a tobacco bound to an already uploaded photo.
    ///
    /// The photo must not already belong to another row, live or archived.
    /// If the row cannot be written the photo is discarded again.
    pub async fn create(
        &self,
        attrs: NewTobacco,
        owner_id: Uuid,
        photo: Option<&str>,
    ) -> Result<Uuid, CatalogError> {
        let locator = self.assets.bind(photo).await?;
        if let Some(holder) = photo_holder(self.db, &locator).await? {
            return Err(photo_in_use(&locator, holder));
        }

        match self.insert(attrs, owner_id, &locator).await {
            Ok(id) => {
                info!(tobacco_id = %id, user_id = %owner_id, "Tobacco created");
                Ok(id)
            }
            Err(e) => {
                self.discard_unbound(&locator).await;
                Err(e)
            }
        }
    }

    /// Every live tobacco, ordered by name and then by average rating.
    pub async fn get_all(&self) -> Result<Vec<TobaccoSummary>, CatalogError> {
        let rows = tobacco::Entity::find()
            .order_by_asc(tobacco::Column::Name)
            .all(self.db)
            .await?;
        let fabricators =
            fabricator_names(self.db, rows.iter().map(|r| r.fabricator_id).collect()).await?;
        let averages = aggregate::rating_averages(self.db).await?;

        let mut items: Vec<TobaccoSummary> = rows
            .into_iter()
            .map(|row| TobaccoSummary {
                rating: averages.get(&row.id).copied().unwrap_or(0.0),
                fabricator: fabricators.get(&row.fabricator_id).cloned(),
                id: row.id,
                photo_url: row.photo_url,
                name: row.name,
                fabricator_id: row.fabricator_id,
            })
            .collect();

        // Names keep the database collation; only equal names are reordered.
        // TODO: ascending rating as the tie-break is pending a product decision.
        for group in items.chunk_by_mut(|a, b| a.name == b.name) {
            group.sort_by(|a, b| a.rating.total_cmp(&b.rating));
        }

        Ok(items)
    }

    pub async fn get_by_id(
        &self,
        id: Uuid,
        viewer: Option<Uuid>,
    ) -> Result<TobaccoDetail, CatalogError> {
        let row = tobacco::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or(CatalogError::NotFound(id))?;
        self.compose(row, viewer).await
    }

    /// Apply `patch` and optionally swap the photo.
    ///
    /// The previous photo is only scheduled for deletion after the new
    /// locator has committed; on any failure the fresh upload is discarded
    /// and the stored photo is left untouched. Passing the row's current
    /// photo counts as no new photo; a photo held by another row is rejected.
    pub async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: TobaccoPatch,
        new_photo: Option<&str>,
    ) -> Result<UpdateOutcome, CatalogError> {
        let new_locator = match new_photo {
            Some(raw) => {
                let locator = self.assets.bind(Some(raw)).await?;
                match photo_holder(self.db, &locator).await? {
                    None => Some(locator),
                    Some(holder) if holder == id => None,
                    Some(holder) => return Err(photo_in_use(&locator, holder)),
                }
            }
            None => None,
        };

        let (row, previous) = match self.write_update(id, patch, new_locator.as_ref()).await {
            Ok(written) => written,
            Err(e) => {
                if let Some(locator) = &new_locator {
                    self.discard_unbound(locator).await;
                }
                return Err(e);
            }
        };

        let retired = match (previous, &new_locator) {
            (Some(previous), Some(current)) => self.assets.retire(previous, current),
            _ => None,
        };

        info!(
            tobacco_id = %id,
            user_id = %owner_id,
            photo_replaced = retired.is_some(),
            "Tobacco updated"
        );

        let detail = self.compose(row, Some(owner_id)).await?;
        Ok(UpdateOutcome { detail, retired })
    }

    /// Permanently delete the row and return its pre-delete state.
    ///
    /// Dependent records and the photo are left alone.
    pub async fn remove(&self, id: Uuid) -> Result<tobacco::Model, CatalogError> {
        let txn = self.db.begin().await?;

        let snapshot = tobacco::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(CatalogError::NotFound(id))?;
        tobacco::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(snapshot)
    }

    /// Remove the row, then run the comment, rating and archive cascade.
    ///
    /// A failed cascade step yields [`CatalogError::PartialCascade`] but the
    /// row stays deleted. The photo is kept because the archive still
    /// references it.
    pub async fn delete(&self, id: Uuid) -> Result<Removal, CatalogError> {
        let snapshot = self.remove(id).await?;
        info!(tobacco_id = %id, "Tobacco removed");

        let report = ArchivalService::new(self.db).archive(&snapshot).await;
        if !report.is_complete() {
            warn!(
                tobacco_id = %id,
                failed = ?report.failed_steps(),
                "Removal committed with incomplete cascade"
            );
            return Err(CatalogError::PartialCascade(report));
        }

        Ok(Removal {
            archive_id: report.archive_id,
            snapshot,
        })
    }

    pub async fn comments(&self, id: Uuid) -> Result<Vec<CommentView>, CatalogError> {
        Ok(comments::feed(self.db, ProductKind::Tobacco, id).await?)
    }

    /// Discard `locator` unless some row has come to reference it meanwhile.
    async fn discard_unbound(&self, locator: &AssetLocator) {
        match photo_holder(self.db, locator).await {
            Ok(None) => self.assets.discard(locator).await,
            Ok(Some(holder)) => {
                debug!(asset = %locator, tobacco_id = %holder, "Upload is referenced, keeping it");
            }
            Err(e) => {
                warn!(asset = %locator, error = %e, "Could not check upload references, keeping it");
            }
        }
    }

    async fn insert(
        &self,
        attrs: NewTobacco,
        owner_id: Uuid,
        locator: &AssetLocator,
    ) -> Result<Uuid, CatalogError> {
        let name = validate_name(&attrs.name).map_err(CatalogError::Validation)?;
        require_fabricator(self.db, attrs.fabricator_id).await?;

        let now = Utc::now().trunc_subsecs(6);
        let model = tobacco::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            fabricator_id: Set(attrs.fabricator_id),
            description: Set(attrs.description),
            user_id: Set(owner_id),
            photo_url: Set(locator.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db)
        .await?;

        Ok(model.id)
    }

    /// Coalesce `patch` onto the stored row inside one transaction.
    ///
    /// Returns the updated row and, when a new photo was written, the
    /// locator it replaced.
    async fn write_update(
        &self,
        id: Uuid,
        patch: TobaccoPatch,
        new_locator: Option<&AssetLocator>,
    ) -> Result<(tobacco::Model, Option<AssetLocator>), CatalogError> {
        let txn = self.db.begin().await?;

        let existing = tobacco::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(CatalogError::NotFound(id))?;

        // A stored locator that no longer parses is left alone rather than retired.
        let previous = match new_locator {
            Some(_) => AssetLocator::parse(&existing.photo_url).ok(),
            None => None,
        };
        let last_updated = existing.updated_at;
        let mut active: tobacco::ActiveModel = existing.into();

        if let Some(name) = patch.name {
            active.name = Set(validate_name(&name).map_err(CatalogError::Validation)?);
        }
        if let Some(fabricator_id) = patch.fabricator_id {
            require_fabricator(&txn, fabricator_id).await?;
            active.fabricator_id = Set(fabricator_id);
        }
        if let Some(description) = patch.description {
            active.description = Set(Some(description));
        }
        if let Some(locator) = new_locator {
            active.photo_url = Set(locator.to_string());
        }
        active.updated_at = Set(advance_timestamp(last_updated));

        let model = active.update(&txn).await?;
        txn.commit().await?;

        Ok((model, previous))
    }

    async fn compose(
        &self,
        row: tobacco::Model,
        viewer: Option<Uuid>,
    ) -> Result<TobaccoDetail, CatalogError> {
        let fabricator = fabricator::Entity::find_by_id(row.fabricator_id)
            .one(self.db)
            .await?
            .map(|f| f.value);
        let agg = aggregate::for_tobacco(self.db, row.id, viewer).await?;

        Ok(TobaccoDetail {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            fabricator_id: row.fabricator_id,
            fabricator,
            description: row.description,
            photo_url: row.photo_url,
            is_favorite: agg.is_favorite,
            rating: agg.rating,
            ratings_quantity: agg.ratings_quantity,
            my_rating: agg.my_rating,
            is_rated: agg.is_rated,
            mark_quantity: agg.mark_quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Next `updated_at`: now at microsecond precision, but strictly after `previous`.
fn advance_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now().trunc_subsecs(6);
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

/// Id of the tobacco, live or archived, whose photo is `locator`.
async fn photo_holder<C: ConnectionTrait>(
    conn: &C,
    locator: &AssetLocator,
) -> Result<Option<Uuid>, DbErr> {
    let live = tobacco::Entity::find()
        .filter(tobacco::Column::PhotoUrl.eq(locator.as_str()))
        .one(conn)
        .await?;
    if let Some(row) = live {
        return Ok(Some(row.id));
    }

    Ok(deleted_tobacco::Entity::find()
        .filter(deleted_tobacco::Column::PhotoUrl.eq(locator.as_str()))
        .one(conn)
        .await?
        .map(|row| row.tobacco_id))
}

fn photo_in_use(locator: &AssetLocator, holder: Uuid) -> CatalogError {
    CatalogError::Validation(format!("Photo {locator} already belongs to tobacco {holder}"))
}

async fn require_fabricator<C: ConnectionTrait>(
    conn: &C,
    fabricator_id: Uuid,
) -> Result<(), CatalogError> {
    fabricator::Entity::find_by_id(fabricator_id)
        .one(conn)
        .await?
        .map(|_| ())
        .ok_or_else(|| CatalogError::Validation(format!("Unknown fabricator {fabricator_id}")))
}

async fn fabricator_names<C: ConnectionTrait>(
    conn: &C,
    mut ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, String>, CatalogError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    ids.sort_unstable();
    ids.dedup();

    Ok(fabricator::Entity::find()
        .filter(fabricator::Column::Id.is_in(ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|f| (f.id, f.value))
        .collect())
}
