use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use tracing::{error, info};
use uuid::Uuid;

use super::ProductKind;
use crate::entity::{comment, deleted_tobacco, tobacco, tobacco_rating};

/// One of the independent cleanup steps run after a tobacco row is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeStep {
    Comments,
    Ratings,
    Archive,
}

/// Result of a single cascade step.
#[derive(Debug)]
pub enum StepOutcome {
    Done { rows_affected: u64 },
    Failed(DbErr),
}

impl StepOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, StepOutcome::Done { .. })
    }
}

impl From<Result<u64, DbErr>> for StepOutcome {
    fn from(result: Result<u64, DbErr>) -> Self {
        match result {
            Ok(rows_affected) => StepOutcome::Done { rows_affected },
            Err(e) => StepOutcome::Failed(e),
        }
    }
}

/// Per-step outcome of a removal cascade. Steps commit independently; a
/// failed step is never retried and never restores the removed row.
#[derive(Debug)]
pub struct CascadeReport {
    pub tobacco_id: Uuid,
    /// Id the archive snapshot was (or would have been) inserted under.
    pub archive_id: Uuid,
    pub comments: StepOutcome,
    pub ratings: StepOutcome,
    pub archive: StepOutcome,
}

impl CascadeReport {
    pub fn steps(&self) -> [(CascadeStep, &StepOutcome); 3] {
        [
            (CascadeStep::Comments, &self.comments),
            (CascadeStep::Ratings, &self.ratings),
            (CascadeStep::Archive, &self.archive),
        ]
    }

    pub fn is_complete(&self) -> bool {
        self.steps().iter().all(|(_, outcome)| outcome.is_done())
    }

    pub fn failed_steps(&self) -> Vec<CascadeStep> {
        self.steps()
            .into_iter()
            .filter(|(_, outcome)| !outcome.is_done())
            .map(|(step, _)| step)
            .collect()
    }
}

pub struct ArchivalService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> ArchivalService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Run the removal cascade for an already-deleted row.
    ///
    /// Comments, ratings and the archive insert are dispatched together and
    /// all three run to completion regardless of each other's outcome.
    pub async fn archive(&self, removed: &tobacco::Model) -> CascadeReport {
        let archive_id = Uuid::new_v4();

        let (comments, ratings, archive) = tokio::join!(
            self.delete_comments(removed.id),
            self.delete_ratings(removed.id),
            self.insert_snapshot(archive_id, removed),
        );

        let report = CascadeReport {
            tobacco_id: removed.id,
            archive_id,
            comments: comments.into(),
            ratings: ratings.into(),
            archive: archive.into(),
        };

        for (step, outcome) in report.steps() {
            match outcome {
                StepOutcome::Done { rows_affected } => info!(
                    tobacco_id = %removed.id,
                    ?step,
                    rows_affected,
                    "Cascade step finished"
                ),
                StepOutcome::Failed(e) => error!(
                    tobacco_id = %removed.id,
                    ?step,
                    error = %e,
                    "Cascade step failed after removal"
                ),
            }
        }

        report
    }

    /// Archive snapshots recorded for a removed tobacco id, oldest first.
    pub async fn find_archived(
        &self,
        tobacco_id: Uuid,
    ) -> Result<Vec<deleted_tobacco::Model>, DbErr> {
        deleted_tobacco::Entity::find()
            .filter(deleted_tobacco::Column::TobaccoId.eq(tobacco_id))
            .order_by_asc(deleted_tobacco::Column::DeletedAt)
            .all(self.conn)
            .await
    }

    async fn delete_comments(&self, tobacco_id: Uuid) -> Result<u64, DbErr> {
        let res = comment::Entity::delete_many()
            .filter(comment::Column::EntityType.eq(ProductKind::Tobacco.as_str()))
            .filter(comment::Column::EntityId.eq(tobacco_id))
            .exec(self.conn)
            .await?;
        Ok(res.rows_affected)
    }

    async fn delete_ratings(&self, tobacco_id: Uuid) -> Result<u64, DbErr> {
        let res = tobacco_rating::Entity::delete_many()
            .filter(tobacco_rating::Column::TobaccoId.eq(tobacco_id))
            .exec(self.conn)
            .await?;
        Ok(res.rows_affected)
    }

    async fn insert_snapshot(
        &self,
        archive_id: Uuid,
        removed: &tobacco::Model,
    ) -> Result<u64, DbErr> {
        deleted_tobacco::ActiveModel {
            deleted_id: Set(archive_id),
            tobacco_id: Set(removed.id),
            name: Set(removed.name.clone()),
            fabricator_id: Set(removed.fabricator_id),
            description: Set(removed.description.clone()),
            photo_url: Set(removed.photo_url.clone()),
            user_id: Set(removed.user_id),
            created_at: Set(removed.created_at),
            updated_at: Set(removed.updated_at),
            deleted_at: Set(Utc::now()),
        }
        .insert(self.conn)
        .await?;
        Ok(1)
    }
}
