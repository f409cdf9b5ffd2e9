use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Insert-only snapshot of a tobacco row taken when it was removed.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "deleted_tobacco")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub deleted_id: Uuid,

    /// Id the row had while it was live.
    #[sea_orm(indexed)]
    pub tobacco_id: Uuid,

    pub name: String,
    pub fabricator_id: Uuid,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub photo_url: String,
    pub user_id: Uuid,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub deleted_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
