use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A live catalog entry. Every row is bound to exactly one photo asset.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tobacco")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,

    #[sea_orm(indexed)]
    pub fabricator_id: Uuid,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Owning user.
    pub user_id: Uuid,

    /// Asset locator, e.g. `uploads/tobaccos/<uuid>.jpg`.
    #[sea_orm(unique)]
    pub photo_url: String,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
