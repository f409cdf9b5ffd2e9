use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Discussion record attached to any product kind through `entity_type`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(indexed)]
    pub entity_id: Uuid,

    /// Product kind discriminator (e.g. "tobacco").
    #[sea_orm(indexed)]
    pub entity_type: String,

    pub user_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub comment_text: String,

    #[sea_orm(default_value = false)]
    pub is_deleted: bool,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
