use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One rating per (tobacco, user) pair.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tobacco_rating")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub tobacco_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,

    pub value: i32,
}

impl ActiveModelBehavior for ActiveModel {}
