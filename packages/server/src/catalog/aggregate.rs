use std::collections::HashMap;

use sea_orm::prelude::Expr;
use sea_orm::sea_query::Func;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
};
use uuid::Uuid;

use crate::entity::{favorite_tobacco, tobacco_rating};

/// Sum and count of the rating rows of one tobacco.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingStats {
    pub total: i64,
    pub count: i64,
}

impl RatingStats {
    /// Mean rating rounded to one decimal place, half away from zero; 0 without ratings.
    ///
    /// Rounds on the exact fraction so `89 / 20` gives `4.5`, matching decimal
    /// `ROUND(x, 1)` rather than binary float rounding.
    pub fn average(&self) -> f64 {
        if self.count <= 0 {
            return 0.0;
        }
        let scaled = self.total * 10;
        let mut tenths = scaled / self.count;
        let remainder = (scaled % self.count).abs();
        if remainder * 2 >= self.count {
            tenths += scaled.signum();
        }
        tenths as f64 / 10.0
    }
}

/// Derived read-time values for one tobacco, personalized to a viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Aggregates {
    pub rating: f64,
    pub ratings_quantity: u64,
    pub is_rated: bool,
    pub my_rating: i32,
    pub is_favorite: bool,
    pub mark_quantity: u64,
}

pub(crate) async fn rating_stats<C: ConnectionTrait>(
    conn: &C,
    tobacco_id: Uuid,
) -> Result<RatingStats, DbErr> {
    let row: Option<(Option<i64>, i64)> = tobacco_rating::Entity::find()
        .select_only()
        .column_as(
            Expr::expr(Func::sum(Expr::col(tobacco_rating::Column::Value))),
            "total",
        )
        .column_as(
            Expr::expr(Func::count(Expr::col(tobacco_rating::Column::Value))),
            "count",
        )
        .filter(tobacco_rating::Column::TobaccoId.eq(tobacco_id))
        .into_tuple()
        .one(conn)
        .await?;

    Ok(row
        .map(|(total, count)| RatingStats {
            total: total.unwrap_or(0),
            count,
        })
        .unwrap_or_default())
}

/// Average rating of every tobacco that has at least one rating.
pub(crate) async fn rating_averages<C: ConnectionTrait>(
    conn: &C,
) -> Result<HashMap<Uuid, f64>, DbErr> {
    let rows: Vec<(Uuid, Option<i64>, i64)> = tobacco_rating::Entity::find()
        .select_only()
        .column(tobacco_rating::Column::TobaccoId)
        .column_as(
            Expr::expr(Func::sum(Expr::col(tobacco_rating::Column::Value))),
            "total",
        )
        .column_as(
            Expr::expr(Func::count(Expr::col(tobacco_rating::Column::Value))),
            "count",
        )
        .group_by(tobacco_rating::Column::TobaccoId)
        .into_tuple()
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(id, total, count)| {
            let stats = RatingStats {
                total: total.unwrap_or(0),
                count,
            };
            (id, stats.average())
        })
        .collect())
}

/// Compose every aggregate for `tobacco_id`. A missing viewer leaves the
/// personalized fields at their defaults.
pub(crate) async fn for_tobacco<C: ConnectionTrait>(
    conn: &C,
    tobacco_id: Uuid,
    viewer: Option<Uuid>,
) -> Result<Aggregates, DbErr> {
    let stats = rating_stats(conn, tobacco_id).await?;

    let mark_quantity = favorite_tobacco::Entity::find()
        .filter(favorite_tobacco::Column::TobaccoId.eq(tobacco_id))
        .count(conn)
        .await?;

    let mut aggregates = Aggregates {
        rating: stats.average(),
        ratings_quantity: u64::try_from(stats.count).unwrap_or(0),
        mark_quantity,
        ..Default::default()
    };

    if let Some(viewer) = viewer {
        if let Some(own) = tobacco_rating::Entity::find_by_id((tobacco_id, viewer))
            .one(conn)
            .await?
        {
            aggregates.is_rated = true;
            aggregates.my_rating = own.value;
        }

        aggregates.is_favorite = favorite_tobacco::Entity::find_by_id((tobacco_id, viewer))
            .one(conn)
            .await?
            .is_some();
    }

    Ok(aggregates)
}
