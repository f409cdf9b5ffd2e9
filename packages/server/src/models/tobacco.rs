use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Row of the catalog listing.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TobaccoSummary {
    pub id: Uuid,
    #[schema(example = "uploads/tobaccos/0b6f6c8e-3a51-4f0e-9d55-1f3c2f9a8e11.jpg")]
    pub photo_url: String,
    #[schema(example = "Blue Mist")]
    pub name: String,
    /// Fabricator display name, if the fabricator row exists.
    #[schema(example = "Starbuzz")]
    pub fabricator: Option<String>,
    pub fabricator_id: Uuid,
    /// Average rating rounded to one decimal, 0 when unrated.
    #[schema(example = 4.5)]
    pub rating: f64,
}

/// Full view of one tobacco, personalized to the requesting viewer.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TobaccoDetail {
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    #[schema(example = "Blue Mist")]
    pub name: String,
    pub fabricator_id: Uuid,
    #[schema(example = "Starbuzz")]
    pub fabricator: Option<String>,
    pub description: Option<String>,
    pub photo_url: String,
    pub is_favorite: bool,
    #[schema(example = 4.5)]
    pub rating: f64,
    #[schema(example = 2)]
    pub ratings_quantity: u64,
    /// Viewer's own rating, 0 when not rated or anonymous.
    pub my_rating: i32,
    pub is_rated: bool,
    /// Number of users who marked this tobacco as favorite.
    pub mark_quantity: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub tobacco_id: Uuid,
    pub user_id: Uuid,
    #[schema(example = "smokey")]
    pub login: String,
    pub user_avatar_url: Option<String>,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CreatedTobacco {
    pub id: Uuid,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemovedTobacco {
    pub id: Uuid,
    /// Id of the archive snapshot taken at removal.
    pub archive_id: Uuid,
}
