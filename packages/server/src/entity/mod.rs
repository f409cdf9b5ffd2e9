pub mod comment;
pub mod deleted_tobacco;
pub mod fabricator;
pub mod favorite_tobacco;
pub mod tobacco;
pub mod tobacco_rating;
pub mod user;
