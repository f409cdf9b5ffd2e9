use std::collections::HashMap;

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use super::ProductKind;
use crate::entity::{comment, user};
use crate::models::tobacco::CommentView;

/// Comments on one product joined with their authors, oldest first.
///
/// The soft-delete flag is not consulted here. Comments whose author row is
/// missing are dropped, as an inner join would.
pub(crate) async fn feed<C: ConnectionTrait>(
    conn: &C,
    kind: ProductKind,
    entity_id: Uuid,
) -> Result<Vec<CommentView>, DbErr> {
    let comments = comment::Entity::find()
        .filter(comment::Column::EntityType.eq(kind.as_str()))
        .filter(comment::Column::EntityId.eq(entity_id))
        .order_by_asc(comment::Column::CreatedAt)
        .all(conn)
        .await?;

    if comments.is_empty() {
        return Ok(Vec::new());
    }

    let mut user_ids: Vec<Uuid> = comments.iter().map(|c| c.user_id).collect();
    user_ids.sort_unstable();
    user_ids.dedup();

    let authors: HashMap<Uuid, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    Ok(comments
        .into_iter()
        .filter_map(|c| {
            let author = authors.get(&c.user_id)?;
            Some(CommentView {
                id: c.id,
                tobacco_id: c.entity_id,
                user_id: author.id,
                login: author.login.clone(),
                user_avatar_url: author.avatar_url.clone(),
                text: c.comment_text,
                created_at: c.created_at,
                updated_at: c.updated_at,
            })
        })
        .collect())
}
