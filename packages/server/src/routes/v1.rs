use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/tobaccos", tobacco_routes())
}

fn tobacco_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::tobacco::create_tobacco,
            handlers::tobacco::list_tobaccos
        ))
        .routes(routes!(
            handlers::tobacco::get_tobacco,
            handlers::tobacco::update_tobacco,
            handlers::tobacco::delete_tobacco
        ))
        .routes(routes!(handlers::tobacco::list_tobacco_comments))
        .layer(handlers::tobacco::tobacco_upload_body_limit())
}
