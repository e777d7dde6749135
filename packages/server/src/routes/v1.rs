use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/resources", resource_routes(config))
        .nest("/admin", admin_routes())
}

fn resource_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::resource::upload_file))
        .layer(handlers::resource::upload_body_limit(
            config.storage.max_object_size,
        ));

    OpenApiRouter::new()
        .routes(routes!(handlers::resource::create_link))
        .routes(routes!(handlers::resource::list_week_resources))
        .routes(routes!(handlers::resource::list_user_resources))
        .routes(routes!(handlers::resource::get_object_url))
        .routes(routes!(handlers::resource::delete_resource))
        .merge(upload)
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::admin::collect_orphans))
}
