use std::time::Duration;

use axum::{Router, extract::DefaultBodyLimit};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
pub mod error;
pub mod features;
pub mod middleware;
pub mod state;

use features::athletes;
use middleware::auth::ApiKeys;
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        athletes::handlers::list_athletes,
        athletes::handlers::get_athlete,
        athletes::handlers::create_athlete,
        athletes::handlers::update_athlete,
        athletes::handlers::partial_update_athlete,
        athletes::handlers::delete_athlete,
        athletes::handlers::import_csv,
        athletes::handlers::export_csv,
    ),
    components(
        schemas(
            storage::dto::athlete::AthletePayload,
            storage::dto::athlete::AthleteResponse,
            storage::models::Athlete,
            importer::ImportSummary,
            athletes::handlers::ImportUpload,
        )
    ),
    tags(
        (name = "athletes", description = "Athlete records, CSV import and export"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("API Key")
                        .build(),
                ),
            )
        }
    }
}

/// Builds the full application router.
pub fn app(state: AppState, api_keys: ApiKeys, upload_limit_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .nest("/api/athletes", athletes::routes::routes(api_keys))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(upload_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
