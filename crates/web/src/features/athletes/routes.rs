use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use super::handlers::{
    create_athlete, delete_athlete, export_csv, get_athlete, import_csv, list_athletes,
    partial_update_athlete, update_athlete,
};
use crate::middleware::auth::{ApiKeys, require_auth};
use crate::state::AppState;

pub fn routes(api_keys: ApiKeys) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_athlete))
        .route(
            "/:id",
            put(update_athlete)
                .patch(partial_update_athlete)
                .delete(delete_athlete),
        )
        .route("/import_csv", post(import_csv))
        .route("/export_csv", get(export_csv))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/", get(list_athletes))
        .route("/:id", get(get_athlete))
        .merge(protected)
}
