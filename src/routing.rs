//! Application router configuration.

use axum::{
    Router,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;

use crate::{
    AppState, Error, endpoints,
    record::{
        create_record_endpoint, delete_record_endpoint, list_records_endpoint,
        update_record_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// Cross-origin requests are allowed from any origin, since browser clients
/// are usually served from a different host than the record store.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::RECORDS, post(create_record_endpoint))
        .route(endpoints::RECORDS_BY_USER, get(list_records_endpoint))
        .route(
            endpoints::RECORD,
            put(update_record_endpoint).delete(delete_record_endpoint),
        )
        .fallback(get_404_not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}
