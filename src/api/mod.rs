pub mod auth;
pub mod cattle;
pub mod error;
pub mod middleware;
pub mod stats;
pub mod weights;

use axum::{
    routing::{delete, get, post},
    Extension, Router,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use tower_cookies::{CookieManagerLayer, Key};

pub(crate) fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

async fn health_check() -> &'static str {
    "OK"
}

/// All application routes. Tracing, metrics and CORS are layered on by the binary.
pub fn router(db: DatabaseConnection, session_key: Key) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/stats/summary", get(stats::summary))
        .route("/stats/color", get(stats::color))
        .route("/stats/breed", get(stats::breed))
        .route("/stats/births", get(stats::births))
        .route("/stats/growth", get(stats::growth));

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/cattle", get(cattle::list_cattle).post(cattle::create_cattle))
        .route(
            "/cattle/:id",
            get(cattle::get_cattle)
                .patch(cattle::update_cattle)
                .delete(cattle::delete_cattle),
        )
        .route("/cattle/:id/archive", post(cattle::archive_cattle))
        .route("/cattle/:id/lineage", get(cattle::get_lineage))
        .route(
            "/cattle/:id/weights",
            get(weights::list_weights).post(weights::record_weight),
        )
        .route("/cattle/:id/weights/:weight_id", delete(weights::delete_weight))
        .route_layer(axum::middleware::from_fn(middleware::auth_middleware));

    public_routes
        .merge(protected_routes)
        .layer(Extension(db))
        .layer(Extension(middleware::SessionKey(session_key)))
        .layer(CookieManagerLayer::new())
}
