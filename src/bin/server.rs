use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use herdbook::{api, config::AppConfig, migrator};
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    herdbook::telemetry::init_telemetry("herdbook");

    let config = AppConfig::from_env()?;

    let mut options = ConnectOptions::new(config.database_url.clone());
    options.sqlx_logging(false);
    let db = Database::connect(options).await?;

    if config.run_migrations {
        migrator::Migrator::up(&db, None).await?;
        tracing::info!("Migrations applied");
    }

    herdbook::metrics::init_metrics(&db).await;

    let cors_origin = config.cors_origin.parse::<HeaderValue>()?;
    let app = app(api::router(db, config.session_key.clone()), cors_origin);

    tracing::info!("listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn app(routes: Router, cors_origin: HeaderValue) -> Router {
    let (prometheus_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();

    routes
        .layer(prometheus_layer)
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<axum::body::Body>| {
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched| matched.as_str());

                    // "METHOD /route", e.g. "GET /cattle/:id/lineage"
                    let span_name = match matched_path {
                        Some(path) => format!("{} {}", request.method(), path),
                        None => format!("{} {}", request.method(), request.uri().path()),
                    };

                    let user_ip = request
                        .headers()
                        .get("x-forwarded-for")
                        .or_else(|| request.headers().get("x-real-ip"))
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");

                    tracing::info_span!(
                        "request",
                        "otel.name" = span_name,
                        user_ip = user_ip,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        // Filled in by handlers and the auth middleware
                        table = tracing::field::Empty,
                        action = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        user_email = tracing::field::Empty,
                        cattle_id = tracing::field::Empty,
                        business_event = tracing::field::Empty,
                        error = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency = tracing::field::Empty,
                    )
                })
                .on_request(|_request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {})
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                        span.record("status", tracing::field::display(response.status()));
                        span.record("latency", tracing::field::debug(latency));
                        tracing::info!("request completed");
                    },
                ),
        )
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(cors_origin)
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE])
                .allow_credentials(true),
        )
        .route("/metrics", get(|| async move { metric_handle.render() }))
}
