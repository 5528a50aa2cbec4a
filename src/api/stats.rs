use axum::extract::{Extension, Json, Query};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use super::error::{ApiError, ApiResult};
use super::today;
use crate::herd::{
    stats::{self, Distribution, GrowthCohort, Summary, YearCount},
    SeaOrmHerdStore,
};

fn record_action(action: &str, table: &str) {
    tracing::Span::current()
        .record("table", table)
        .record("action", action);
}

// GET /stats/summary
pub async fn summary(Extension(db): Extension<DatabaseConnection>) -> ApiResult<Json<Summary>> {
    record_action("stats_summary", "cattle");
    Ok(Json(stats::summary(&SeaOrmHerdStore::new(&db), today()).await?))
}

// GET /stats/color
pub async fn color(Extension(db): Extension<DatabaseConnection>) -> ApiResult<Json<Distribution>> {
    record_action("stats_color", "cattle");
    Ok(Json(stats::color_distribution(&SeaOrmHerdStore::new(&db)).await?))
}

// GET /stats/breed
pub async fn breed(Extension(db): Extension<DatabaseConnection>) -> ApiResult<Json<Distribution>> {
    record_action("stats_breed", "cattle");
    Ok(Json(stats::breed_distribution(&SeaOrmHerdStore::new(&db)).await?))
}

// GET /stats/births
pub async fn births(
    Extension(db): Extension<DatabaseConnection>,
) -> ApiResult<Json<Vec<YearCount>>> {
    record_action("stats_births", "cattle");
    Ok(Json(stats::births_per_year(&SeaOrmHerdStore::new(&db), today()).await?))
}

#[derive(Debug, Deserialize)]
pub struct GrowthQuery {
    year: Option<String>,
}

// GET /stats/growth?year=YYYY
pub async fn growth(
    Extension(db): Extension<DatabaseConnection>,
    Query(query): Query<GrowthQuery>,
) -> ApiResult<Json<GrowthCohort>> {
    record_action("stats_growth", "cattle,weight_logs");

    let year = query
        .year
        .as_deref()
        .map(str::trim)
        .filter(|y| !y.is_empty())
        .ok_or_else(|| ApiError::Validation("Query parameter 'year' is required".to_string()))?
        .parse::<i32>()
        .map_err(|_| ApiError::Validation("Query parameter 'year' must be an integer".to_string()))?;

    Ok(Json(
        stats::growth_cohort(&SeaOrmHerdStore::new(&db), year, today()).await?,
    ))
}
