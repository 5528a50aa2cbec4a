use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
};
use serde::Deserialize;

use super::error::{is_unique_violation, ApiError, ApiResult};
use super::middleware::CurrentUser;
use super::today;
use crate::entities::{weight_log, Animal, WeightLog};
use crate::herd::{HerdStore, SeaOrmHerdStore};

const MAX_METHOD_LEN: usize = 24;

async fn ensure_cattle_exists(db: &DatabaseConnection, cattle_id: i32) -> ApiResult<()> {
    match Animal::find_by_id(cattle_id).one(db).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound(format!("Cattle {} not found", cattle_id))),
    }
}

// GET /cattle/:id/weights
pub async fn list_weights(
    Extension(db): Extension<DatabaseConnection>,
    Path(cattle_id): Path<i32>,
) -> ApiResult<Json<Vec<weight_log::Model>>> {
    ensure_cattle_exists(&db, cattle_id).await?;
    let logs = SeaOrmHerdStore::new(&db).weights_for_animal(cattle_id).await?;
    Ok(Json(logs))
}

#[derive(Debug, Deserialize)]
pub struct RecordWeightRequest {
    measured_at: NaiveDate,
    weight_kg: f64,
    method: Option<String>,
    notes: Option<String>,
}

// POST /cattle/:id/weights
pub async fn record_weight(
    Extension(db): Extension<DatabaseConnection>,
    Extension(user): Extension<CurrentUser>,
    Path(cattle_id): Path<i32>,
    Json(payload): Json<RecordWeightRequest>,
) -> ApiResult<Response> {
    user.require_admin()?;
    ensure_cattle_exists(&db, cattle_id).await?;

    if !payload.weight_kg.is_finite() || payload.weight_kg <= 0.0 {
        return Err(ApiError::Validation("Weight must be greater than zero".to_string()));
    }
    if payload.measured_at > today() {
        return Err(ApiError::Validation(
            "Measurement date cannot be in the future".to_string(),
        ));
    }
    let method = payload
        .method
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty());
    if method.as_ref().is_some_and(|m| m.chars().count() > MAX_METHOD_LEN) {
        return Err(ApiError::Validation(format!(
            "Method must be at most {} characters",
            MAX_METHOD_LEN
        )));
    }

    let new_log = weight_log::ActiveModel {
        cattle_id: Set(cattle_id),
        measured_at: Set(payload.measured_at),
        weight_kg: Set(payload.weight_kg),
        method: Set(method),
        notes: Set(payload.notes.filter(|n| !n.trim().is_empty())),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };

    match new_log.insert(&db).await {
        Ok(log) => {
            tracing::Span::current()
                .record("table", "weight_logs")
                .record("action", "record_weight")
                .record("cattle_id", cattle_id)
                .record("business_event", "Weight recorded");
            crate::metrics::record_weight_logged();

            Ok((StatusCode::CREATED, Json(log)).into_response())
        }
        Err(e) if is_unique_violation(&e) => Err(ApiError::Conflict(format!(
            "A weight for {} is already recorded",
            payload.measured_at
        ))),
        Err(e) => Err(e.into()),
    }
}

// DELETE /cattle/:id/weights/:weight_id
pub async fn delete_weight(
    Extension(db): Extension<DatabaseConnection>,
    Extension(user): Extension<CurrentUser>,
    Path((cattle_id, weight_id)): Path<(i32, i32)>,
) -> ApiResult<StatusCode> {
    user.require_admin()?;

    let log = WeightLog::find_by_id(weight_id)
        .filter(weight_log::Column::CattleId.eq(cattle_id))
        .one(&db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Weight log {} not found", weight_id)))?;

    log.delete(&db).await?;

    tracing::Span::current()
        .record("table", "weight_logs")
        .record("action", "delete_weight")
        .record("cattle_id", cattle_id)
        .record("business_event", "Weight log deleted");

    Ok(StatusCode::NO_CONTENT)
}
