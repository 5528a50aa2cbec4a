use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

use crate::entities::{
    animal::{self, Status},
    Animal,
};

/// Seeds the herd gauges from the database; failures leave them at zero.
pub async fn init_metrics(db: &DatabaseConnection) {
    let active = count_with_status(db, Status::Active).await;
    let archived = count_with_status(db, Status::Archived).await;

    metrics::gauge!("herdbook_cattle_total", "status" => "active").set(active as f64);
    metrics::gauge!("herdbook_cattle_total", "status" => "archived").set(archived as f64);

    tracing::info!(
        "Initialized metrics: active cattle={}, archived cattle={}",
        active,
        archived
    );
}

async fn count_with_status(db: &DatabaseConnection, status: Status) -> u64 {
    match Animal::find()
        .filter(animal::Column::Status.eq(status))
        .count(db)
        .await
    {
        Ok(count) => count,
        Err(e) => {
            tracing::warn!("Failed to count cattle for metrics: {}", e);
            0
        }
    }
}

fn status_label(status: Status) -> &'static str {
    match status {
        Status::Active => "active",
        Status::Archived => "archived",
    }
}

pub fn record_cattle_created(status: Status) {
    metrics::counter!("herdbook_cattle_created_total").increment(1);
    metrics::gauge!("herdbook_cattle_total", "status" => status_label(status)).increment(1.0);
}

pub fn record_status_change(from: Status, to: Status) {
    if from == to {
        return;
    }
    metrics::gauge!("herdbook_cattle_total", "status" => status_label(from)).decrement(1.0);
    metrics::gauge!("herdbook_cattle_total", "status" => status_label(to)).increment(1.0);
}

pub fn record_cattle_deleted(status: Status) {
    metrics::gauge!("herdbook_cattle_total", "status" => status_label(status)).decrement(1.0);
}

pub fn record_weight_logged() {
    metrics::counter!("herdbook_weight_logs_recorded_total").increment(1);
}

pub fn record_lineage_request() {
    metrics::counter!("herdbook_lineage_requests_total").increment(1);
}
