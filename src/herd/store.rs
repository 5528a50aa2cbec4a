use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use super::error::HerdResult;
use crate::entities::{
    animal::{self, Status},
    weight_log, Animal, WeightLog,
};

/// Read-only view of the herd records.
///
/// Lineage and statistics only ever go through this trait, so they can be
/// exercised against an in-memory herd as well as the database.
#[async_trait]
pub trait HerdStore: Send + Sync {
    async fn find_animal(&self, id: i32) -> HerdResult<Option<animal::Model>>;

    /// All animals, optionally restricted to one lifecycle status, ordered by id.
    async fn list_animals(&self, status: Option<Status>) -> HerdResult<Vec<animal::Model>>;

    /// Weight logs of one animal, oldest observation first.
    async fn weights_for_animal(&self, id: i32) -> HerdResult<Vec<weight_log::Model>>;

    /// Weight logs of several animals, oldest observation first.
    async fn weights_for_animals(&self, ids: &[i32]) -> HerdResult<Vec<weight_log::Model>>;
}

pub struct SeaOrmHerdStore<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> SeaOrmHerdStore<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl HerdStore for SeaOrmHerdStore<'_> {
    async fn find_animal(&self, id: i32) -> HerdResult<Option<animal::Model>> {
        Ok(Animal::find_by_id(id).one(self.db).await?)
    }

    async fn list_animals(&self, status: Option<Status>) -> HerdResult<Vec<animal::Model>> {
        let mut query = Animal::find().order_by_asc(animal::Column::Id);
        if let Some(status) = status {
            query = query.filter(animal::Column::Status.eq(status));
        }
        Ok(query.all(self.db).await?)
    }

    async fn weights_for_animal(&self, id: i32) -> HerdResult<Vec<weight_log::Model>> {
        Ok(WeightLog::find()
            .filter(weight_log::Column::CattleId.eq(id))
            .order_by_asc(weight_log::Column::MeasuredAt)
            .order_by_asc(weight_log::Column::CreatedAt)
            .order_by_asc(weight_log::Column::Id)
            .all(self.db)
            .await?)
    }

    async fn weights_for_animals(&self, ids: &[i32]) -> HerdResult<Vec<weight_log::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(WeightLog::find()
            .filter(weight_log::Column::CattleId.is_in(ids.iter().copied()))
            .order_by_asc(weight_log::Column::MeasuredAt)
            .order_by_asc(weight_log::Column::CreatedAt)
            .order_by_asc(weight_log::Column::Id)
            .all(self.db)
            .await?)
    }
}
