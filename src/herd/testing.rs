//! In-memory herd and record builders shared by the read-model tests.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::DbErr;

use super::error::HerdResult;
use super::store::HerdStore;
use crate::entities::{
    animal::{self, HornStatus, Sex, Status},
    weight_log,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn stamp() -> NaiveDateTime {
    date(2026, 1, 1).and_hms_opt(0, 0, 0).unwrap()
}

pub fn animal(id: i32, ear_tag: &str, sex: Sex) -> animal::Model {
    animal::Model {
        id,
        ear_tag: ear_tag.to_string(),
        name: None,
        sex,
        castrated: false,
        date_of_birth: None,
        color: None,
        breed: None,
        horn_status: HornStatus::Polled,
        status: Status::Active,
        mother_id: None,
        father_id: None,
        notes: None,
        created_at: stamp(),
        updated_at: stamp(),
    }
}

pub fn weight(id: i32, cattle_id: i32, measured_at: NaiveDate, weight_kg: f64) -> weight_log::Model {
    weight_log::Model {
        id,
        cattle_id,
        measured_at,
        weight_kg,
        method: None,
        notes: None,
        created_at: stamp(),
    }
}

#[derive(Default)]
pub struct MemoryHerd {
    pub animals: Vec<animal::Model>,
    pub weights: Vec<weight_log::Model>,
    pub broken: bool,
}

impl MemoryHerd {
    pub fn new(animals: Vec<animal::Model>) -> Self {
        Self {
            animals,
            ..Default::default()
        }
    }

    pub fn with_weights(mut self, weights: Vec<weight_log::Model>) -> Self {
        self.weights = weights;
        self
    }

    /// A store whose every read fails like an unreachable database.
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Default::default()
        }
    }

    fn check(&self) -> HerdResult<()> {
        if self.broken {
            return Err(DbErr::Conn(sea_orm::RuntimeErr::Internal("connection refused".into())).into());
        }
        Ok(())
    }

    fn sorted_weights(&self, keep: impl Fn(&weight_log::Model) -> bool) -> Vec<weight_log::Model> {
        let mut logs: Vec<_> = self.weights.iter().filter(|w| keep(w)).cloned().collect();
        logs.sort_by_key(|w| (w.measured_at, w.created_at, w.id));
        logs
    }
}

#[async_trait]
impl HerdStore for MemoryHerd {
    async fn find_animal(&self, id: i32) -> HerdResult<Option<animal::Model>> {
        self.check()?;
        Ok(self.animals.iter().find(|a| a.id == id).cloned())
    }

    async fn list_animals(&self, status: Option<Status>) -> HerdResult<Vec<animal::Model>> {
        self.check()?;
        let mut animals: Vec<_> = self
            .animals
            .iter()
            .filter(|a| status.map_or(true, |s| a.status == s))
            .cloned()
            .collect();
        animals.sort_by_key(|a| a.id);
        Ok(animals)
    }

    async fn weights_for_animal(&self, id: i32) -> HerdResult<Vec<weight_log::Model>> {
        self.check()?;
        Ok(self.sorted_weights(|w| w.cattle_id == id))
    }

    async fn weights_for_animals(&self, ids: &[i32]) -> HerdResult<Vec<weight_log::Model>> {
        self.check()?;
        Ok(self.sorted_weights(|w| ids.contains(&w.cattle_id)))
    }
}
