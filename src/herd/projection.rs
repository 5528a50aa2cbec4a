use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::age::{age_in_months, role_label, RoleLabel};
use crate::entities::{
    animal::{self, HornStatus, Sex, Status},
    weight_log,
};

/// Trimmed view of an animal used wherever it shows up as somebody's relative.
///
/// Kept separate from the entity so the lineage contract does not move when
/// the `cattle` table does.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnimalBasic {
    pub id: i32,
    pub ear_tag: String,
    pub name: Option<String>,
    pub sex: Sex,
    pub date_of_birth: Option<NaiveDate>,
    pub color: Option<String>,
    pub breed: Option<String>,
    pub horn_status: HornStatus,
    pub age_in_months: Option<u32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl AnimalBasic {
    pub fn project(model: &animal::Model, today: NaiveDate) -> Self {
        Self {
            id: model.id,
            ear_tag: model.ear_tag.clone(),
            name: model.name.clone(),
            sex: model.sex,
            date_of_birth: model.date_of_birth,
            color: model.color.clone(),
            breed: model.breed.clone(),
            horn_status: model.horn_status,
            age_in_months: age_in_months(model.date_of_birth, today),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Full record plus the read-time derived fields.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnimalDetail {
    pub id: i32,
    pub ear_tag: String,
    pub name: Option<String>,
    pub sex: Sex,
    pub castrated: bool,
    pub role: RoleLabel,
    pub date_of_birth: Option<NaiveDate>,
    pub color: Option<String>,
    pub breed: Option<String>,
    pub horn_status: HornStatus,
    pub status: Status,
    pub mother: Option<i32>,
    pub father: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mother_details: Option<AnimalBasic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub father_details: Option<AnimalBasic>,
    pub notes: Option<String>,
    pub age_in_months: Option<u32>,
    pub latest_weight: Option<f64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl AnimalDetail {
    pub fn project(
        model: &animal::Model,
        has_offspring: bool,
        latest_weight: Option<f64>,
        today: NaiveDate,
    ) -> Self {
        Self {
            id: model.id,
            ear_tag: model.ear_tag.clone(),
            name: model.name.clone(),
            sex: model.sex,
            castrated: model.castrated,
            role: role_label(model, has_offspring, today),
            date_of_birth: model.date_of_birth,
            color: model.color.clone(),
            breed: model.breed.clone(),
            horn_status: model.horn_status,
            status: model.status,
            mother: model.mother_id,
            father: model.father_id,
            mother_details: None,
            father_details: None,
            notes: model.notes.clone(),
            age_in_months: age_in_months(model.date_of_birth, today),
            latest_weight,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    pub fn with_parents(mut self, mother: Option<AnimalBasic>, father: Option<AnimalBasic>) -> Self {
        self.mother_details = mother;
        self.father_details = father;
        self
    }
}

/// Weight of the most recent observation.
///
/// Ties on `measured_at` go to the most recently created log.
pub fn latest_weight(logs: &[weight_log::Model]) -> Option<f64> {
    logs.iter()
        .max_by_key(|log| (log.measured_at, log.created_at, log.id))
        .map(|log| log.weight_kg)
}

/// Ids of every animal referenced as somebody's mother or father.
pub fn parent_ids(herd: &[animal::Model]) -> HashSet<i32> {
    herd.iter()
        .flat_map(|a| [a.mother_id, a.father_id])
        .flatten()
        .collect()
}
