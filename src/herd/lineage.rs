//! Family tree for a single animal.
//!
//! Parent links are plain ids with no acyclicity guarantee, so the walk is
//! fixed at three generations (current, parents, grandparents): at most six
//! point lookups plus one scan of the herd for siblings and offspring.

use chrono::NaiveDate;
use serde::Serialize;

use super::error::{HerdError, HerdResult};
use super::projection::{latest_weight, AnimalBasic, AnimalDetail};
use super::store::HerdStore;
use crate::entities::animal;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Lineage {
    pub current: AnimalDetail,
    pub parents: Parents,
    pub grandparents: Grandparents,
    pub siblings: Vec<AnimalBasic>,
    pub offspring: Vec<AnimalBasic>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Parents {
    pub mother: Option<AnimalBasic>,
    pub father: Option<AnimalBasic>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Grandparents {
    pub paternal_grandfather: Option<AnimalBasic>,
    pub paternal_grandmother: Option<AnimalBasic>,
    pub maternal_grandfather: Option<AnimalBasic>,
    pub maternal_grandmother: Option<AnimalBasic>,
}

async fn lookup<S>(store: &S, id: Option<i32>) -> HerdResult<Option<animal::Model>>
where
    S: HerdStore + ?Sized,
{
    match id {
        Some(id) => store.find_animal(id).await,
        None => Ok(None),
    }
}

/// Mother and father of `parent`, in that order. Both `None` for an unknown parent.
async fn parents_of<S>(
    store: &S,
    parent: Option<&animal::Model>,
) -> HerdResult<(Option<animal::Model>, Option<animal::Model>)>
where
    S: HerdStore + ?Sized,
{
    match parent {
        Some(p) => Ok((lookup(store, p.mother_id).await?, lookup(store, p.father_id).await?)),
        None => Ok((None, None)),
    }
}

fn shares_parent(candidate: &animal::Model, current: &animal::Model) -> bool {
    let same_mother = current.mother_id.is_some() && candidate.mother_id == current.mother_id;
    let same_father = current.father_id.is_some() && candidate.father_id == current.father_id;
    same_mother || same_father
}

fn is_child_of(candidate: &animal::Model, parent_id: i32) -> bool {
    candidate.mother_id == Some(parent_id) || candidate.father_id == Some(parent_id)
}

pub async fn resolve_lineage<S>(store: &S, id: i32, today: NaiveDate) -> HerdResult<Lineage>
where
    S: HerdStore + ?Sized,
{
    let current = store
        .find_animal(id)
        .await?
        .ok_or_else(|| HerdError::cattle_not_found(id))?;

    let mother = lookup(store, current.mother_id).await?;
    let father = lookup(store, current.father_id).await?;
    let (maternal_grandmother, maternal_grandfather) = parents_of(store, mother.as_ref()).await?;
    let (paternal_grandmother, paternal_grandfather) = parents_of(store, father.as_ref()).await?;

    let mut herd = store.list_animals(None).await?;
    herd.sort_by_key(|a| a.id);

    let basic = |model: &animal::Model| AnimalBasic::project(model, today);

    let siblings: Vec<AnimalBasic> = herd
        .iter()
        .filter(|a| a.id != current.id && shares_parent(a, &current))
        .map(basic)
        .collect();
    let offspring: Vec<AnimalBasic> = herd
        .iter()
        .filter(|a| is_child_of(a, current.id))
        .map(basic)
        .collect();

    let weights = store.weights_for_animal(current.id).await?;
    let detail = AnimalDetail::project(&current, !offspring.is_empty(), latest_weight(&weights), today);

    tracing::debug!(
        cattle_id = current.id,
        siblings = siblings.len(),
        offspring = offspring.len(),
        "resolved lineage"
    );

    Ok(Lineage {
        current: detail,
        parents: Parents {
            mother: mother.as_ref().map(basic),
            father: father.as_ref().map(basic),
        },
        grandparents: Grandparents {
            paternal_grandfather: paternal_grandfather.as_ref().map(basic),
            paternal_grandmother: paternal_grandmother.as_ref().map(basic),
            maternal_grandfather: maternal_grandfather.as_ref().map(basic),
            maternal_grandmother: maternal_grandmother.as_ref().map(basic),
        },
        siblings,
        offspring,
    })
}
