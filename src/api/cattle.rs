use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use sea_orm::{
    sea_query::{Expr, Func, Order, SimpleExpr},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Deserializer, Serialize};

use super::error::{is_unique_violation, ApiError, ApiResult};
use super::middleware::CurrentUser;
use super::today;
use crate::entities::{
    animal::{self, HornStatus, Sex, Status},
    Animal,
};
use crate::herd::{
    projection::latest_weight, resolve_lineage, AnimalBasic, AnimalDetail, HerdStore, Lineage,
    SeaOrmHerdStore,
};

const DEFAULT_PAGE_SIZE: u64 = 25;
const MAX_PAGE_SIZE: u64 = 100;

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn icontains(column: animal::Column, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(format!("%{}%", needle.to_lowercase()))
}

fn span_event(action: &str, cattle_id: i32, event: &str) {
    tracing::Span::current()
        .record("table", "cattle")
        .record("action", action)
        .record("cattle_id", cattle_id)
        .record("business_event", event);
}

async fn find_or_404(db: &DatabaseConnection, id: i32) -> ApiResult<animal::Model> {
    Animal::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Cattle {} not found", id)))
}

async fn has_offspring(db: &DatabaseConnection, id: i32) -> ApiResult<bool> {
    let count = Animal::find()
        .filter(
            Condition::any()
                .add(animal::Column::MotherId.eq(id))
                .add(animal::Column::FatherId.eq(id)),
        )
        .count(db)
        .await?;
    Ok(count > 0)
}

async fn detail(db: &DatabaseConnection, model: &animal::Model) -> ApiResult<AnimalDetail> {
    let today = today();
    let store = SeaOrmHerdStore::new(db);
    let weights = store.weights_for_animal(model.id).await?;
    let mother = match model.mother_id {
        Some(id) => store.find_animal(id).await?,
        None => None,
    };
    let father = match model.father_id {
        Some(id) => store.find_animal(id).await?,
        None => None,
    };

    Ok(AnimalDetail::project(
        model,
        has_offspring(db, model.id).await?,
        latest_weight(&weights),
        today,
    )
    .with_parents(
        mother.as_ref().map(|m| AnimalBasic::project(m, today)),
        father.as_ref().map(|f| AnimalBasic::project(f, today)),
    ))
}

/// Checks the proposed parent links of animal `id` (`None` while creating).
async fn validate_parents(
    db: &DatabaseConnection,
    id: Option<i32>,
    mother: Option<i32>,
    father: Option<i32>,
) -> ApiResult<()> {
    if id.is_some() && mother == id {
        return Err(ApiError::Validation("Cattle cannot be its own mother".to_string()));
    }
    if id.is_some() && father == id {
        return Err(ApiError::Validation("Cattle cannot be its own father".to_string()));
    }

    if let Some(mother_id) = mother {
        match Animal::find_by_id(mother_id).one(db).await? {
            None => return Err(ApiError::Validation(format!("Mother {} does not exist", mother_id))),
            Some(m) if m.sex != Sex::Female => {
                return Err(ApiError::Validation("Mother must be female".to_string()))
            }
            Some(_) => {}
        }
    }
    if let Some(father_id) = father {
        match Animal::find_by_id(father_id).one(db).await? {
            None => return Err(ApiError::Validation(format!("Father {} does not exist", father_id))),
            Some(f) if f.sex != Sex::Male => {
                return Err(ApiError::Validation("Father must be male".to_string()))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn validate_birth_date(dob: Option<NaiveDate>) -> ApiResult<()> {
    match dob {
        Some(dob) if dob > today() => Err(ApiError::Validation(
            "Date of birth cannot be in the future".to_string(),
        )),
        _ => Ok(()),
    }
}

fn map_write_error(e: sea_orm::DbErr) -> ApiError {
    if is_unique_violation(&e) {
        ApiError::Conflict("Ear tag already exists".to_string())
    } else {
        e.into()
    }
}

#[derive(Debug, Deserialize)]
pub struct ListCattleQuery {
    sex: Option<Sex>,
    status: Option<Status>,
    color: Option<String>,
    breed: Option<String>,
    search: Option<String>,
    dob_gte: Option<NaiveDate>,
    dob_lte: Option<NaiveDate>,
    ordering: Option<String>,
    page: Option<u64>,
    page_size: Option<u64>,
}

/// Parses `field` or `-field` into a sort column and direction.
fn parse_ordering(value: Option<&str>) -> ApiResult<(animal::Column, Order)> {
    let value = value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or("ear_tag");
    let (field, order) = match value.strip_prefix('-') {
        Some(field) => (field, Order::Desc),
        None => (value, Order::Asc),
    };
    let column = match field {
        "ear_tag" => animal::Column::EarTag,
        "name" => animal::Column::Name,
        "date_of_birth" => animal::Column::DateOfBirth,
        "created_at" => animal::Column::CreatedAt,
        other => {
            return Err(ApiError::Validation(format!(
                "Cannot order by '{}': expected ear_tag, name, date_of_birth or created_at",
                other
            )))
        }
    };
    Ok((column, order))
}

/// Rejects pages whose row offset does not fit a SQL OFFSET.
fn ensure_page_in_range(page: u64, page_size: u64) -> ApiResult<()> {
    match (page - 1).checked_mul(page_size) {
        Some(offset) if offset <= i64::MAX as u64 => Ok(()),
        _ => Err(ApiError::Validation(format!("Page {} is out of range", page))),
    }
}

#[derive(Debug, Serialize)]
pub struct CattlePage {
    pub count: u64,
    pub page: u64,
    pub page_size: u64,
    pub results: Vec<AnimalDetail>,
}

// GET /cattle
pub async fn list_cattle(
    Extension(db): Extension<DatabaseConnection>,
    Query(query): Query<ListCattleQuery>,
) -> ApiResult<Json<CattlePage>> {
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    ensure_page_in_range(page, page_size)?;
    let (sort_column, sort_order) = parse_ordering(query.ordering.as_deref())?;

    let mut select = Animal::find()
        .order_by(sort_column, sort_order)
        .order_by_asc(animal::Column::Id);
    if let Some(sex) = query.sex {
        select = select.filter(animal::Column::Sex.eq(sex));
    }
    if let Some(status) = query.status {
        select = select.filter(animal::Column::Status.eq(status));
    }
    if let Some(color) = clean(query.color) {
        select = select.filter(icontains(animal::Column::Color, &color));
    }
    if let Some(breed) = clean(query.breed) {
        select = select.filter(icontains(animal::Column::Breed, &breed));
    }
    if let Some(term) = clean(query.search) {
        select = select.filter(
            Condition::any()
                .add(icontains(animal::Column::EarTag, &term))
                .add(icontains(animal::Column::Name, &term))
                .add(icontains(animal::Column::Color, &term))
                .add(icontains(animal::Column::Breed, &term)),
        );
    }
    if let Some(from) = query.dob_gte {
        select = select.filter(animal::Column::DateOfBirth.gte(from));
    }
    if let Some(to) = query.dob_lte {
        select = select.filter(animal::Column::DateOfBirth.lte(to));
    }

    let paginator = select.paginate(&db, page_size);
    let count = paginator.num_items().await?;
    let models = paginator.fetch_page(page - 1).await?;

    let links: Vec<(Option<i32>, Option<i32>)> = Animal::find()
        .select_only()
        .column(animal::Column::MotherId)
        .column(animal::Column::FatherId)
        .into_tuple()
        .all(&db)
        .await?;
    let parents: HashSet<i32> = links
        .into_iter()
        .flat_map(|(m, f)| [m, f])
        .flatten()
        .collect();

    let ids: Vec<i32> = models.iter().map(|m| m.id).collect();
    let mut weights: HashMap<i32, Vec<_>> = HashMap::new();
    for log in SeaOrmHerdStore::new(&db).weights_for_animals(&ids).await? {
        weights.entry(log.cattle_id).or_default().push(log);
    }

    let today = today();
    let results = models
        .iter()
        .map(|m| {
            let latest = weights.get(&m.id).and_then(|logs| latest_weight(logs));
            AnimalDetail::project(m, parents.contains(&m.id), latest, today)
        })
        .collect();

    Ok(Json(CattlePage {
        count,
        page,
        page_size,
        results,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateCattleRequest {
    ear_tag: String,
    name: Option<String>,
    sex: Sex,
    #[serde(default)]
    castrated: bool,
    date_of_birth: Option<NaiveDate>,
    color: Option<String>,
    breed: Option<String>,
    horn_status: HornStatus,
    status: Option<Status>,
    mother: Option<i32>,
    father: Option<i32>,
    notes: Option<String>,
}

// POST /cattle
pub async fn create_cattle(
    Extension(db): Extension<DatabaseConnection>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<CreateCattleRequest>,
) -> ApiResult<Response> {
    user.require_admin()?;

    let ear_tag = clean(Some(payload.ear_tag))
        .ok_or_else(|| ApiError::Validation("Ear tag is required".to_string()))?;
    validate_birth_date(payload.date_of_birth)?;
    validate_parents(&db, None, payload.mother, payload.father).await?;

    let now = chrono::Utc::now().naive_utc();
    let new_animal = animal::ActiveModel {
        ear_tag: Set(ear_tag),
        name: Set(clean(payload.name)),
        sex: Set(payload.sex),
        castrated: Set(payload.sex == Sex::Male && payload.castrated),
        date_of_birth: Set(payload.date_of_birth),
        color: Set(clean(payload.color)),
        breed: Set(clean(payload.breed)),
        horn_status: Set(payload.horn_status),
        status: Set(payload.status.unwrap_or(Status::Active)),
        mother_id: Set(payload.mother),
        father_id: Set(payload.father),
        notes: Set(clean(payload.notes)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = new_animal.insert(&db).await.map_err(map_write_error)?;
    span_event("create_cattle", created.id, "Cattle record created");
    crate::metrics::record_cattle_created(created.status);

    Ok((StatusCode::CREATED, Json(detail(&db, &created).await?)).into_response())
}

// GET /cattle/:id
pub async fn get_cattle(
    Extension(db): Extension<DatabaseConnection>,
    Path(cattle_id): Path<i32>,
) -> ApiResult<Json<AnimalDetail>> {
    let model = find_or_404(&db, cattle_id).await?;
    Ok(Json(detail(&db, &model).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCattleRequest {
    ear_tag: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    name: Option<Option<String>>,
    sex: Option<Sex>,
    castrated: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    date_of_birth: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "nullable")]
    color: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    breed: Option<Option<String>>,
    horn_status: Option<HornStatus>,
    status: Option<Status>,
    #[serde(default, deserialize_with = "nullable")]
    mother: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    father: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    notes: Option<Option<String>>,
}

// PATCH /cattle/:id
pub async fn update_cattle(
    Extension(db): Extension<DatabaseConnection>,
    Extension(user): Extension<CurrentUser>,
    Path(cattle_id): Path<i32>,
    Json(payload): Json<UpdateCattleRequest>,
) -> ApiResult<Json<AnimalDetail>> {
    user.require_admin()?;
    let existing = find_or_404(&db, cattle_id).await?;

    let sex = payload.sex.unwrap_or(existing.sex);
    if sex != existing.sex {
        let column = match existing.sex {
            Sex::Female => animal::Column::MotherId,
            Sex::Male => animal::Column::FatherId,
        };
        let linked = Animal::find().filter(column.eq(cattle_id)).count(&db).await?;
        if linked > 0 {
            return Err(ApiError::Validation(
                "Cannot change sex while recorded as a parent".to_string(),
            ));
        }
    }

    let mother = payload.mother.unwrap_or(existing.mother_id);
    let father = payload.father.unwrap_or(existing.father_id);
    validate_parents(&db, Some(cattle_id), mother, father).await?;
    if let Some(dob) = payload.date_of_birth {
        validate_birth_date(dob)?;
    }

    let previous_status = existing.status;
    let mut active = existing.into_active_model();
    if let Some(ear_tag) = payload.ear_tag {
        let ear_tag = clean(Some(ear_tag))
            .ok_or_else(|| ApiError::Validation("Ear tag is required".to_string()))?;
        active.ear_tag = Set(ear_tag);
    }
    if let Some(name) = payload.name {
        active.name = Set(clean(name));
    }
    active.sex = Set(sex);
    if let Some(castrated) = payload.castrated {
        active.castrated = Set(castrated);
    }
    if sex == Sex::Female {
        active.castrated = Set(false);
    }
    if let Some(dob) = payload.date_of_birth {
        active.date_of_birth = Set(dob);
    }
    if let Some(color) = payload.color {
        active.color = Set(clean(color));
    }
    if let Some(breed) = payload.breed {
        active.breed = Set(clean(breed));
    }
    if let Some(horn_status) = payload.horn_status {
        active.horn_status = Set(horn_status);
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    active.mother_id = Set(mother);
    active.father_id = Set(father);
    if let Some(notes) = payload.notes {
        active.notes = Set(clean(notes));
    }
    active.updated_at = Set(chrono::Utc::now().naive_utc());

    let updated = active.update(&db).await.map_err(map_write_error)?;
    crate::metrics::record_status_change(previous_status, updated.status);
    span_event("update_cattle", updated.id, "Cattle record updated");

    Ok(Json(detail(&db, &updated).await?))
}

// POST /cattle/:id/archive
pub async fn archive_cattle(
    Extension(db): Extension<DatabaseConnection>,
    Extension(user): Extension<CurrentUser>,
    Path(cattle_id): Path<i32>,
) -> ApiResult<StatusCode> {
    user.require_admin()?;
    let existing = find_or_404(&db, cattle_id).await?;

    if existing.status == Status::Active {
        let mut active = existing.into_active_model();
        active.status = Set(Status::Archived);
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        active.update(&db).await?;
        crate::metrics::record_status_change(Status::Active, Status::Archived);
    }

    span_event("archive_cattle", cattle_id, "Cattle record archived");
    Ok(StatusCode::NO_CONTENT)
}

// DELETE /cattle/:id
pub async fn delete_cattle(
    Extension(db): Extension<DatabaseConnection>,
    Extension(user): Extension<CurrentUser>,
    Path(cattle_id): Path<i32>,
) -> ApiResult<StatusCode> {
    user.require_admin()?;
    let existing = find_or_404(&db, cattle_id).await?;
    let status = existing.status;

    existing.delete(&db).await?;
    crate::metrics::record_cattle_deleted(status);
    span_event("delete_cattle", cattle_id, "Cattle record deleted");

    Ok(StatusCode::NO_CONTENT)
}

// GET /cattle/:id/lineage
pub async fn get_lineage(
    Extension(db): Extension<DatabaseConnection>,
    Path(cattle_id): Path<i32>,
) -> ApiResult<Json<Lineage>> {
    tracing::Span::current()
        .record("table", "cattle")
        .record("action", "get_lineage")
        .record("cattle_id", cattle_id);
    crate::metrics::record_lineage_request();

    let lineage = resolve_lineage(&SeaOrmHerdStore::new(&db), cattle_id, today()).await?;
    Ok(Json(lineage))
}
