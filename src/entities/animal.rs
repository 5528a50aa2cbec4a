use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Deserialize, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    #[sea_orm(string_value = "male")]
    Male,
    #[sea_orm(string_value = "female")]
    Female,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Deserialize, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum HornStatus {
    #[sea_orm(string_value = "horned")]
    Horned,
    #[sea_orm(string_value = "polled")]
    Polled,
    #[sea_orm(string_value = "scurred")]
    Scurred,
    #[sea_orm(string_value = "dehorned")]
    Dehorned,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Deserialize, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "archived")]
    Archived,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "cattle")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub ear_tag: String,
    pub name: Option<String>,
    pub sex: Sex,
    pub castrated: bool,
    pub date_of_birth: Option<Date>,
    pub color: Option<String>,
    pub breed: Option<String>,
    pub horn_status: HornStatus,
    pub status: Status,
    pub mother_id: Option<i32>,
    pub father_id: Option<i32>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::MotherId",
        to = "Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Mother,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::FatherId",
        to = "Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Father,
    #[sea_orm(has_many = "super::weight_log::Entity")]
    WeightLog,
}

impl Related<super::weight_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WeightLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
