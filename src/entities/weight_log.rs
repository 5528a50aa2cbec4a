use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "weight_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub cattle_id: i32,
    pub measured_at: Date,
    #[sea_orm(column_type = "Double")]
    pub weight_kg: f64,
    pub method: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::animal::Entity",
        from = "Column::CattleId",
        to = "super::animal::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Animal,
}

impl Related<super::animal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Animal.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
