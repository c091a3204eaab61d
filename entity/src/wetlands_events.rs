use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Wetlands (WEI) monitoring events.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "tbl_Events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "EventName")]
    pub event_name: String,
    #[sea_orm(column_name = "StartDate")]
    pub start_date: Option<Date>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::wetlands_soil::Entity")]
    Soil,
}

impl Related<super::wetlands_soil::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Soil.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
