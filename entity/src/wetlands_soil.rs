use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Soil samples collected on wetlands events. `chem` holds the ROMN sample
/// identifier written on the sample sent to the lab.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "tbl_Soil")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "ID")]
    pub id: i32,
    #[sea_orm(column_name = "EventName")]
    pub event_name: String,
    #[sea_orm(column_name = "Chem")]
    pub chem: Option<String>,
    #[sea_orm(column_name = "Comments_Soil", column_type = "Text", nullable)]
    pub comments_soil: Option<String>,
    #[sea_orm(column_name = "Comments_Sample", column_type = "Text", nullable)]
    pub comments_sample: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wetlands_events::Entity",
        from = "Column::EventName",
        to = "super::wetlands_events::Column::EventName"
    )]
    Events,
}

impl Related<super::wetlands_events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Events.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
