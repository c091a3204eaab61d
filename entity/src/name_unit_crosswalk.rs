use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "tlu_NameUnitCrossWalk")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "ParameterNative")]
    pub parameter_native: String,
    #[sea_orm(column_name = "UnitNative")]
    pub unit_native: Option<String>,
    #[sea_orm(column_name = "ParameterDataset")]
    pub parameter_dataset: String,
    #[sea_orm(column_name = "UnitDataset")]
    pub unit_dataset: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
