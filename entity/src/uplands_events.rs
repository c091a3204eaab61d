use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Uplands vegetation (VCSS) monitoring events.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "tbl_Events1")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "EventName")]
    pub event_name: String,
    #[sea_orm(column_name = "SiteName")]
    pub site_name: String,
    #[sea_orm(column_name = "StartDate")]
    pub start_date: Option<Date>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
