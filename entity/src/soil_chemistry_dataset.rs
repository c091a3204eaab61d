use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Master soil chemistry dataset, one row per sample and parameter.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tbl_SoilChemistry_Dataset")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "ID")]
    pub id: i32,
    #[sea_orm(column_name = "Protocol_ROMN")]
    pub protocol_romn: String,
    #[sea_orm(column_name = "SiteName")]
    pub site_name: String,
    #[sea_orm(column_name = "EventName")]
    pub event_name: String,
    #[sea_orm(column_name = "StartDate")]
    pub start_date: Option<Date>,
    #[sea_orm(column_name = "YearSampled")]
    pub year_sampled: Option<i32>,
    #[sea_orm(column_name = "ParameterRaw")]
    pub parameter_raw: String,
    #[sea_orm(column_name = "UnitRaw")]
    pub unit_raw: Option<String>,
    #[sea_orm(column_name = "ParameterDataset")]
    pub parameter_dataset: String,
    #[sea_orm(column_name = "UnitDataset")]
    pub unit_dataset: Option<String>,
    #[sea_orm(column_name = "Value")]
    pub value: String,
    #[sea_orm(column_name = "QC_Status")]
    pub qc_status: i32,
    #[sea_orm(column_name = "QC_Flag")]
    pub qc_flag: String,
    #[sea_orm(column_name = "QC_Notes")]
    pub qc_notes: String,
    #[sea_orm(column_name = "DataFlag")]
    pub data_flag: String,
    #[sea_orm(column_name = "Count")]
    pub count: i32,
    #[sea_orm(column_name = "StDev")]
    pub st_dev: f64,
    #[sea_orm(column_name = "STErr")]
    pub st_err: f64,
    #[sea_orm(column_name = "Min")]
    pub min: Option<f64>,
    #[sea_orm(column_name = "Max")]
    pub max: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
