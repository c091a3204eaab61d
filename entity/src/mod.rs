//! Tables of the ROMN Soils database touched by the EDD import.
//!
//! Table and column names follow the existing database, which is why the
//! entities carry explicit `table_name` / `column_name` attributes.

pub mod name_unit_crosswalk;
pub mod soil_chemistry_dataset;
pub mod uplands_events;
pub mod wetlands_events;
pub mod wetlands_soil;
