pub mod database;
pub mod excel_processor;
pub mod export;
pub mod row_processing;
pub mod structure;
pub mod utils;
