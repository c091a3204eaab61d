pub mod crosswalk;
pub mod enrichment;
pub mod metadata;
pub mod processing;
