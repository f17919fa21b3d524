// services/mod.rs
pub mod database;
pub mod export;

// Ré-exports pour faciliter l'import
pub use database::Database;
pub use export::{ExportService, XLSX_CONTENT_TYPE};
