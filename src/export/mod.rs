//! Inventory export: flat CSV rows or the nested site → group → spot tree as JSON.

pub mod csv;
pub mod json;

pub use crate::error::ExportError;
pub use csv::export_csv;
pub use json::export_json;
