//! `panelmerge-engine`: bad response consolidation engine.
//!
//! Pure engine crate: receives loaded tables, returns the consolidated table
//! and its match accounting. No CLI or IO dependencies.

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod resolve;
pub mod summary;
pub mod table;

pub use config::{DuplicatePolicy, KeyMode, MappingConfig, UserField};
pub use engine::consolidate;
pub use error::ConsolidateError;
pub use model::{ConsolidationResult, ConsolidationSummary};
pub use resolve::{col_to_letter, resolve_column, ColumnMappingReport, ColumnRef};
pub use table::{Table, TableRole, Value};
