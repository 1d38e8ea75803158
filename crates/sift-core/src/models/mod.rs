//! Configuration and field schema models.

pub mod config;
pub mod schema;

pub use config::SiftConfig;
pub use schema::{FieldKind, FieldSchema, FieldSpec};
