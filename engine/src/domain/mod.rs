//! Domain layer: entity schema and filter compilation

pub mod filters;
pub mod schema;
