//! Utility functions for the filter engine

pub mod file;
pub mod string;
pub mod time;
