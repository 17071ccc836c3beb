//! Core domain types and errors.

pub mod error;
pub mod model;
