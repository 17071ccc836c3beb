//! Persistence layer.

pub mod db;

pub use db::{Store, StoreStats};
