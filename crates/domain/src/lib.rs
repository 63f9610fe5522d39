//! vk-wall-watch domain crate
//!
//! This crate contains the core sync logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `usecases`: Source resolution, normalization, and the sync engine

pub mod model;
pub mod ports;
pub mod usecases;

pub use model::*;
pub use ports::*;
