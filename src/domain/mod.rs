//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod entities;
pub mod error;
pub mod tag;

pub use entities::*;
pub use error::DomainError;
pub use tag::{resolve_name, Tag};
