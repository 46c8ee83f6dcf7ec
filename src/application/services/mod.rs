//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on the FileSystem boundary trait but are themselves
//! concrete structs, not traits.

mod library;
mod symlinks;

pub use library::LibraryService;
pub use symlinks::{find_symlinks, fix_symlinks};
