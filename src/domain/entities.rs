//! Domain entities: core data structures

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Name of the metadata directory at the library root.
pub const META_DIR_NAME: &str = ".dantalian";

/// Converted directories live here, below the metadata directory.
pub const DIRS_DIR_NAME: &str = "dirs";

/// Library metadata file, below the metadata directory.
pub const METADATA_FILE_NAME: &str = "library.toml";

/// A tagging library rooted at an absolute, canonical directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Library {
    pub root: PathBuf,
}

impl Library {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<root>/.dantalian`
    pub fn meta_dir(&self) -> PathBuf {
        Self::meta_dir_of(&self.root)
    }

    /// `<root>/.dantalian/dirs`
    pub fn dirs_dir(&self) -> PathBuf {
        self.meta_dir().join(DIRS_DIR_NAME)
    }

    /// `<root>/.dantalian/library.toml`
    pub fn metadata_path(&self) -> PathBuf {
        self.meta_dir().join(METADATA_FILE_NAME)
    }

    /// Metadata directory a library rooted at `root` would have.
    pub fn meta_dir_of(root: &Path) -> PathBuf {
        root.join(META_DIR_NAME)
    }
}

/// Persisted state of a library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryMetadata {
    /// Absolute root the library was last fixed at; symlinks of converted
    /// directories point below this path.
    pub root: PathBuf,
}

/// Expand environment variables in a path string.
///
/// Supports:
/// - `$VAR` syntax
/// - `${VAR}` syntax
/// - `~` for home directory
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
