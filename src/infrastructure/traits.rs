//! I/O boundary traits for testability
//!
//! These traits abstract filesystem operations, allowing services
//! to be tested against alternative implementations.

use std::io;
use std::path::{Path, PathBuf};

/// Identity of a directory entry: device and inode of the entry itself.
///
/// Symlinks are not followed, so two hard links to the same symlink share
/// an identity while the symlink and its target do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId {
    pub dev: u64,
    pub ino: u64,
}

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write string content to file.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists (following symlinks).
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a directory (following symlinks).
    fn is_dir(&self, path: &Path) -> bool;

    /// Check if path is a directory without following symlinks.
    fn is_real_dir(&self, path: &Path) -> bool;

    /// Check if path is a symbolic link.
    fn is_symlink(&self, path: &Path) -> bool;

    /// Create directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Rename/move a file within one filesystem.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Remove a file or symlink.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Remove a directory and all its contents.
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create a symbolic link.
    fn symlink(&self, original: &Path, link: &Path) -> io::Result<()>;

    /// Read the target of a symbolic link.
    fn read_link(&self, path: &Path) -> io::Result<PathBuf>;

    /// Create a hard link to `original` at `link`, without following symlinks.
    fn hard_link(&self, original: &Path, link: &Path) -> io::Result<()>;

    /// Device and inode of the entry at `path` (lstat).
    fn file_id(&self, path: &Path) -> io::Result<FileId>;

    /// Full paths of the entries directly inside `dir`.
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// All entries below `root` (root excluded), not following symlinks
    /// and not descending into `exclude`.
    fn walk(&self, root: &Path, exclude: Option<&Path>) -> io::Result<Vec<PathBuf>>;

    /// Canonicalize path (resolve symlinks, make absolute).
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    /// Move file or directory, with fallback for cross-device moves.
    ///
    /// Tries atomic rename first. If that fails with EXDEV (cross-device link),
    /// falls back to copy + delete.
    fn move_path(&self, from: &Path, to: &Path) -> io::Result<()>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl RealFileSystem {
    fn copy_then_remove(&self, from: &Path, to: &Path) -> io::Result<()> {
        if self.is_real_dir(from) {
            std::fs::create_dir_all(to)?;
            let options = fs_extra::dir::CopyOptions::new().content_only(true);
            fs_extra::dir::copy(from, to, &options)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
            std::fs::remove_dir_all(from)
        } else {
            std::fs::copy(from, to)?;
            std::fs::remove_file(from)
        }
    }
}

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_real_dir(&self, path: &Path) -> bool {
        path.symlink_metadata()
            .map(|m| m.file_type().is_dir())
            .unwrap_or(false)
    }

    fn is_symlink(&self, path: &Path) -> bool {
        path.symlink_metadata()
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_dir_all(path)
    }

    fn symlink(&self, original: &Path, link: &Path) -> io::Result<()> {
        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(original, link)
        }
        #[cfg(windows)]
        {
            if original.is_dir() {
                std::os::windows::fs::symlink_dir(original, link)
            } else {
                std::os::windows::fs::symlink_file(original, link)
            }
        }
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::read_link(path)
    }

    fn hard_link(&self, original: &Path, link: &Path) -> io::Result<()> {
        // linkat(2) without AT_SYMLINK_FOLLOW: a symlink is linked, not its target
        std::fs::hard_link(original, link)
    }

    fn file_id(&self, path: &Path) -> io::Result<FileId> {
        let meta = std::fs::symlink_metadata(path)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            Ok(FileId {
                dev: meta.dev(),
                ino: meta.ino(),
            })
        }
        #[cfg(not(unix))]
        {
            let _ = meta;
            Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "inode identity is only available on unix",
            ))
        }
    }

    fn read_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        std::fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect()
    }

    fn walk(&self, root: &Path, exclude: Option<&Path>) -> io::Result<Vec<PathBuf>> {
        use walkdir::WalkDir;

        let mut paths = Vec::new();
        let walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| Some(e.path()) != exclude);
        for entry in walker {
            let entry = entry.map_err(|e| {
                let context = e.to_string();
                e.into_io_error()
                    .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, context))
            })?;
            paths.push(entry.into_path());
        }
        Ok(paths)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }

    fn move_path(&self, from: &Path, to: &Path) -> io::Result<()> {
        match std::fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(e) => {
                // EXDEV = 18 on Unix (cross-device link not permitted)
                #[cfg(unix)]
                const EXDEV: i32 = 18;
                #[cfg(windows)]
                const EXDEV: i32 = 17; // ERROR_NOT_SAME_DEVICE

                if e.raw_os_error() == Some(EXDEV) {
                    self.copy_then_remove(from, to)
                } else {
                    Err(e)
                }
            }
        }
    }
}
