//! Tagging library service
//!
//! A library is a directory tree with a `.dantalian` directory at its root.
//! Directories are tags and hard links are tag assignments: a file has a tag
//! when a link to its inode sits directly inside the tag's directory.
//!
//! Directories cannot be hard-linked, so they are converted first: moved to
//! `.dantalian/dirs` and replaced by an absolute symlink, which can be linked
//! like any file. Walks of the library descend through such symlinks so the
//! contents of converted directories are part of the library.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use itertools::Itertools;
use tracing::{debug, info};

use crate::application::services::symlinks::{find_symlinks, fix_symlinks};
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{resolve_name, DomainError, Library, LibraryMetadata, Tag};
use crate::infrastructure::traits::{FileId, FileSystem};

/// Entry of a library walk.
///
/// `physical` is where the entry is stored, `logical` is where it is reached
/// from the library root (they differ inside converted directories).
#[derive(Debug, Clone)]
struct Entry {
    physical: PathBuf,
    logical: PathBuf,
}

/// Library management service.
pub struct LibraryService {
    fs: Arc<dyn FileSystem>,
}

impl LibraryService {
    /// Create a new library service.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Create a library at `root`, creating `root` if needed.
    ///
    /// An existing library is returned unchanged.
    pub fn init(&self, root: &Path) -> ApplicationResult<Library> {
        debug!("init: root={}", root.display());
        self.fs
            .create_dir_all(root)
            .with_path_context("create library root", root)?;
        let root = self
            .fs
            .canonicalize(root)
            .with_path_context("canonicalize library root", root)?;
        let library = Library::new(root);

        if self.fs.is_real_dir(&library.meta_dir()) {
            debug!("init: already initialized at {}", library.root.display());
            return Ok(library);
        }

        let dirs_dir = library.dirs_dir();
        self.fs
            .create_dir_all(&dirs_dir)
            .with_path_context("create converted directory store", &dirs_dir)?;
        self.write_metadata(
            &library,
            &LibraryMetadata {
                root: library.root.clone(),
            },
        )?;
        info!("initialized library at {}", library.root.display());
        Ok(library)
    }

    /// Open the library rooted at `root`.
    pub fn open(&self, root: &Path) -> ApplicationResult<Library> {
        debug!("open: root={}", root.display());
        let root = self
            .fs
            .canonicalize(root)
            .map_err(|_| ApplicationError::NotALibrary(root.to_path_buf()))?;
        if !self.fs.is_real_dir(&Library::meta_dir_of(&root)) {
            return Err(ApplicationError::NotALibrary(root));
        }
        Ok(Library::new(root))
    }

    /// Find the library containing `start` by walking up its ancestors.
    pub fn discover(&self, start: &Path) -> ApplicationResult<Option<Library>> {
        let start = self
            .fs
            .canonicalize(start)
            .with_path_context("canonicalize", start)?;
        let found = start
            .ancestors()
            .find(|dir| self.fs.is_real_dir(&Library::meta_dir_of(dir)))
            .map(Library::new);
        debug!(
            "discover: start={} found={:?}",
            start.display(),
            found.as_ref().map(|l| &l.root)
        );
        Ok(found)
    }

    /// Tag `file` with `tag` by hard-linking it into the tag's directory.
    ///
    /// Returns the new link, or `None` when the file already has the tag.
    pub fn tag(&self, library: &Library, file: &Path, tag: &Tag) -> ApplicationResult<Option<PathBuf>> {
        debug!("tag: file={}, tag={}", file.display(), tag);
        let file = self.locate(file)?;
        if self.fs.is_real_dir(&file) {
            return Err(ApplicationError::IsADirectory(file));
        }
        let id = self.fs.file_id(&file).with_path_context("stat", &file)?;

        let dir = tag.to_path(&library.root);
        if !self.fs.exists(&dir) {
            self.fs
                .create_dir_all(&dir)
                .with_path_context("create tag directory", &dir)?;
        } else if !self.fs.is_dir(&dir) {
            return Err(ApplicationError::NotADirectory(dir));
        }

        let existing = self.fs.read_dir(&dir).with_path_context("list", &dir)?;
        for entry in &existing {
            if self.fs.file_id(entry).with_path_context("stat", entry)? == id {
                debug!("tag: {} already tagged as {}", file.display(), entry.display());
                return Ok(None);
            }
        }

        let taken = file_names(&existing);
        let name = resolve_name(file_name(&file)?, |n| taken.contains(n))?;
        let link = dir.join(name);
        self.fs
            .hard_link(&file, &link)
            .with_link_context("hard link", &file, &link)?;
        info!("tagged {} with {}", file.display(), tag);
        Ok(Some(link))
    }

    /// Remove `tag` from `file`. Returns the links removed; untagged files
    /// yield an empty list.
    pub fn untag(&self, library: &Library, file: &Path, tag: &Tag) -> ApplicationResult<Vec<PathBuf>> {
        debug!("untag: file={}, tag={}", file.display(), tag);
        let file = self.locate(file)?;
        if self.fs.is_real_dir(&file) {
            return Err(ApplicationError::IsADirectory(file));
        }
        let id = self.fs.file_id(&file).with_path_context("stat", &file)?;

        let dir = tag.to_path(&library.root);
        if !self.fs.is_dir(&dir) {
            return Ok(Vec::new());
        }

        let mut removed = Vec::new();
        for entry in self.fs.read_dir(&dir).with_path_context("list", &dir)? {
            if self.fs.file_id(&entry).with_path_context("stat", &entry)? == id {
                self.fs
                    .remove_file(&entry)
                    .with_path_context("remove link", &entry)?;
                info!("untagged {} from {}", entry.display(), tag);
                removed.push(entry);
            }
        }
        Ok(removed)
    }

    /// All tags of `file`, sorted.
    pub fn list_tags(&self, library: &Library, file: &Path) -> ApplicationResult<Vec<Tag>> {
        debug!("list_tags: file={}", file.display());
        let file = self.locate(file)?;
        let id = self.fs.file_id(&file).with_path_context("stat", &file)?;

        let tags = self
            .links_of(library, id)?
            .iter()
            .filter_map(|entry| Tag::from_path(&entry.logical, &library.root))
            .sorted()
            .dedup()
            .collect();
        Ok(tags)
    }

    /// Files having every one of `tags`, listed by their path under the
    /// first tag.
    pub fn find(&self, library: &Library, tags: &[Tag]) -> ApplicationResult<Vec<PathBuf>> {
        debug!("find: tags={}", tags.iter().join(", "));
        let Some((first, rest)) = tags.split_first() else {
            return Ok(Vec::new());
        };

        let mut required: Vec<HashSet<FileId>> = Vec::with_capacity(rest.len());
        for tag in rest {
            let dir = tag.to_path(&library.root);
            if !self.fs.is_dir(&dir) {
                return Ok(Vec::new());
            }
            required.push(self.ids_in(&dir)?.into_iter().map(|(id, _)| id).collect());
        }

        let first_dir = first.to_path(&library.root);
        if !self.fs.is_dir(&first_dir) {
            return Ok(Vec::new());
        }
        let found = self
            .ids_in(&first_dir)?
            .into_iter()
            .filter(|(id, _)| required.iter().all(|ids| ids.contains(id)))
            .map(|(_, path)| path)
            .sorted()
            .collect();
        Ok(found)
    }

    /// Remove every link to `file` in the library. Returns the removed links.
    pub fn rm(&self, library: &Library, file: &Path) -> ApplicationResult<Vec<PathBuf>> {
        debug!("rm: file={}", file.display());
        let file = self.locate(file)?;
        if self.fs.is_real_dir(&file) {
            return Err(ApplicationError::IsADirectory(file));
        }
        let id = self.fs.file_id(&file).with_path_context("stat", &file)?;

        let links: BTreeSet<PathBuf> = self
            .links_of(library, id)?
            .into_iter()
            .map(|entry| entry.physical)
            .collect();
        for link in &links {
            self.fs
                .remove_file(link)
                .with_path_context("remove link", link)?;
            info!("removed {}", link.display());
        }
        Ok(links.into_iter().collect())
    }

    /// Rename every link to `file` to `new`, each within its own directory.
    ///
    /// Returns the new paths. Names already taken get a numbered variant.
    pub fn rename(&self, library: &Library, file: &Path, new: &str) -> ApplicationResult<Vec<PathBuf>> {
        debug!("rename: file={}, new={}", file.display(), new);
        // validates `new` as a single path component
        resolve_name(new, |_| false)?;
        let file = self.locate(file)?;
        if self.fs.is_real_dir(&file) {
            return Err(ApplicationError::IsADirectory(file));
        }
        let id = self.fs.file_id(&file).with_path_context("stat", &file)?;

        let links: BTreeSet<PathBuf> = self
            .links_of(library, id)?
            .into_iter()
            .map(|entry| entry.physical)
            .collect();

        let mut renamed = Vec::with_capacity(links.len());
        for link in links {
            if link.file_name().and_then(|n| n.to_str()) == Some(new) {
                renamed.push(link);
                continue;
            }
            let dir = link
                .parent()
                .ok_or_else(|| ApplicationError::OutsideLibrary(link.clone()))?;
            let taken = file_names(&self.fs.read_dir(dir).with_path_context("list", dir)?);
            let dest = dir.join(resolve_name(new, |n| taken.contains(n))?);
            self.fs
                .rename(&link, &dest)
                .with_link_context("rename", &link, &dest)?;
            info!("renamed {} to {}", link.display(), dest.display());
            renamed.push(dest);
        }
        Ok(renamed)
    }

    /// Convert directory `dir` so it can be tagged.
    ///
    /// Moves it to `.dantalian/dirs/<name>` and leaves an absolute symlink in
    /// its place. Returns the new location, or `None` when `dir` is already
    /// converted.
    pub fn convert(&self, library: &Library, dir: &Path) -> ApplicationResult<Option<PathBuf>> {
        debug!("convert: dir={}", dir.display());
        let path = self.locate(dir)?;
        let dirs_dir = library.dirs_dir();

        if self.fs.is_symlink(&path) {
            if self.converted_target(&path, &dirs_dir).is_some() {
                debug!("convert: {} already converted", path.display());
                return Ok(None);
            }
            return Err(ApplicationError::NotADirectory(path));
        }
        if !self.fs.is_real_dir(&path) {
            return Err(ApplicationError::NotADirectory(path));
        }
        if !self.is_convertible_location(library, &path) {
            return Err(ApplicationError::OutsideLibrary(path));
        }

        let target = dirs_dir.join(file_name(&path)?);
        if self.fs.exists(&target) || self.fs.is_symlink(&target) {
            return Err(ApplicationError::NameConflict(target));
        }

        self.fs
            .create_dir_all(&dirs_dir)
            .with_path_context("create converted directory store", &dirs_dir)?;
        self.fs
            .move_path(&path, &target)
            .with_link_context("move directory", &path, &target)?;
        self.fs
            .symlink(&target, &path)
            .with_link_context("create symlink", &path, &target)?;
        info!("converted {} to {}", path.display(), target.display());
        Ok(Some(target))
    }

    /// Repair converted-directory symlinks after the library was moved.
    ///
    /// Returns the number of symlink groups rewritten; zero when the library
    /// has not moved since it was last fixed.
    pub fn fix(&self, library: &Library) -> ApplicationResult<usize> {
        debug!("fix: root={}", library.root.display());
        let current = LibraryMetadata {
            root: library.root.clone(),
        };
        let Some(recorded) = self.read_metadata(library)? else {
            self.write_metadata(library, &current)?;
            return Ok(0);
        };
        if recorded.root == library.root {
            debug!("fix: library has not moved");
            return Ok(0);
        }

        let groups = find_symlinks(self.fs.as_ref(), &library.root)?;
        let fixed = fix_symlinks(self.fs.as_ref(), &groups, &recorded.root, &library.root)?;
        self.write_metadata(library, &current)?;
        info!(
            "fixed {} symlink groups: {} -> {}",
            fixed,
            recorded.root.display(),
            library.root.display()
        );
        Ok(fixed)
    }

    /// Delete converted directories no symlink in the library points to.
    ///
    /// Returns the deleted directories.
    pub fn clean_dirs(&self, library: &Library) -> ApplicationResult<Vec<PathBuf>> {
        debug!("clean_dirs: root={}", library.root.display());
        if let Some(recorded) = self.read_metadata(library)? {
            if recorded.root != library.root {
                return Err(ApplicationError::LibraryMoved {
                    recorded: recorded.root,
                    current: library.root.clone(),
                });
            }
        }

        let dirs_dir = library.dirs_dir();
        if !self.fs.is_real_dir(&dirs_dir) {
            return Ok(Vec::new());
        }

        let referenced: HashSet<PathBuf> = self
            .entries(library)?
            .iter()
            .filter(|entry| self.fs.is_symlink(&entry.physical))
            .filter_map(|entry| self.converted_target(&entry.physical, &dirs_dir))
            .collect();

        let mut removed = Vec::new();
        let stored = self
            .fs
            .read_dir(&dirs_dir)
            .with_path_context("list", &dirs_dir)?;
        for dir in stored.into_iter().sorted() {
            if referenced.contains(&dir) {
                continue;
            }
            if self.fs.is_real_dir(&dir) {
                self.fs
                    .remove_dir_all(&dir)
                    .with_path_context("remove converted directory", &dir)?;
            } else {
                self.fs
                    .remove_file(&dir)
                    .with_path_context("remove stray entry", &dir)?;
            }
            info!("cleaned {}", dir.display());
            removed.push(dir);
        }
        Ok(removed)
    }

    // ============================================================
    // Helpers
    // ============================================================

    /// Absolute path of `path` with its parent canonicalized and its last
    /// component left as is, so symlinks are located rather than followed.
    fn locate(&self, path: &Path) -> ApplicationResult<PathBuf> {
        let name = path
            .file_name()
            .ok_or_else(|| DomainError::InvalidName(path.display().to_string()))?;
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let parent = self
            .fs
            .canonicalize(parent)
            .with_path_context("canonicalize", parent)?;
        let located = parent.join(name);
        if !self.fs.exists(&located) && !self.fs.is_symlink(&located) {
            return Err(ApplicationError::FileNotFound(located));
        }
        Ok(located)
    }

    /// Walk the library, descending into converted directories through
    /// their symlinks. `.dantalian` itself is not walked.
    fn entries(&self, library: &Library) -> ApplicationResult<Vec<Entry>> {
        let meta_dir = library.meta_dir();
        let dirs_dir = library.dirs_dir();

        let mut entries = Vec::new();
        // (physical dir, logical dir, converted dirs entered on the way)
        let mut queue: VecDeque<(PathBuf, PathBuf, Vec<PathBuf>)> = VecDeque::new();
        queue.push_back((library.root.clone(), library.root.clone(), Vec::new()));

        while let Some((physical_dir, logical_dir, chain)) = queue.pop_front() {
            let found = self
                .fs
                .walk(&physical_dir, Some(meta_dir.as_path()))
                .with_path_context("walk", &physical_dir)?;
            for physical in found {
                let Ok(relative) = physical.strip_prefix(&physical_dir) else {
                    continue;
                };
                let logical = logical_dir.join(relative);
                if self.fs.is_symlink(&physical) {
                    if let Some(target) = self.converted_target(&physical, &dirs_dir) {
                        if !chain.contains(&target) {
                            let mut chain = chain.clone();
                            chain.push(target.clone());
                            queue.push_back((target, logical.clone(), chain));
                        }
                    }
                }
                entries.push(Entry { physical, logical });
            }
        }
        Ok(entries)
    }

    /// Entries of the library that are links to inode `id`.
    fn links_of(&self, library: &Library, id: FileId) -> ApplicationResult<Vec<Entry>> {
        let mut links = Vec::new();
        for entry in self.entries(library)? {
            let entry_id = self
                .fs
                .file_id(&entry.physical)
                .with_path_context("stat", &entry.physical)?;
            if entry_id == id {
                links.push(entry);
            }
        }
        Ok(links)
    }

    /// Identity and path of every non-directory entry directly in `dir`.
    fn ids_in(&self, dir: &Path) -> ApplicationResult<Vec<(FileId, PathBuf)>> {
        let mut ids = Vec::new();
        for entry in self.fs.read_dir(dir).with_path_context("list", dir)? {
            if self.fs.is_real_dir(&entry) {
                continue;
            }
            let id = self.fs.file_id(&entry).with_path_context("stat", &entry)?;
            ids.push((id, entry));
        }
        Ok(ids)
    }

    /// Target of `link` if it is a converted-directory symlink.
    fn converted_target(&self, link: &Path, dirs_dir: &Path) -> Option<PathBuf> {
        let target = self.fs.read_link(link).ok()?;
        let is_converted = target.is_absolute()
            && target.parent() == Some(dirs_dir)
            && self.fs.is_real_dir(&target);
        is_converted.then_some(target)
    }

    /// Directories below the root may be converted, including directories
    /// inside converted ones, but not the metadata directory or its store.
    fn is_convertible_location(&self, library: &Library, path: &Path) -> bool {
        if !path.starts_with(&library.root) || path == library.root {
            return false;
        }
        if !path.starts_with(library.meta_dir()) {
            return true;
        }
        let dirs_dir = library.dirs_dir();
        path.parent()
            .map(|parent| parent.starts_with(&dirs_dir) && parent != dirs_dir)
            .unwrap_or(false)
    }

    fn read_metadata(&self, library: &Library) -> ApplicationResult<Option<LibraryMetadata>> {
        let path = library.metadata_path();
        if !self.fs.exists(&path) {
            return Ok(None);
        }
        let content = self
            .fs
            .read_to_string(&path)
            .with_path_context("read library metadata", &path)?;
        let metadata = toml::from_str(&content).map_err(|e| ApplicationError::Config {
            message: format!("parse {}: {}", path.display(), e),
        })?;
        Ok(Some(metadata))
    }

    fn write_metadata(&self, library: &Library, metadata: &LibraryMetadata) -> ApplicationResult<()> {
        let path = library.metadata_path();
        let content = toml::to_string(metadata).map_err(|e| ApplicationError::Config {
            message: format!("serialize {}: {}", path.display(), e),
        })?;
        self.fs
            .write(&path, &content)
            .with_path_context("write library metadata", &path)
    }
}

fn file_name(path: &Path) -> ApplicationResult<&str> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| DomainError::InvalidName(path.display().to_string()).into())
}

fn file_names(paths: &[PathBuf]) -> HashSet<String> {
    paths
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect()
}
