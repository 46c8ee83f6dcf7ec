//! Symlink repair after a library has moved
//!
//! Converted directories are replaced by absolute symlinks, so moving the
//! library leaves every such symlink dangling. Symlinks that are hard links
//! of one another form a group and are repaired together: the first one is
//! recreated with the new target and the rest are re-linked to it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::application::{ApplicationResult, IoResultExt};
use crate::infrastructure::traits::{FileId, FileSystem};

/// Find all symlinks below `root`, grouped by inode.
///
/// Groups keep walk order, as do the paths inside each group.
pub fn find_symlinks(fs: &dyn FileSystem, root: &Path) -> ApplicationResult<Vec<Vec<PathBuf>>> {
    let entries = fs.walk(root, None).with_path_context("walk", root)?;

    let mut index: HashMap<FileId, usize> = HashMap::new();
    let mut groups: Vec<Vec<PathBuf>> = Vec::new();
    for path in entries.into_iter().filter(|p| fs.is_symlink(p)) {
        let id = fs.file_id(&path).with_path_context("stat", &path)?;
        match index.get(&id) {
            Some(&i) => groups[i].push(path),
            None => {
                index.insert(id, groups.len());
                groups.push(vec![path]);
            }
        }
    }
    debug!("find_symlinks: {} groups under {}", groups.len(), root.display());
    Ok(groups)
}

/// Retarget every symlink group whose target starts with `old_prefix`.
///
/// Returns the number of groups rewritten. Groups pointing elsewhere are
/// left alone.
pub fn fix_symlinks(
    fs: &dyn FileSystem,
    groups: &[Vec<PathBuf>],
    old_prefix: &Path,
    new_prefix: &Path,
) -> ApplicationResult<usize> {
    let mut fixed = 0;
    for group in groups {
        let Some((first, others)) = group.split_first() else {
            warn!("empty symlink group");
            continue;
        };

        let target = fs.read_link(first).with_path_context("read symlink", first)?;
        let Ok(rest) = target.strip_prefix(old_prefix) else {
            continue;
        };
        let new_target = new_prefix.join(rest);

        debug!("Unlinking {}", first.display());
        fs.remove_file(first).with_path_context("remove symlink", first)?;
        debug!("Symlinking {} to {}", first.display(), new_target.display());
        fs.symlink(&new_target, first)
            .with_link_context("create symlink", first, &new_target)?;

        for other in others {
            debug!("Linking {} to {}", other.display(), first.display());
            fs.remove_file(other).with_path_context("remove symlink", other)?;
            fs.hard_link(first, other)
                .with_link_context("hard link", first, other)?;
        }
        fixed += 1;
    }
    Ok(fixed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::traits::RealFileSystem;
    use tempfile::TempDir;

    #[test]
    fn test_find_symlinks_groups_hard_linked_symlinks() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::create_dir(root.join("sub")).unwrap();
        std::os::unix::fs::symlink("/nowhere", root.join("one")).unwrap();
        std::fs::hard_link(root.join("one"), root.join("sub/one")).unwrap();
        std::os::unix::fs::symlink("/elsewhere", root.join("two")).unwrap();
        std::fs::write(root.join("plain"), "x").unwrap();

        let groups = find_symlinks(&RealFileSystem, root).unwrap();

        let mut sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
        sizes.sort();
        assert_eq!(sizes, vec![1, 2]);
    }

    #[test]
    fn test_fix_symlinks_rewrites_prefix_and_keeps_links_shared() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::create_dir(root.join("sub")).unwrap();
        std::os::unix::fs::symlink("/old/lib/.dantalian/dirs/A", root.join("A")).unwrap();
        std::fs::hard_link(root.join("A"), root.join("sub/A")).unwrap();
        std::os::unix::fs::symlink("/unrelated", root.join("other")).unwrap();

        let fs = RealFileSystem;
        let groups = find_symlinks(&fs, root).unwrap();
        let fixed = fix_symlinks(&fs, &groups, Path::new("/old/lib"), Path::new("/new/lib")).unwrap();

        assert_eq!(fixed, 1);
        assert_eq!(
            std::fs::read_link(root.join("A")).unwrap(),
            PathBuf::from("/new/lib/.dantalian/dirs/A")
        );
        assert_eq!(
            fs.file_id(&root.join("A")).unwrap(),
            fs.file_id(&root.join("sub/A")).unwrap()
        );
        assert_eq!(
            std::fs::read_link(root.join("other")).unwrap(),
            PathBuf::from("/unrelated")
        );
    }
}
