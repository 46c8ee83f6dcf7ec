//! Tests for RealFileSystem link and walk primitives

use dantalian::infrastructure::traits::{FileSystem, RealFileSystem};
use std::fs;
use tempfile::TempDir;

// ============================================================
// hard_link / file_id
// ============================================================

#[test]
fn given_file_when_hard_link_then_same_file_id() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("a.txt");
    let link = temp.path().join("b.txt");
    fs::write(&src, "hello").unwrap();
    let fs = RealFileSystem;

    // Act
    fs.hard_link(&src, &link).unwrap();

    // Assert
    assert_eq!(fs.file_id(&src).unwrap(), fs.file_id(&link).unwrap());
    assert_eq!(fs::read_to_string(&link).unwrap(), "hello");
}

#[test]
fn given_symlink_when_hard_link_then_links_the_symlink_itself() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("dir");
    let sym = temp.path().join("sym");
    let link = temp.path().join("link");
    fs::create_dir(&dir).unwrap();
    let fs = RealFileSystem;
    fs.symlink(&dir, &sym).unwrap();

    fs.hard_link(&sym, &link).unwrap();

    assert!(fs.is_symlink(&link));
    assert_eq!(fs.file_id(&sym).unwrap(), fs.file_id(&link).unwrap());
    assert_ne!(fs.file_id(&dir).unwrap(), fs.file_id(&link).unwrap());
}

#[test]
fn given_distinct_files_when_file_id_then_ids_differ() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a"), "same").unwrap();
    fs::write(temp.path().join("b"), "same").unwrap();
    let fs = RealFileSystem;

    assert_ne!(
        fs.file_id(&temp.path().join("a")).unwrap(),
        fs.file_id(&temp.path().join("b")).unwrap()
    );
}

// ============================================================
// is_real_dir / is_symlink
// ============================================================

#[test]
fn given_symlink_to_dir_when_is_real_dir_then_false() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("dir");
    let sym = temp.path().join("sym");
    fs::create_dir(&dir).unwrap();
    let fs = RealFileSystem;
    fs.symlink(&dir, &sym).unwrap();

    assert!(fs.is_real_dir(&dir));
    assert!(!fs.is_real_dir(&sym));
    assert!(fs.is_dir(&sym));
    assert!(fs.is_symlink(&sym));
}

// ============================================================
// walk
// ============================================================

#[test]
fn given_tree_when_walk_then_lists_entries_except_excluded() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("keep/inner")).unwrap();
    fs::create_dir_all(root.join("skip/inner")).unwrap();
    fs::write(root.join("keep/inner/f"), "").unwrap();
    fs::write(root.join("skip/inner/f"), "").unwrap();
    let fs = RealFileSystem;

    // Act
    let mut paths = fs.walk(root, Some(&root.join("skip"))).unwrap();
    paths.sort();

    // Assert
    assert_eq!(
        paths,
        vec![
            root.join("keep"),
            root.join("keep/inner"),
            root.join("keep/inner/f"),
        ]
    );
}

#[test]
fn given_symlinked_dir_when_walk_then_does_not_follow() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("root");
    let outside = temp.path().join("outside");
    fs::create_dir_all(&root).unwrap();
    fs::create_dir_all(&outside).unwrap();
    fs::write(outside.join("f"), "").unwrap();
    let fs = RealFileSystem;
    fs.symlink(&outside, &root.join("link")).unwrap();

    let paths = fs.walk(&root, None).unwrap();

    assert_eq!(paths, vec![root.join("link")]);
}

// ============================================================
// move_path
// ============================================================

#[test]
fn given_directory_when_move_path_then_moved_with_contents() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    let dst = temp.path().join("nested").join("dst");
    fs::create_dir_all(src.join("sub")).unwrap();
    fs::write(src.join("sub/f.txt"), "content").unwrap();
    fs::create_dir_all(dst.parent().unwrap()).unwrap();
    let fs = RealFileSystem;

    fs.move_path(&src, &dst).unwrap();

    assert!(!src.exists());
    assert_eq!(fs::read_to_string(dst.join("sub/f.txt")).unwrap(), "content");
}

#[test]
fn given_missing_source_when_move_path_then_error() {
    let temp = TempDir::new().unwrap();
    let fs = RealFileSystem;

    let result = fs.move_path(&temp.path().join("nope"), &temp.path().join("dst"));

    assert!(result.is_err());
}

// ============================================================
// read_dir
// ============================================================

#[test]
fn given_directory_when_read_dir_then_full_paths() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("x"), "").unwrap();
    fs::create_dir(temp.path().join("y")).unwrap();
    let fs = RealFileSystem;

    let mut entries = fs.read_dir(temp.path()).unwrap();
    entries.sort();

    assert_eq!(entries, vec![temp.path().join("x"), temp.path().join("y")]);
}
