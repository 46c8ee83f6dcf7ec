//! Tags and link names
//!
//! A tag is a directory of the library, written as its path relative to the
//! library root with a leading `/`. The root itself is the tag `/`.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use crate::domain::DomainError;

/// A tag name such as `/`, `/music` or `/music/jazz`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    components: Vec<String>,
}

impl Tag {
    /// The library root.
    pub fn root() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// Parse a tag. Empty components are dropped, so `/a//b/` is `/a/b`.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let rest = s.strip_prefix('/').ok_or_else(|| DomainError::InvalidTag {
            tag: s.to_string(),
            reason: "tags start with '/'".to_string(),
        })?;

        let mut components = Vec::new();
        for part in rest.split('/').filter(|p| !p.is_empty()) {
            if part == "." || part == ".." {
                return Err(DomainError::InvalidTag {
                    tag: s.to_string(),
                    reason: format!("'{}' is not allowed in a tag", part),
                });
            }
            components.push(part.to_string());
        }
        Ok(Self { components })
    }

    /// Directory of this tag inside `root`.
    pub fn to_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(&self.components);
        path
    }

    /// Tag of the directory containing `path`.
    ///
    /// Returns `None` when `path` does not lie below `root`.
    pub fn from_path(path: &Path, root: &Path) -> Option<Self> {
        let dir = path.parent()?;
        let relative = dir.strip_prefix(root).ok()?;
        let mut components = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(name) => components.push(name.to_string_lossy().into_owned()),
                _ => return None,
            }
        }
        Some(Self { components })
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.components.join("/"))
    }
}

impl FromStr for Tag {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Pick a free file name for `name`.
///
/// Returns `name` itself when `taken` rejects it, otherwise the first of
/// `base.1.ext`, `base.2.ext`, ... that is free. Names without an extension
/// become `name.1`, `name.2`, ...
pub fn resolve_name(name: &str, taken: impl Fn(&str) -> bool) -> Result<String, DomainError> {
    if name.is_empty() || name.contains('/') {
        return Err(DomainError::InvalidName(name.to_string()));
    }
    if !taken(name) {
        return Ok(name.to_string());
    }

    let (base, ext) = split_extension(name);
    (1u64..)
        .map(|i| match ext {
            Some(ext) => format!("{}.{}.{}", base, i, ext),
            None => format!("{}.{}", base, i),
        })
        .find(|candidate| !taken(candidate))
        .ok_or_else(|| DomainError::InvalidName(name.to_string()))
}

/// Split off the extension like `os.path.splitext`: a leading dot does not
/// start an extension.
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if name[..idx].chars().any(|c| c != '.') => {
            (&name[..idx], Some(&name[idx + 1..]))
        }
        _ => (name, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[rstest]
    #[case("/", "/")]
    #[case("/A", "/A")]
    #[case("/A/D", "/A/D")]
    #[case("/A//D/", "/A/D")]
    fn test_parse_normalizes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(Tag::parse(input).unwrap().to_string(), expected);
    }

    #[rstest]
    #[case("A")]
    #[case("")]
    #[case("/A/../B")]
    #[case("/./A")]
    fn test_parse_rejects(#[case] input: &str) {
        assert!(Tag::parse(input).is_err());
    }

    #[test]
    fn test_to_path_joins_components_under_root() {
        let tag = Tag::parse("/A/D").unwrap();
        assert_eq!(tag.to_path(Path::new("/lib")), PathBuf::from("/lib/A/D"));
        assert_eq!(Tag::root().to_path(Path::new("/lib")), PathBuf::from("/lib"));
    }

    #[rstest]
    #[case("/lib/a", "/")]
    #[case("/lib/C/b", "/C")]
    #[case("/lib/A/D/a", "/A/D")]
    fn test_from_path(#[case] path: &str, #[case] expected: &str) {
        let tag = Tag::from_path(Path::new(path), Path::new("/lib")).unwrap();
        assert_eq!(tag.to_string(), expected);
    }

    #[test]
    fn test_from_path_outside_root_is_none() {
        assert!(Tag::from_path(Path::new("/elsewhere/a"), Path::new("/lib")).is_none());
    }

    #[rstest]
    #[case("photo.jpg", &[], "photo.jpg")]
    #[case("photo.jpg", &["photo.jpg"], "photo.1.jpg")]
    #[case("photo.jpg", &["photo.jpg", "photo.1.jpg"], "photo.2.jpg")]
    #[case("notes", &["notes"], "notes.1")]
    #[case(".bashrc", &[".bashrc"], ".bashrc.1")]
    #[case("a.tar.gz", &["a.tar.gz"], "a.tar.1.gz")]
    fn test_resolve_name(#[case] name: &str, #[case] existing: &[&str], #[case] expected: &str) {
        let existing: HashSet<&str> = existing.iter().copied().collect();
        let resolved = resolve_name(name, |n| existing.contains(n)).unwrap();
        assert_eq!(resolved, expected);
    }

    #[test]
    fn test_resolve_name_rejects_paths() {
        assert!(resolve_name("a/b", |_| false).is_err());
        assert!(resolve_name("", |_| false).is_err());
    }
}
