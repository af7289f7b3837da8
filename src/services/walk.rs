//! Sorted, UTF-8 only directory traversal on top of `walkdir`.
//!
//! Within a directory, files come before subdirectories and both are sorted by
//! name, so files are visited in the same order a top-down walk lists them.

use camino::{Utf8Path, Utf8PathBuf};
use std::cmp::Ordering;
use std::io;
use walkdir::{DirEntry, WalkDir};

/// Immediate children of a directory, split into directories and files
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DirListing {
    pub dirs: Vec<Utf8PathBuf>,
    pub files: Vec<Utf8PathBuf>,
}

fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

/// Prunes entries (and everything below them) whose path is not UTF-8.
fn is_utf8(entry: &DirEntry) -> bool {
    if entry.path().to_str().is_some() {
        return true;
    }
    tracing::warn!("Skipping non UTF-8 path: {}", entry.path().display());
    false
}

/// Descendants of `root` (never `root` itself) as `(path, is_dir)`.
///
/// Walk errors are logged and skipped.
fn entries(walker: WalkDir) -> impl Iterator<Item = (Utf8PathBuf, bool)> {
    walker
        .min_depth(1)
        .sort_by(files_first)
        .into_iter()
        .filter_entry(is_utf8)
        .filter_map(|entry| match entry {
            Ok(entry) => {
                let is_dir = entry.file_type().is_dir();
                Utf8PathBuf::from_path_buf(entry.into_path())
                    .ok()
                    .map(|path| (path, is_dir))
            }
            Err(e) => {
                tracing::warn!("Error walking directory: {}", e);
                None
            }
        })
}

/// List a directory, sorted by name. Entries whose names are not UTF-8 are skipped with a warning.
pub fn list_dir(path: &Utf8Path) -> io::Result<DirListing> {
    let mut listing = DirListing::default();

    let walker = WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in walker.into_iter().filter_entry(is_utf8) {
        let entry = entry?;
        let is_dir = entry.file_type().is_dir();
        let Ok(entry_path) = Utf8PathBuf::from_path_buf(entry.into_path()) else {
            continue;
        };

        if is_dir {
            listing.dirs.push(entry_path);
        } else {
            listing.files.push(entry_path);
        }
    }

    Ok(listing)
}

/// Every file under `root`, top-down: a directory's own files come before its subdirectories'.
///
/// Unreadable directories are logged and skipped.
pub fn walk_files(root: &Utf8Path) -> Vec<Utf8PathBuf> {
    entries(WalkDir::new(root))
        .filter(|(_, is_dir)| !is_dir)
        .map(|(path, _)| path)
        .collect()
}

/// Every directory under `root` (excluding `root`), top-down.
pub fn walk_dirs(root: &Utf8Path) -> Vec<Utf8PathBuf> {
    entries(WalkDir::new(root))
        .filter(|(_, is_dir)| *is_dir)
        .map(|(path, _)| path)
        .collect()
}

/// Every directory under `root` (excluding `root`), each one after its own subdirectories.
pub fn walk_dirs_deepest_first(root: &Utf8Path) -> Vec<Utf8PathBuf> {
    entries(WalkDir::new(root).contents_first(true))
        .filter(|(_, is_dir)| *is_dir)
        .map(|(path, _)| path)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> (TempDir, Utf8PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf()).unwrap();
        fs::create_dir_all(root.join("b/inner")).unwrap();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("z.mkv"), b"").unwrap();
        fs::write(root.join("a/1.mkv"), b"").unwrap();
        fs::write(root.join("b/2.mkv"), b"").unwrap();
        fs::write(root.join("b/inner/3.mkv"), b"").unwrap();
        (temp_dir, root)
    }

    #[test]
    fn test_list_dir_sorted() {
        let (_guard, root) = tree();
        let listing = list_dir(&root).unwrap();

        assert_eq!(listing.dirs, vec![root.join("a"), root.join("b")]);
        assert_eq!(listing.files, vec![root.join("z.mkv")]);
    }

    #[test]
    fn test_list_dir_missing_is_error() {
        let (_guard, root) = tree();
        assert!(list_dir(&root.join("missing")).is_err());
    }

    #[test]
    fn test_walk_files_top_down() {
        let (_guard, root) = tree();

        assert_eq!(
            walk_files(&root),
            vec![
                root.join("z.mkv"),
                root.join("a/1.mkv"),
                root.join("b/2.mkv"),
                root.join("b/inner/3.mkv"),
            ]
        );
    }

    #[test]
    fn test_walk_dirs() {
        let (_guard, root) = tree();

        assert_eq!(
            walk_dirs(&root),
            vec![root.join("a"), root.join("b"), root.join("b/inner")]
        );
    }

    #[test]
    fn test_walk_dirs_deepest_first() {
        let (_guard, root) = tree();

        assert_eq!(
            walk_dirs_deepest_first(&root),
            vec![root.join("a"), root.join("b/inner"), root.join("b")]
        );
    }

    #[test]
    fn test_walk_includes_hidden_entries() {
        let (_guard, root) = tree();
        fs::create_dir_all(root.join(".hidden")).unwrap();
        fs::write(root.join(".hidden/4.mkv"), b"").unwrap();

        assert!(walk_files(&root).contains(&root.join(".hidden/4.mkv")));
    }

    #[test]
    fn test_walk_missing_root_is_empty() {
        let (_guard, root) = tree();
        assert!(walk_files(&root.join("missing")).is_empty());
    }
}
