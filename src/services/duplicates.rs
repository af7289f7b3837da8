use crate::services::volume;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Read;

/// Bytes hashed for the quick first-chunk comparison
pub const PARTIAL_HASH_BYTES: u64 = 1024 * 1024;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// How a clash between a source file and an existing destination was settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateResolution {
    /// Contents differ; the source now lives (or would live) at this `_copy` path
    RenamedCopy(Utf8PathBuf),

    /// Contents are identical; this path should be deleted once the user confirms
    DeletionCandidate(Utf8PathBuf),
}

/// Settles destination clashes by size, then first-chunk hash, then full hash.
#[derive(Debug, Clone, Default)]
pub struct DuplicateResolver {
    dry_run: bool,
}

impl DuplicateResolver {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Resolve a clash between `source` and an existing `destination`.
    ///
    /// Different content moves the source next to the destination under a
    /// `_copy` name. Identical content leaves both files in place and nominates
    /// the copy on the volume with less free space for deletion.
    pub async fn resolve(
        &self,
        source: &Utf8Path,
        destination: &Utf8Path,
    ) -> Result<DuplicateResolution> {
        if !files_identical(source, destination).await? {
            let copy_path = next_copy_path(source, destination);
            if self.dry_run {
                tracing::info!(
                    "[dry run] Would move '{}' to '{}' (duplicate with different content)",
                    source,
                    copy_path
                );
            } else {
                volume::move_file_off_runtime(source, &copy_path)
                    .await
                    .with_context(|| {
                        format!("Failed to move duplicate '{}' to '{}'", source, copy_path)
                    })?;
                tracing::info!(
                    "Moved '{}' to '{}' (duplicate with different content)",
                    source,
                    copy_path
                );
            }
            return Ok(DuplicateResolution::RenamedCopy(copy_path));
        }

        let candidate = if volume::same_volume(source, destination) {
            destination.to_path_buf()
        } else if volume::free_space(source) < volume::free_space(destination) {
            source.to_path_buf()
        } else {
            destination.to_path_buf()
        };

        tracing::info!("Marked for deletion (less free space): '{}'", candidate);
        Ok(DuplicateResolution::DeletionCandidate(candidate))
    }
}

/// Compare two files by size, then the SHA-256 of their first MiB, then the full SHA-256.
pub async fn files_identical(a: &Utf8Path, b: &Utf8Path) -> Result<bool> {
    let size_a = fs::metadata(a)
        .with_context(|| format!("Failed to stat '{}'", a))?
        .len();
    let size_b = fs::metadata(b)
        .with_context(|| format!("Failed to stat '{}'", b))?
        .len();
    if size_a != size_b {
        tracing::debug!("Sizes differ: {} ({}) vs {} ({})", a, size_a, b, size_b);
        return Ok(false);
    }

    if hash_file(a, Some(PARTIAL_HASH_BYTES)).await? != hash_file(b, Some(PARTIAL_HASH_BYTES)).await? {
        tracing::debug!("First-chunk hashes differ: {} vs {}", a, b);
        return Ok(false);
    }

    if size_a <= PARTIAL_HASH_BYTES {
        return Ok(true);
    }

    Ok(hash_file(a, None).await? == hash_file(b, None).await?)
}

/// Hex SHA-256 of a file, or of its first `limit` bytes.
///
/// Reads on the blocking pool so large files do not stall the runtime.
pub async fn hash_file(path: &Utf8Path, limit: Option<u64>) -> Result<String> {
    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || hash_file_blocking(&owned, limit))
        .await
        .context("Hashing task panicked")?
}

fn hash_file_blocking(path: &Utf8Path, limit: Option<u64>) -> Result<String> {
    let file = File::open(path).with_context(|| format!("Failed to open '{}' for hashing", path))?;
    let mut reader: Box<dyn Read> = match limit {
        Some(bytes) => Box::new(file.take(bytes)),
        None => Box::new(file),
    };

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let read = reader
            .read(&mut buffer)
            .with_context(|| format!("Failed to read '{}' for hashing", path))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// First free `<stem>_copy<ext>`, `<stem>_copy1<ext>`, ... next to `destination`.
///
/// The stem and extension come from the source file name.
pub fn next_copy_path(source: &Utf8Path, destination: &Utf8Path) -> Utf8PathBuf {
    let directory = destination.parent().unwrap_or(Utf8Path::new(""));
    let stem = source.file_stem().unwrap_or("file");
    let extension = source
        .extension()
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default();

    let mut candidate = directory.join(format!("{}_copy{}", stem, extension));
    let mut counter = 1;
    while candidate.exists() {
        candidate = directory.join(format!("{}_copy{}{}", stem, counter, extension));
        counter += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8_temp_dir() -> (TempDir, Utf8PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf()).unwrap();
        (temp_dir, path)
    }

    #[test]
    fn test_next_copy_path_counts_up() {
        let (_guard, root) = utf8_temp_dir();
        let destination = root.join("Movie (2001).mkv");
        let source = Utf8PathBuf::from("/elsewhere/Movie (2001).mkv");

        assert_eq!(next_copy_path(&source, &destination), root.join("Movie (2001)_copy.mkv"));

        fs::write(root.join("Movie (2001)_copy.mkv"), b"").unwrap();
        assert_eq!(next_copy_path(&source, &destination), root.join("Movie (2001)_copy1.mkv"));

        fs::write(root.join("Movie (2001)_copy1.mkv"), b"").unwrap();
        assert_eq!(next_copy_path(&source, &destination), root.join("Movie (2001)_copy2.mkv"));
    }

    #[tokio::test]
    async fn test_hash_file_prefix() {
        let (_guard, root) = utf8_temp_dir();
        let path = root.join("data.bin");
        fs::write(&path, b"abcdef").unwrap();

        let full = hash_file(&path, None).await.unwrap();
        let prefix = hash_file(&path, Some(3)).await.unwrap();

        // sha256("abc")
        assert_eq!(
            prefix,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(full, prefix);
        assert_eq!(full.len(), 64);
    }

    #[tokio::test]
    async fn test_files_identical() {
        let (_guard, root) = utf8_temp_dir();
        fs::write(root.join("a"), b"same bytes").unwrap();
        fs::write(root.join("b"), b"same bytes").unwrap();
        fs::write(root.join("c"), b"other byte").unwrap();
        fs::write(root.join("d"), b"short").unwrap();

        assert!(files_identical(&root.join("a"), &root.join("b")).await.unwrap());
        assert!(!files_identical(&root.join("a"), &root.join("c")).await.unwrap());
        assert!(!files_identical(&root.join("a"), &root.join("d")).await.unwrap());
    }

    #[tokio::test]
    async fn test_resolve_different_content_renames() {
        let (_guard, root) = utf8_temp_dir();
        fs::create_dir(root.join("src")).unwrap();
        fs::create_dir(root.join("dst")).unwrap();
        let source = root.join("src/Show S01E01.mkv");
        let destination = root.join("dst/Show S01E01.mkv");
        fs::write(&source, b"new encode").unwrap();
        fs::write(&destination, b"old").unwrap();

        let resolution = DuplicateResolver::new(false)
            .resolve(&source, &destination)
            .await
            .unwrap();

        let expected = root.join("dst/Show S01E01_copy.mkv");
        assert_eq!(resolution, DuplicateResolution::RenamedCopy(expected.clone()));
        assert!(!source.exists());
        assert_eq!(fs::read(&expected).unwrap(), b"new encode");
        assert_eq!(fs::read(&destination).unwrap(), b"old");
    }

    #[tokio::test]
    async fn test_resolve_dry_run_leaves_files() {
        let (_guard, root) = utf8_temp_dir();
        let source = root.join("a.mkv");
        let destination = root.join("b.mkv");
        fs::write(&source, b"one").unwrap();
        fs::write(&destination, b"two!").unwrap();

        let resolution = DuplicateResolver::new(true)
            .resolve(&source, &destination)
            .await
            .unwrap();

        assert!(matches!(resolution, DuplicateResolution::RenamedCopy(_)));
        assert!(source.exists());
        assert!(!root.join("a_copy.mkv").exists());
    }

    #[tokio::test]
    async fn test_resolve_identical_marks_candidate() {
        let (_guard, root) = utf8_temp_dir();
        let source = root.join("a.mkv");
        let destination = root.join("b.mkv");
        fs::write(&source, b"identical").unwrap();
        fs::write(&destination, b"identical").unwrap();

        let resolution = DuplicateResolver::new(false)
            .resolve(&source, &destination)
            .await
            .unwrap();

        // Same volume, so free space ties and the destination is nominated
        assert_eq!(resolution, DuplicateResolution::DeletionCandidate(destination.clone()));
        assert!(source.exists());
        assert!(destination.exists());
    }
}
