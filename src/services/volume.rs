//! Filesystem helpers that depend on which volume a path lives on.

use camino::Utf8Path;
use std::fs;
use std::io;
use sysinfo::Disks;

/// Whether two existing paths live on the same volume.
#[cfg(unix)]
pub fn same_volume(a: &Utf8Path, b: &Utf8Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (fs::metadata(a), fs::metadata(b)) {
        (Ok(meta_a), Ok(meta_b)) => meta_a.dev() == meta_b.dev(),
        _ => false,
    }
}

/// Whether two paths live on the same drive.
#[cfg(windows)]
pub fn same_volume(a: &Utf8Path, b: &Utf8Path) -> bool {
    drive_of(a).is_some() && drive_of(a) == drive_of(b)
}

#[cfg(windows)]
fn drive_of(path: &Utf8Path) -> Option<String> {
    use camino::{Utf8Component, Utf8Prefix};

    let absolute = fs::canonicalize(path).ok()?;
    let absolute = camino::Utf8PathBuf::from_path_buf(absolute).ok()?;
    match absolute.components().next()? {
        Utf8Component::Prefix(prefix) => Some(match prefix.kind() {
            Utf8Prefix::Disk(letter) | Utf8Prefix::VerbatimDisk(letter) => {
                (letter as char).to_ascii_uppercase().to_string()
            }
            _ => prefix.as_str().to_ascii_lowercase(),
        }),
        _ => None,
    }
}

#[cfg(not(any(unix, windows)))]
pub fn same_volume(_a: &Utf8Path, _b: &Utf8Path) -> bool {
    true
}

/// Whether two paths name the same file, using the platform's case rules.
pub fn paths_equal(a: &Utf8Path, b: &Utf8Path) -> bool {
    if cfg!(windows) {
        a.as_str().replace('/', "\\").to_lowercase() == b.as_str().replace('/', "\\").to_lowercase()
    } else {
        a == b
    }
}

/// Whether two existing paths are the same file on disk (hard links, case-insensitive file systems).
#[cfg(unix)]
pub fn same_file(a: &Utf8Path, b: &Utf8Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (fs::metadata(a), fs::metadata(b)) {
        (Ok(meta_a), Ok(meta_b)) => meta_a.dev() == meta_b.dev() && meta_a.ino() == meta_b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
pub fn same_file(a: &Utf8Path, b: &Utf8Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(canon_a), Ok(canon_b)) => canon_a == canon_b,
        _ => false,
    }
}

/// Bytes available on the volume holding `path`, 0 when it cannot be determined.
pub fn free_space(path: &Utf8Path) -> u64 {
    let Ok(absolute) = fs::canonicalize(path) else {
        return 0;
    };

    let disks = Disks::new_with_refreshed_list();
    disks
        .list()
        .iter()
        .filter(|disk| absolute.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().as_os_str().len())
        .map(|disk| disk.available_space())
        .unwrap_or(0)
}

/// Move a file, falling back to copy and delete when the rename crosses volumes.
pub fn move_file(from: &Utf8Path, to: &Utf8Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
            tracing::debug!("Cross-volume move, copying {} to {}", from, to);
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
        Err(err) => Err(err),
    }
}

/// Create the destination's folder and [`move_file`] on the blocking pool.
///
/// Cross-volume moves copy the whole file, which must not stall the runtime.
pub async fn move_file_off_runtime(from: &Utf8Path, to: &Utf8Path) -> io::Result<()> {
    let (from, to) = (from.to_path_buf(), to.to_path_buf());
    tokio::task::spawn_blocking(move || {
        if let Some(folder) = to.parent().filter(|folder| !folder.as_str().is_empty()) {
            fs::create_dir_all(folder)?;
        }
        move_file(&from, &to)
    })
    .await
    .map_err(io::Error::other)?
}
