//! Filesystem utilities for atomic writes and output directory preparation.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Atomically rename a file, with fallback for platforms where rename fails if target exists.
///
/// On some platforms (notably Windows), `fs::rename` fails if the destination already exists.
/// This function handles that case by removing the destination first and retrying.
///
/// If the rename ultimately fails, the temp file is cleaned up.
///
/// # Errors
///
/// Returns an error if the rename fails even after the fallback attempt.
pub fn rename_with_fallback(temp_path: &Path, destination: &Path) -> io::Result<()> {
    if let Err(initial_err) = fs::rename(temp_path, destination) {
        let _ = fs::remove_file(destination);
        fs::rename(temp_path, destination).map_err(|retry_err| {
            let _ = fs::remove_file(temp_path);
            io::Error::new(
                retry_err.kind(),
                format!(
                    "Atomic rename failed (initial: {}, retry: {})",
                    initial_err, retry_err
                ),
            )
        })?;
    }
    Ok(())
}

/// Write `data` to `path` via a sibling temp file and a rename.
///
/// Missing parent directories are created.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid output filename: {}", path.display()),
            )
        })?;
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    let temp_path = parent.join(format!(".{}.{}.tmp", filename, nanos));

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)?;
    if let Err(err) = file.write_all(data).and_then(|()| file.sync_all()) {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }
    drop(file);

    rename_with_fallback(&temp_path, path)
}

/// Remove everything inside `dir`, keeping the directory itself.
///
/// A missing directory is not an error. Returns the number of removed entries.
pub fn clean_dir(dir: &Path) -> io::Result<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(err),
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
        removed += 1;
    }
    Ok(removed)
}

/// Remove a file if it exists.
pub fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_rename_overwrites_existing() {
        let dir = tempdir().unwrap();
        let temp = dir.path().join("temp.txt");
        let dest = dir.path().join("dest.txt");

        File::create(&dest).unwrap().write_all(b"old").unwrap();
        File::create(&temp).unwrap().write_all(b"new").unwrap();

        rename_with_fallback(&temp, &dest).unwrap();

        assert!(!temp.exists());
        assert_eq!(fs::read_to_string(&dest).unwrap(), "new");
    }

    #[test]
    fn test_write_atomic_creates_parents() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("nested/deeper/cards.json");

        write_atomic(&dest, b"[]").unwrap();
        write_atomic(&dest, b"[1]").unwrap();

        assert_eq!(fs::read_to_string(&dest).unwrap(), "[1]");
        let leftovers: Vec<_> = fs::read_dir(dest.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_clean_dir_keeps_directory() {
        let dir = tempdir().unwrap();
        let images = dir.path().join("images");
        fs::create_dir_all(images.join("sub")).unwrap();
        File::create(images.join("a.png")).unwrap();
        File::create(images.join("sub/b.png")).unwrap();

        assert_eq!(clean_dir(&images).unwrap(), 2);
        assert!(images.is_dir());
        assert_eq!(fs::read_dir(&images).unwrap().count(), 0);
        assert_eq!(clean_dir(&dir.path().join("missing")).unwrap(), 0);
    }

    #[test]
    fn test_remove_if_exists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cards.json");
        assert!(!remove_if_exists(&path).unwrap());
        File::create(&path).unwrap();
        assert!(remove_if_exists(&path).unwrap());
    }
}
