//! Filesystem seam used by the `fs` domain.
//!
//! Handlers talk to a [`FileSystem`] trait object rather than `std::fs`
//! directly so that tests can substitute failures that are awkward to provoke
//! on a real disk.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::UNIX_EPOCH;

use serde::Serialize;

/// Metadata returned by `stat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStat {
    /// Entry is a directory.
    pub is_directory: bool,
    /// Entry is a regular file.
    pub is_file: bool,
    /// Size in bytes.
    pub size: u64,
    /// Modification time in milliseconds since the Unix epoch.
    pub mtime: u64,
}

/// One entry returned by `readDir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirEntryInfo {
    /// File name without the parent path.
    pub name: String,
    /// Entry is a directory.
    pub is_directory: bool,
    /// Entry is a regular file.
    pub is_file: bool,
}

/// Operations the `fs` domain needs from the host filesystem.
pub trait FileSystem: Send + Sync {
    /// Reads a file as UTF-8 text.
    fn read(&self, path: &Path) -> io::Result<String>;
    /// Creates or truncates a file with `contents`.
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;
    /// Appends `contents`, creating the file if needed.
    fn append(&self, path: &Path, contents: &str) -> io::Result<()>;
    /// Deletes a file.
    fn remove_file(&self, path: &Path) -> io::Result<()>;
    /// Creates a directory, optionally with missing parents.
    fn create_dir(&self, path: &Path, recursive: bool) -> io::Result<()>;
    /// Removes a directory, optionally with its contents.
    fn remove_dir(&self, path: &Path, recursive: bool) -> io::Result<()>;
    /// Copies a file.
    fn copy(&self, from: &Path, to: &Path) -> io::Result<()>;
    /// Moves or renames an entry.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    /// Reads entry metadata.
    fn metadata(&self, path: &Path) -> io::Result<FileStat>;
    /// Lists a directory, sorted by name.
    fn list(&self, path: &Path) -> io::Result<Vec<DirEntryInfo>>;
    /// Returns `true` when the path exists.
    fn exists(&self, path: &Path) -> bool;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeFileSystem;

impl FileSystem for NativeFileSystem {
    fn read(&self, path: &Path) -> io::Result<String> {
        if path.is_dir() {
            return Err(io::Error::from(io::ErrorKind::IsADirectory));
        }
        fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        fs::write(path, contents)
    }

    fn append(&self, path: &Path, contents: &str) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(contents.as_bytes())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        if path.is_dir() {
            return Err(io::Error::from(io::ErrorKind::IsADirectory));
        }
        fs::remove_file(path)
    }

    fn create_dir(&self, path: &Path, recursive: bool) -> io::Result<()> {
        if recursive {
            fs::create_dir_all(path)
        } else {
            fs::create_dir(path)
        }
    }

    fn remove_dir(&self, path: &Path, recursive: bool) -> io::Result<()> {
        if recursive {
            fs::remove_dir_all(path)
        } else {
            fs::remove_dir(path)
        }
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::copy(from, to).map(|_| ())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn metadata(&self, path: &Path) -> io::Result<FileStat> {
        let metadata = fs::metadata(path)?;
        let mtime = metadata
            .modified()
            .ok()
            .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
        Ok(FileStat {
            is_directory: metadata.is_dir(),
            is_file: metadata.is_file(),
            size: metadata.len(),
            mtime,
        })
    }

    fn list(&self, path: &Path) -> io::Result<Vec<DirEntryInfo>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            entries.push(DirEntryInfo {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_directory: file_type.is_dir(),
                is_file: file_type.is_file(),
            });
        }
        entries.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(entries)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn append_creates_then_extends() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("log.txt");
        let fs = NativeFileSystem;

        fs.append(&path, "a").expect("first append");
        fs.append(&path, "b").expect("second append");

        assert_eq!(fs.read(&path).expect("read back"), "ab");
    }

    #[test]
    fn reading_a_directory_is_rejected() {
        let dir = TempDir::new().expect("temp dir");
        let error = NativeFileSystem
            .read(dir.path())
            .expect_err("directories are not readable as text");
        assert_eq!(error.kind(), io::ErrorKind::IsADirectory);
    }

    #[test]
    fn list_is_sorted_by_name() {
        let dir = TempDir::new().expect("temp dir");
        fs::write(dir.path().join("b.txt"), "").expect("write b");
        fs::write(dir.path().join("a.txt"), "").expect("write a");
        fs::create_dir(dir.path().join("c")).expect("mkdir c");

        let entries = NativeFileSystem.list(dir.path()).expect("list");

        let names: Vec<&str> = entries.iter().map(|entry| entry.name.as_str()).collect();
        assert_eq!(names, ["a.txt", "b.txt", "c"]);
        assert!(entries.last().is_some_and(|entry| entry.is_directory));
    }

    #[test]
    fn metadata_reports_size_and_kind() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("t.txt");
        fs::write(&path, "hello").expect("write");

        let stat = NativeFileSystem.metadata(&path).expect("stat");

        assert!(stat.is_file);
        assert!(!stat.is_directory);
        assert_eq!(stat.size, 5);
        assert!(stat.mtime > 0);
    }
}
