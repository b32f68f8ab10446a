use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::error::StoreError;

/// One-scalar-per-file store (kernel pseudo-files).
///
/// Writes are synchronous and unbuffered: the value is live as soon as
/// `write_line` returns.
pub trait BackingStore {
    /// False on any I/O error.
    fn exists(&self, path: &Path) -> bool;

    /// First line of the file, trimmed. Empty files are unavailable.
    fn read_line(&self, path: &Path) -> Result<String, StoreError>;

    /// Replace the file content with `value` and a newline.
    fn write_line(&self, path: &Path, value: &str) -> Result<(), StoreError>;
}

/// Real filesystem store. With a root prefix every absolute descriptor path
/// is looked up below that directory (staging trees, tests).
#[derive(Clone, Debug, Default)]
pub struct SysfsStore {
    root: Option<PathBuf>,
}

impl SysfsStore {
    pub fn new() -> Self {
        Self { root: None }
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: Some(root.into()) }
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            None => path.to_path_buf(),
            Some(root) => root.join(path.strip_prefix("/").unwrap_or(path)),
        }
    }
}

pub fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or("").trim()
}

impl BackingStore for SysfsStore {
    fn exists(&self, path: &Path) -> bool {
        fs::metadata(self.resolve(path)).is_ok()
    }

    fn read_line(&self, path: &Path) -> Result<String, StoreError> {
        let full = self.resolve(path);
        let s = fs::read_to_string(&full).map_err(|e| StoreError::new(path, e))?;
        let line = first_line(&s);
        if line.is_empty() {
            return Err(StoreError::empty(path));
        }
        Ok(line.to_string())
    }

    fn write_line(&self, path: &Path, value: &str) -> Result<(), StoreError> {
        let full = self.resolve(path);
        // No `create`: a missing node means the driver is not there.
        let mut f = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&full)
            .map_err(|e| StoreError::new(path, e))?;
        f.write_all(format!("{}\n", value).as_bytes())
            .map_err(|e| StoreError::new(path, e))?;
        tracing::trace!("STORE: {} <- {}", path.display(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staged(files: &[(&str, &str)]) -> (tempfile::TempDir, SysfsStore) {
        let dir = tempfile::tempdir().unwrap();
        for (p, content) in files {
            let full = dir.path().join(p.trim_start_matches('/'));
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        let store = SysfsStore::with_root(dir.path());
        (dir, store)
    }

    #[test]
    fn reads_first_line_trimmed() {
        let (_dir, store) = staged(&[("/sys/a/value", "  42 \nignored\n")]);
        assert_eq!(store.read_line(Path::new("/sys/a/value")).unwrap(), "42");
    }

    #[test]
    fn empty_or_missing_is_unavailable() {
        let (_dir, store) = staged(&[("/sys/a/empty", "\n")]);
        assert!(store.read_line(Path::new("/sys/a/empty")).is_err());
        assert!(store.read_line(Path::new("/sys/a/missing")).is_err());
        assert!(!store.exists(Path::new("/sys/a/missing")));
        assert!(store.exists(Path::new("/sys/a/empty")));
    }

    #[test]
    fn write_replaces_content_and_never_creates() {
        let (dir, store) = staged(&[("/sys/a/value", "1234567\n")]);
        store.write_line(Path::new("/sys/a/value"), "-5").unwrap();
        let s = fs::read_to_string(dir.path().join("sys/a/value")).unwrap();
        assert_eq!(s, "-5\n");

        let err = store.write_line(Path::new("/sys/a/nope"), "1").unwrap_err();
        assert_eq!(err.path, Path::new("/sys/a/nope"));
        assert!(!dir.path().join("sys/a/nope").exists());
    }
}
