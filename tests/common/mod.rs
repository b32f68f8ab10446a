#![allow(dead_code)]

use std::{fs, path::PathBuf};

use crespo_parts::{config::builtin_tunables, Controller, JsonPrefs, Registry, SysfsStore};

/// Throwaway sysfs tree plus a preference file next to it.
pub struct Staged {
    pub dir: tempfile::TempDir,
}

impl Staged {
    pub fn new(files: &[(&str, &str)]) -> Self {
        let staged = Staged { dir: tempfile::tempdir().unwrap() };
        for (p, content) in files {
            staged.put(p, content);
        }
        staged
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("sys_root")
    }

    pub fn prefs_path(&self) -> PathBuf {
        self.dir.path().join("prefs.json")
    }

    fn full(&self, p: &str) -> PathBuf {
        self.root().join(p.trim_start_matches('/'))
    }

    pub fn put(&self, p: &str, content: &str) {
        let full = self.full(p);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }

    /// A directory where a node is expected: it exists but every read and
    /// write fails.
    pub fn put_broken(&self, p: &str) {
        fs::create_dir_all(self.full(p)).unwrap();
    }

    pub fn read(&self, p: &str) -> String {
        fs::read_to_string(self.full(p)).unwrap()
    }

    pub fn exists(&self, p: &str) -> bool {
        self.full(p).exists()
    }

    /// Fresh controller over the built-in table, as after a reboot.
    pub fn controller(&self) -> Controller<SysfsStore, JsonPrefs> {
        Controller::new(
            Registry::new(builtin_tunables()).unwrap(),
            SysfsStore::with_root(self.root()),
            JsonPrefs::load(&self.prefs_path()),
        )
    }
}

pub fn triple<'a>(paths: &[&'a str], value: &'a str) -> Vec<(&'a str, &'a str)> {
    paths.iter().map(|p| (*p, value)).collect()
}
