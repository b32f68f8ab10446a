use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{descriptor::Value, error::PrefsError};

/// Last committed user value of one tunable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PersistedValue {
    Bool(bool),
    Int(i64),
    List(Vec<i64>),
    /// Older list preferences stored numbers as strings ("5").
    Text(String),
}

impl PersistedValue {
    pub fn to_value(&self) -> Option<Value> {
        match self {
            PersistedValue::Bool(b) => Some(Value::from(*b)),
            PersistedValue::Int(v) => Some(Value::from(*v)),
            PersistedValue::List(v) if !v.is_empty() => Some(Value::from(v.clone())),
            PersistedValue::List(_) => None,
            PersistedValue::Text(s) => s.parse().ok(),
        }
    }

    pub fn from_value(value: &Value, switch: bool) -> Self {
        match value.components() {
            [one] if switch => PersistedValue::Bool(*one != 0),
            [one] => PersistedValue::Int(*one),
            many => PersistedValue::List(many.to_vec()),
        }
    }
}

/// Durable key -> value store owned by the host.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<PersistedValue>;

    fn put(&mut self, key: &str, value: PersistedValue);

    /// Make every `put` so far durable.
    fn commit(&mut self) -> Result<(), PrefsError>;
}

/// Volatile store; embedding hosts and tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryPrefs {
    values: BTreeMap<String, PersistedValue>,
    commits: usize,
}

impl MemoryPrefs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commits(&self) -> usize {
        self.commits
    }
}

impl PreferenceStore for MemoryPrefs {
    fn get(&self, key: &str) -> Option<PersistedValue> {
        self.values.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: PersistedValue) {
        self.values.insert(key.to_string(), value);
    }

    fn commit(&mut self) -> Result<(), PrefsError> {
        self.commits += 1;
        Ok(())
    }
}

/// JSON object file, rewritten atomically on every commit.
#[derive(Debug)]
pub struct JsonPrefs {
    path: PathBuf,
    values: BTreeMap<String, PersistedValue>,
    dirty: bool,
    /// Set when the file exists but could not be read; commits then refuse
    /// to replace it.
    unreadable: Option<io::ErrorKind>,
}

impl JsonPrefs {
    /// A missing file starts empty; a corrupt one is logged and starts empty
    /// (the next commit replaces it). Any other read error leaves the file
    /// alone for the life of this store.
    pub fn load(path: &Path) -> Self {
        let mut unreadable = None;
        let values = match fs::read_to_string(path) {
            Ok(s) => match serde_json::from_str::<BTreeMap<String, PersistedValue>>(&s) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!("PREFS: failed to parse {}: {} (starting empty)", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::error!("PREFS: cannot read {}: {} (saving disabled)", path.display(), e);
                unreadable = Some(e.kind());
                BTreeMap::new()
            }
        };
        tracing::debug!("PREFS: {} entries from {}", values.len(), path.display());
        Self { path: path.to_path_buf(), values, dirty: false, unreadable }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PreferenceStore for JsonPrefs {
    fn get(&self, key: &str) -> Option<PersistedValue> {
        self.values.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: PersistedValue) {
        self.values.insert(key.to_string(), value);
        self.dirty = true;
    }

    fn commit(&mut self) -> Result<(), PrefsError> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(kind) = self.unreadable {
            return Err(PrefsError::Io {
                path: self.path.clone(),
                source: io::Error::new(kind, "existing file could not be read, not overwriting it"),
            });
        }
        let data = serde_json::to_string_pretty(&self.values)?;
        write_atomic(&self.path, data.as_bytes()).map_err(|source| PrefsError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.dirty = false;
        Ok(())
    }
}

/// Write `*.tmp` next to `path`, then rename over it.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = PathBuf::from(format!("{}.tmp", path.display()));
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_value_shapes() {
        assert_eq!(PersistedValue::from_value(&Value::from(1), true), PersistedValue::Bool(true));
        assert_eq!(PersistedValue::from_value(&Value::from(70), false), PersistedValue::Int(70));
        assert_eq!(
            PersistedValue::from_value(&Value::from([1, 2, 3]), false),
            PersistedValue::List(vec![1, 2, 3])
        );
        assert_eq!(PersistedValue::Text("5".into()).to_value(), Some(Value::from(5)));
        assert_eq!(PersistedValue::Text("five".into()).to_value(), None);
        assert_eq!(PersistedValue::List(vec![]).to_value(), None);
    }

    #[test]
    fn json_prefs_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs/tunables.json");

        let mut prefs = JsonPrefs::load(&path);
        assert!(prefs.is_empty());
        prefs.put("gamma_offset", PersistedValue::List(vec![60, 70, 80]));
        prefs.put("deepidle", PersistedValue::Bool(false));
        prefs.commit().unwrap();
        assert!(!dir.path().join("prefs/tunables.json.tmp").exists());

        let again = JsonPrefs::load(&path);
        assert_eq!(again.get("gamma_offset"), Some(PersistedValue::List(vec![60, 70, 80])));
        assert_eq!(again.get("deepidle"), Some(PersistedValue::Bool(false)));
        assert_eq!(again.get("missing"), None);
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tunables.json");
        fs::write(&path, "{not json").unwrap();
        assert!(JsonPrefs::load(&path).is_empty());
    }

    #[test]
    fn unreadable_file_is_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in place of the file: reading fails with something
        // other than NotFound.
        let path = dir.path().join("tunables.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "x").unwrap();

        let mut prefs = JsonPrefs::load(&path);
        assert!(prefs.is_empty());
        prefs.put("deepidle", PersistedValue::Bool(true));
        assert!(matches!(prefs.commit(), Err(PrefsError::Io { .. })));
        assert!(path.join("keep").exists());
        assert!(!dir.path().join("tunables.json.tmp").exists());
    }
}
