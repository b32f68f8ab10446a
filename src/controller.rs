use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use crate::{
    descriptor::{Descriptor, Registry, Value},
    error::TunableError,
    prefs::{PersistedValue, PreferenceStore},
    sysfs::BackingStore,
    transform::Transform,
};

// Poisoning only means another caller panicked mid-operation; the maps stay usable.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Shared edit state of one key while at least one session is open.
#[derive(Debug)]
struct SessionEntry {
    count: usize,
    original: Value,
    /// Raw lines seen at open time, when every path was readable.
    original_raw: Option<Vec<String>>,
    pending: Value,
    /// A live write happened since open (or since the last commit).
    dirty: bool,
}

/// Drives tunables through their descriptor, transform and backing store.
///
/// Sessions on the same key are reference counted: they share the value
/// captured by the first `open`, and only the last one to close may roll the
/// hardware back.
pub struct Controller<S, P> {
    registry: Registry,
    store: S,
    prefs: Mutex<P>,
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl<S: BackingStore, P: PreferenceStore> Controller<S, P> {
    pub fn new(registry: Registry, store: S, prefs: P) -> Self {
        Self {
            registry,
            store,
            prefs: Mutex::new(prefs),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run `f` with exclusive access to the preference store.
    pub fn with_prefs<R>(&self, f: impl FnOnce(&mut P) -> R) -> R {
        f(&mut lock(&self.prefs))
    }

    pub fn descriptor(&self, key: &str) -> Result<&Descriptor, TunableError> {
        self.registry
            .get(key)
            .ok_or_else(|| TunableError::UnknownParameter(key.to_string()))
    }

    pub fn is_supported(&self, key: &str) -> bool {
        self.registry.is_supported(key, &self.store)
    }

    fn supported(&self, key: &str) -> Result<&Descriptor, TunableError> {
        let desc = self.descriptor(key)?;
        if !desc.is_supported(&self.store) {
            return Err(TunableError::UnsupportedParameter(key.to_string()));
        }
        Ok(desc)
    }

    /// Current hardware value; unreadable paths fall back to the default.
    pub fn read_current(&self, key: &str) -> Result<Value, TunableError> {
        let desc = self.descriptor(key)?;
        Ok(self.read_raw(desc).0)
    }

    fn read_raw(&self, desc: &Descriptor) -> (Value, Option<Vec<String>>) {
        let mut comps = Vec::with_capacity(desc.paths.len());
        let mut lines = Vec::with_capacity(desc.paths.len());
        let mut exact = true;

        for path in &desc.paths {
            let read = self.store.read_line(path).map(|line| {
                let user = desc.transform.decode(&line);
                (line, user)
            });
            match read {
                Ok((line, Some(user))) => {
                    comps.push(user);
                    lines.push(line);
                }
                Ok((line, None)) => {
                    tracing::debug!("TUNE: {}: unparsable `{}` in {}, using default", desc.key, line, path.display());
                    comps.push(desc.default);
                    exact = false;
                }
                Err(e) => {
                    tracing::debug!("TUNE: {}: {}, using default", desc.key, e);
                    comps.push(desc.default);
                    exact = false;
                }
            }
        }

        (Value::from(comps), exact.then_some(lines))
    }

    /// Last committed value, if any.
    pub fn persisted(&self, key: &str) -> Option<Value> {
        lock(&self.prefs).get(key).and_then(|v| v.to_value())
    }

    /// Number of sessions currently open on `key`.
    pub fn open_sessions(&self, key: &str) -> usize {
        lock(&self.sessions).get(key).map(|e| e.count).unwrap_or(0)
    }

    pub fn open(&self, key: &str) -> Result<Session<'_, S, P>, TunableError> {
        let desc = self.supported(key)?;
        let mut sessions = lock(&self.sessions);

        match sessions.get_mut(key) {
            Some(entry) => {
                entry.count += 1;
                tracing::debug!("TUNE: {}: joined session ({} open)", key, entry.count);
            }
            None => {
                let (value, raw) = self.read_raw(desc);
                tracing::debug!("TUNE: {}: session opened at {}", key, value);
                sessions.insert(
                    key.to_string(),
                    SessionEntry {
                        count: 1,
                        original: value.clone(),
                        original_raw: raw,
                        pending: value,
                        dirty: false,
                    },
                );
            }
        }

        Ok(Session { controller: self, desc, closed: false })
    }

    /// Clamp, convert and write `value` to every backing path, in order.
    ///
    /// A failure on path `k` leaves paths `0..k` written; the kernel offers no
    /// transaction to undo them. Returns the value actually applied.
    pub fn set_live(&self, key: &str, value: impl Into<Value>) -> Result<Value, TunableError> {
        let desc = self.supported(key)?;
        let comps = desc
            .expand(&value.into())
            .map_err(|reason| TunableError::InvalidValue { key: key.to_string(), reason })?;

        let mut sessions = lock(&self.sessions);
        let entry = sessions.get_mut(key);
        if let Some(entry) = entry {
            entry.dirty = true;
            self.write_through(desc, &comps)?;
            entry.pending = Value::from(comps.clone());
        } else {
            self.write_through(desc, &comps)?;
        }
        Ok(Value::from(comps))
    }

    fn write_through(&self, desc: &Descriptor, comps: &[i64]) -> Result<(), TunableError> {
        for (index, (path, user)) in desc.paths.iter().zip(comps).enumerate() {
            let raw = desc.transform.encode(*user);
            self.store
                .write_line(path, &raw)
                .map_err(|source| TunableError::WriteFailed {
                    key: desc.key.clone(),
                    index,
                    source,
                })?;
        }
        let applied = Value::from(comps.to_vec());
        tracing::debug!("TUNE: {} <- {}", desc.key, applied);
        Ok(())
    }

    fn write_lines(&self, desc: &Descriptor, lines: &[String]) -> Result<(), TunableError> {
        for (index, (path, line)) in desc.paths.iter().zip(lines).enumerate() {
            self.store
                .write_line(path, line)
                .map_err(|source| TunableError::WriteFailed {
                    key: desc.key.clone(),
                    index,
                    source,
                })?;
        }
        Ok(())
    }

    fn commit_session(&self, desc: &Descriptor) -> Result<Value, TunableError> {
        let key = desc.key.as_str();
        let value = {
            let mut sessions = lock(&self.sessions);
            let entry = sessions
                .get_mut(key)
                .ok_or_else(|| TunableError::NoSession(key.to_string()))?;

            let value = entry.pending.clone();
            entry.count -= 1;
            // Sessions still open now roll back to the committed value.
            entry.original = value.clone();
            entry.original_raw = None;
            entry.dirty = false;
            if entry.count == 0 {
                sessions.remove(key);
            }
            value
        };

        let switch = matches!(desc.transform, Transform::Boolean);
        let mut prefs = lock(&self.prefs);
        prefs.put(key, PersistedValue::from_value(&value, switch));
        prefs.commit()?;
        tracing::info!("TUNE: {} committed {}", key, value);
        Ok(value)
    }

    fn discard_session(&self, desc: &Descriptor) -> Result<bool, TunableError> {
        let key = desc.key.as_str();
        let mut sessions = lock(&self.sessions);
        let entry = sessions
            .get_mut(key)
            .ok_or_else(|| TunableError::NoSession(key.to_string()))?;

        entry.count -= 1;
        if entry.count > 0 {
            tracing::debug!("TUNE: {}: discard deferred ({} still open)", key, entry.count);
            return Ok(false);
        }

        let Some(entry) = sessions.remove(key) else {
            return Ok(false);
        };
        if !entry.dirty {
            return Ok(false);
        }

        match &entry.original_raw {
            Some(lines) => self.write_lines(desc, lines)?,
            None => {
                let comps = desc
                    .expand(&entry.original)
                    .map_err(|reason| TunableError::InvalidValue { key: key.to_string(), reason })?;
                self.write_through(desc, &comps)?;
            }
        }
        tracing::info!("TUNE: {} rolled back to {}", key, entry.original);
        Ok(true)
    }
}

/// One open edit of a tunable. Closing it without `commit` is a `discard`.
pub struct Session<'a, S: BackingStore, P: PreferenceStore> {
    controller: &'a Controller<S, P>,
    desc: &'a Descriptor,
    closed: bool,
}

impl<'a, S: BackingStore, P: PreferenceStore> Session<'a, S, P> {
    pub fn key(&self) -> &'a str {
        &self.desc.key
    }

    pub fn descriptor(&self) -> &'a Descriptor {
        self.desc
    }

    fn entry_value(&self, pick: impl FnOnce(&SessionEntry) -> Value) -> Value {
        lock(&self.controller.sessions)
            .get(self.key())
            .map(pick)
            .unwrap_or_else(|| self.desc.default_value())
    }

    /// Value captured when the first session on this key opened.
    pub fn original(&self) -> Value {
        self.entry_value(|e| e.original.clone())
    }

    /// Value currently live on the hardware.
    pub fn pending(&self) -> Value {
        self.entry_value(|e| e.pending.clone())
    }

    pub fn set_live(&self, value: impl Into<Value>) -> Result<Value, TunableError> {
        self.controller.set_live(self.key(), value)
    }

    /// Persist the live value.
    pub fn commit(mut self) -> Result<Value, TunableError> {
        self.closed = true;
        self.controller.commit_session(self.desc)
    }

    /// Close without saving. Returns true when this was the last session and
    /// the hardware was rolled back.
    pub fn discard(mut self) -> Result<bool, TunableError> {
        self.closed = true;
        self.controller.discard_session(self.desc)
    }
}

impl<S: BackingStore, P: PreferenceStore> Drop for Session<'_, S, P> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.controller.discard_session(self.desc) {
            tracing::warn!("TUNE: {}: discard on drop failed: {}", self.desc.key, e);
        }
    }
}
