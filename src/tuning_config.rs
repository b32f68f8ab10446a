use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::Path,
};

use crate::{
    config::{builtin_presets, builtin_tunables, DEVICE_NAME},
    descriptor::{Descriptor, Registry},
    error::ConfigError,
    prefs::write_atomic,
    presets::Preset,
};

/// Device tuning table: which tunables exist and which presets ship.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TuningConfig {
    #[serde(default)]
    pub device: String,

    pub tunables: Vec<Descriptor>,

    #[serde(default)]
    pub presets: Vec<Preset>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Json>,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            device: DEVICE_NAME.to_string(),
            tunables: builtin_tunables(),
            presets: builtin_presets(),
            extra: BTreeMap::new(),
        }
    }
}

impl TuningConfig {
    /// Lenient cleanup: a bad entry is dropped with a warning instead of
    /// rejecting the whole file.
    pub fn validate_and_normalize(&mut self) -> Result<(), String> {
        let mut seen = HashSet::new();
        self.tunables.retain_mut(|d| {
            if !d.range.contains(d.default) && d.range.min <= d.range.max {
                let clamped = d.range.clamp(d.default);
                tracing::warn!("CFG: {}: default {} clamped to {}", d.key, d.default, clamped);
                d.default = clamped;
            }
            if let Err(e) = d.validate() {
                tracing::warn!("CFG: dropping tunable: {}", e);
                return false;
            }
            if !seen.insert(d.key.clone()) {
                tracing::warn!("CFG: dropping duplicate tunable `{}`", d.key);
                return false;
            }
            true
        });

        if self.tunables.is_empty() {
            return Err("no valid tunables".to_string());
        }

        for p in &mut self.presets {
            p.values.retain(|e| {
                let known = seen.contains(&e.key);
                if !known {
                    tracing::warn!("CFG: preset {}: unknown tunable `{}` dropped", p.name, e.key);
                }
                known
            });
        }
        self.presets.retain(|p| !p.values.is_empty());

        Ok(())
    }

    pub fn registry(&self) -> Result<Registry, ConfigError> {
        Registry::new(self.tunables.clone())
    }
}

pub fn load(path: &Path) -> Result<TuningConfig, ConfigError> {
    let s = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut cfg: TuningConfig = serde_json::from_str(&s)?;
    cfg.validate_and_normalize().map_err(|reason| ConfigError::InvalidDescriptor {
        key: "*".to_string(),
        reason,
    })?;
    Ok(cfg)
}

/// Read the config, or write and return the built-in table when it is
/// missing or unusable.
pub fn load_or_init(path: &Path) -> TuningConfig {
    match load(path) {
        Ok(cfg) => cfg,
        Err(ConfigError::Io { .. }) => {
            let def = TuningConfig::default();
            if let Err(e) = write_config_atomic(path, &def) {
                tracing::warn!("CFG: could not write defaults to {}: {}", path.display(), e);
            }
            def
        }
        Err(e) => {
            tracing::error!("CFG: {}: {} (reset to default)", path.display(), e);
            let def = TuningConfig::default();
            if let Err(e) = write_config_atomic(path, &def) {
                tracing::warn!("CFG: could not write defaults to {}: {}", path.display(), e);
            }
            def
        }
    }
}

pub fn write_config_atomic(path: &Path, cfg: &TuningConfig) -> Result<(), ConfigError> {
    let data = serde_json::to_string_pretty(cfg)?;
    write_atomic(path, data.as_bytes()).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
