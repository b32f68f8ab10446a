//! Device tunables: detect, read, live-adjust, persist and boot-restore
//! kernel-exposed hardware knobs (display color, gamma, governor tuning,
//! codec switches, backlight timing, vibrator intensity).

pub mod config;
pub mod controller;
pub mod descriptor;
pub mod error;
pub mod fmt;
pub mod idle_stats;
pub mod prefs;
pub mod presets;
pub mod restore;
pub mod sysfs;
pub mod transform;
pub mod tuning_config;

pub use controller::{Controller, Session};
pub use descriptor::{Descriptor, Range, Registry, Value};
pub use error::{ConfigError, PrefsError, StoreError, TunableError};
pub use prefs::{JsonPrefs, MemoryPrefs, PersistedValue, PreferenceStore};
pub use presets::{apply_and_commit, apply_preset, Preset, PresetEntry};
pub use restore::{restore_all, RestoreReport};
pub use sysfs::{BackingStore, SysfsStore};
pub use transform::Transform;
