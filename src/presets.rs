use serde::{Deserialize, Serialize};

use crate::{
    controller::{Controller, Session},
    descriptor::Value,
    error::TunableError,
    prefs::PreferenceStore,
    sysfs::BackingStore,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetEntry {
    pub key: String,
    pub value: Value,
}

/// Named bundle of values applied in order. Applying never persists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    #[serde(default)]
    pub title: String,
    pub values: Vec<PresetEntry>,
}

impl Preset {
    pub fn new(name: &str, title: &str, values: Vec<(&str, Value)>) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            values: values
                .into_iter()
                .map(|(key, value)| PresetEntry { key: key.to_string(), value })
                .collect(),
        }
    }

    /// Distinct keys, first-seen order.
    pub fn keys(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for e in &self.values {
            if !out.contains(&e.key.as_str()) {
                out.push(&e.key);
            }
        }
        out
    }
}

/// Exact name first, then case-insensitive.
pub fn find_preset<'a>(presets: &'a [Preset], name: &str) -> Option<&'a Preset> {
    presets
        .iter()
        .find(|p| p.name == name)
        .or_else(|| presets.iter().find(|p| p.name.eq_ignore_ascii_case(name)))
}

#[derive(Debug, Default)]
pub struct PresetReport {
    pub applied: Vec<(String, Value)>,
    /// Keys this kernel does not support.
    pub skipped: Vec<String>,
}

/// Live-apply every entry. Unsupported keys are skipped; the first write
/// failure stops the preset and is returned.
pub fn apply_preset<S: BackingStore, P: PreferenceStore>(
    controller: &Controller<S, P>,
    preset: &Preset,
) -> Result<PresetReport, TunableError> {
    let mut report = PresetReport::default();

    for entry in &preset.values {
        if !controller.is_supported(&entry.key) {
            // Unknown keys are a configuration error, not a missing driver.
            controller.descriptor(&entry.key)?;
            tracing::warn!("PRESET: {}: {} unsupported, skipped", preset.name, entry.key);
            report.skipped.push(entry.key.clone());
            continue;
        }
        let applied = controller.set_live(&entry.key, entry.value.clone())?;
        report.applied.push((entry.key.clone(), applied));
    }

    tracing::info!(
        "PRESET: {} applied ({} values, {} skipped)",
        preset.name,
        report.applied.len(),
        report.skipped.len()
    );
    Ok(report)
}

/// Apply inside sessions and commit each affected key. On failure the
/// sessions are dropped, which rolls the hardware back.
pub fn apply_and_commit<S: BackingStore, P: PreferenceStore>(
    controller: &Controller<S, P>,
    preset: &Preset,
) -> Result<PresetReport, TunableError> {
    let mut sessions: Vec<Session<'_, S, P>> = Vec::new();
    for key in preset.keys() {
        if controller.is_supported(key) {
            sessions.push(controller.open(key)?);
        }
    }

    let report = apply_preset(controller, preset)?;

    for s in sessions {
        s.commit()?;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_is_exact_then_case_insensitive() {
        let presets = vec![
            Preset::new("Warm", "", vec![]),
            Preset::new("warm", "", vec![]),
            Preset::new("Cold", "", vec![]),
        ];
        assert_eq!(find_preset(&presets, "warm").map(|p| p.name.as_str()), Some("warm"));
        assert_eq!(find_preset(&presets, "COLD").map(|p| p.name.as_str()), Some("Cold"));
        assert!(find_preset(&presets, "none").is_none());
    }

    #[test]
    fn keys_are_deduplicated_in_order() {
        let p = Preset::new(
            "p",
            "",
            vec![("b", Value::from(1)), ("a", Value::from(2)), ("b", Value::from(3))],
        );
        assert_eq!(p.keys(), vec!["b", "a"]);
    }
}
