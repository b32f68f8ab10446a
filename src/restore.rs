use crate::{
    controller::Controller,
    descriptor::Value,
    error::TunableError,
    prefs::PreferenceStore,
    sysfs::BackingStore,
};

#[derive(Debug, Default)]
pub struct RestoreReport {
    pub restored: Vec<(String, Value)>,
    /// Unsupported on this kernel, or not restored at boot.
    pub skipped: Vec<String>,
    /// Supported but never committed; the hardware keeps its own value.
    pub unchanged: Vec<String>,
    pub failed: Vec<(String, TunableError)>,
}

impl RestoreReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Re-apply every supported tunable's last committed value.
///
/// A tunable without a committed value is not written at all: re-encoding
/// what the kernel holds could round it. A failing tunable is logged and
/// skipped; the rest still restore. Meant to run once per boot.
pub fn restore_all<S: BackingStore, P: PreferenceStore>(controller: &Controller<S, P>) -> RestoreReport {
    let mut report = RestoreReport::default();

    for desc in controller.registry().iter() {
        let key = desc.key.as_str();
        if !desc.restore || !desc.is_supported(controller.store()) {
            tracing::debug!("RESTORE: {} skipped", key);
            report.skipped.push(key.to_string());
            continue;
        }

        let Some(value) = controller.persisted(key) else {
            tracing::debug!("RESTORE: {} has no saved value, left as is", key);
            report.unchanged.push(key.to_string());
            continue;
        };

        match controller.set_live(key, value) {
            Ok(applied) => {
                tracing::debug!("RESTORE: {} = {}", key, applied);
                report.restored.push((key.to_string(), applied));
            }
            Err(e) => {
                tracing::warn!("RESTORE: {} failed: {}", key, e);
                report.failed.push((key.to_string(), e));
            }
        }
    }

    tracing::info!(
        "RESTORE: {} restored | {} unchanged | {} skipped | {} failed",
        report.restored.len(),
        report.unchanged.len(),
        report.skipped.len(),
        report.failed.len()
    );
    report
}
