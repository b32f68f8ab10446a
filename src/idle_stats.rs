use std::{fmt, path::Path};

use crate::{
    config::{DEEPIDLE_RESET, DEEPIDLE_STATS},
    error::TunableError,
    sysfs::BackingStore,
};

pub const IDLE_STATS_KEY: &str = "deepidle_stats";

/// Idle states reported by the deepidle driver, in file order.
pub const IDLE_STATES: [&str; 3] = ["IDLE", "AFTR", "LPA"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdleState {
    pub name: &'static str,
    /// Total time spent in the state, as the driver prints it.
    pub time: String,
    pub average: String,
}

/// Snapshot of `idle_stats_list`: one time/average pair per idle state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdleStats {
    pub states: Vec<IdleState>,
}

impl IdleStats {
    pub fn parse(line: &str) -> Result<Self, TunableError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 2 * IDLE_STATES.len() {
            return Err(TunableError::InvalidValue {
                key: IDLE_STATS_KEY.to_string(),
                reason: format!("expected {} fields, got {}", 2 * IDLE_STATES.len(), fields.len()),
            });
        }
        let states = IDLE_STATES
            .iter()
            .zip(fields.chunks(2))
            .map(|(&name, pair)| IdleState {
                name,
                time: pair[0].to_string(),
                average: pair[1].to_string(),
            })
            .collect();
        Ok(Self { states })
    }
}

impl fmt::Display for IdleStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.states {
            writeln!(f, "{:<6} time {:>12}  avg {:>10}", s.name, s.time, s.average)?;
        }
        Ok(())
    }
}

/// Stats are there when the driver exposes both the list and its reset node.
pub fn idle_stats_supported<S: BackingStore + ?Sized>(store: &S) -> bool {
    store.exists(Path::new(DEEPIDLE_STATS)) && store.exists(Path::new(DEEPIDLE_RESET))
}

pub fn read_idle_stats<S: BackingStore + ?Sized>(store: &S) -> Result<IdleStats, TunableError> {
    if !idle_stats_supported(store) {
        return Err(TunableError::UnsupportedParameter(IDLE_STATS_KEY.to_string()));
    }
    let line = store.read_line(Path::new(DEEPIDLE_STATS))?;
    IdleStats::parse(&line)
}

/// Zero the driver's counters.
pub fn reset_idle_stats<S: BackingStore + ?Sized>(store: &S) -> Result<(), TunableError> {
    if !idle_stats_supported(store) {
        return Err(TunableError::UnsupportedParameter(IDLE_STATS_KEY.to_string()));
    }
    store.write_line(Path::new(DEEPIDLE_RESET), "1")?;
    tracing::info!("TUNE: {} reset", IDLE_STATS_KEY);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_pairs_in_order() {
        let stats = IdleStats::parse("1200 3 45000 150 7 1\n").unwrap();
        assert_eq!(stats.states.len(), 3);
        assert_eq!(stats.states[0], IdleState { name: "IDLE", time: "1200".into(), average: "3".into() });
        assert_eq!(stats.states[1].time, "45000");
        assert_eq!(stats.states[2].name, "LPA");
        assert_eq!(stats.states[2].average, "1");
    }

    #[test]
    fn short_line_is_invalid() {
        let err = IdleStats::parse("1200 3 45000").unwrap_err();
        assert!(matches!(err, TunableError::InvalidValue { ref key, .. } if key == IDLE_STATS_KEY));
        assert!(IdleStats::parse("").is_err());
    }
}
