//! Runtime statistics reported by the `uptime` / `debug` skill.

use std::{
    ops::Deref,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

/// Shared runtime counters.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone, Debug)]
pub struct RuntimeStats {
    inner: Arc<RuntimeStatsInner>,
}

#[derive(Debug)]
pub struct RuntimeStatsInner {
    triggers: AtomicU64,
    convos: AtomicU64,
    started: Instant,
}

/// A point-in-time copy of the counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub triggers: u64,
    pub convos: u64,
    pub uptime: Duration,
}

impl Deref for RuntimeStats {
    type Target = RuntimeStatsInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Default for RuntimeStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeStats {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RuntimeStatsInner {
                triggers: AtomicU64::new(0),
                convos: AtomicU64::new(0),
                started: Instant::now(),
            }),
        }
    }
}

impl RuntimeStatsInner {
    /// Records that a skill pattern matched an incoming message.
    pub fn heard_trigger(&self) {
        self.triggers.fetch_add(1, Ordering::Relaxed);
    }

    /// Records that a conversation was activated.
    pub fn conversation_started(&self) {
        self.convos.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            triggers: self.triggers.load(Ordering::Relaxed),
            convos: self.convos.load(Ordering::Relaxed),
            uptime: self.uptime(),
        }
    }
}

/// Formats a number of seconds as a coarse human string, e.g. `"5 minutes"`.
///
/// The value is demoted at most twice (seconds, then minutes, then hours) and
/// truncated, not rounded.
pub fn format_uptime(seconds: f64) -> String {
    let mut value = seconds;
    let mut unit = "second";

    if value >= 60.0 {
        value /= 60.0;
        unit = "minute";
    }

    if value >= 60.0 {
        value /= 60.0;
        unit = "hour";
    }

    let whole = value.trunc() as u64;
    let plural = if whole == 1 { "" } else { "s" };

    format!("{whole} {unit}{plural}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime_examples() {
        assert_eq!(format_uptime(30.0), "30 seconds");
        assert_eq!(format_uptime(1.0), "1 second");
        assert_eq!(format_uptime(90.0), "1 minute");
        assert_eq!(format_uptime(3600.0), "1 hour");
        assert_eq!(format_uptime(7200.0), "2 hours");
    }

    #[test]
    fn test_format_uptime_truncates() {
        assert_eq!(format_uptime(0.4), "0 seconds");
        assert_eq!(format_uptime(1.9), "1 second");
        assert_eq!(format_uptime(119.0), "1 minute");
        assert_eq!(format_uptime(5400.0), "1 hour");
    }

    #[test]
    fn test_format_uptime_never_goes_past_hours() {
        // Ten days is still reported in hours.
        assert_eq!(format_uptime(864_000.0), "240 hours");
    }

    #[test]
    fn test_counters() {
        let stats = RuntimeStats::new();
        let shared = stats.clone();

        shared.heard_trigger();
        shared.heard_trigger();
        stats.conversation_started();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.triggers, 2);
        assert_eq!(snapshot.convos, 1);
    }
}
