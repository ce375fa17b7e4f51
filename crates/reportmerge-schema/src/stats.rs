use crate::Extra;
use serde::{Deserialize, Serialize};

/// Outcome counters for a file or a whole report.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Stats {
    pub total: u64,
    pub expected: u64,
    pub unexpected: u64,
    pub flaky: u64,
    pub skipped: u64,
    pub ok: bool,
    pub duration: f64,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Default for Stats {
    /// The additive identity: all zero, `ok`.
    fn default() -> Self {
        Self {
            total: 0,
            expected: 0,
            unexpected: 0,
            flaky: 0,
            skipped: 0,
            ok: true,
            duration: 0.0,
            extra: Extra::new(),
        }
    }
}

impl Stats {
    /// Add counts and duration; `ok` only survives if both sides are ok.
    ///
    /// Counters come from producer JSON and saturate at `u64::MAX` instead
    /// of overflowing. Unmodelled fields on `self` are left as they are.
    pub fn accumulate(&mut self, other: &Stats) {
        self.total = self.total.saturating_add(other.total);
        self.expected = self.expected.saturating_add(other.expected);
        self.unexpected = self.unexpected.saturating_add(other.unexpected);
        self.flaky = self.flaky.saturating_add(other.flaky);
        self.skipped = self.skipped.saturating_add(other.skipped);
        self.duration += other.duration;
        self.ok = self.ok && other.ok;
    }

    pub fn merged(a: &Stats, b: &Stats) -> Stats {
        let mut out = a.clone();
        out.accumulate(b);
        out
    }
}
