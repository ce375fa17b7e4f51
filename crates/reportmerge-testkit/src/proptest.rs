//! Proptest strategies for reportmerge property-based testing.

use crate::BundleFixture;
use ::proptest::prelude::*;
use reportmerge_schema::{Extra, Stats};

pub const FILE_ID_POOL: [&str; 4] = ["alpha", "beta", "gamma", "delta"];
pub const PROJECT_POOL: [&str; 3] = ["chromium", "firefox", "webkit"];

/// Stats with whole-number durations so float sums stay exact.
pub fn strategy_stats() -> impl Strategy<Value = Stats> {
    (
        0u64..1000,
        0u64..1000,
        0u64..1000,
        0u64..1000,
        any::<bool>(),
        0u32..100_000,
    )
        .prop_map(|(expected, unexpected, flaky, skipped, ok, duration)| Stats {
            total: expected + unexpected + flaky + skipped,
            expected,
            unexpected,
            flaky,
            skipped,
            ok,
            duration: f64::from(duration),
            extra: Extra::new(),
        })
}

/// A bundle over a few files drawn from [`FILE_ID_POOL`].
///
/// File ids map to archive paths one-to-one, so bundles generated here never
/// collide with each other.
pub fn strategy_bundle() -> impl Strategy<Value = BundleFixture> {
    (
        prop::sample::subsequence(FILE_ID_POOL.to_vec(), 1..=3),
        prop::sample::select(PROJECT_POOL.to_vec()),
        0usize..4,
        any::<bool>(),
    )
        .prop_map(|(ids, project, tests, ok)| BundleFixture::new(&ids, project, tests, ok))
}

pub fn strategy_bundles(max: usize) -> impl Strategy<Value = Vec<BundleFixture>> {
    prop::collection::vec(strategy_bundle(), 1..=max)
}
