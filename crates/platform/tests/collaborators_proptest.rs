//! Property-based tests for the collaborator helpers.
//! Verifies invariants hold for ALL inputs, not just fixed examples.

// Integration test file -- intentional test patterns permitted.
#![allow(clippy::unwrap_used)]

use platform::{Duration, ElapsedPerf, LiveRegisters, PerfCounter};

proptest::proptest! {
    /// A snapshot always reflects the last value written to every register.
    #[test]
    fn snapshot_reflects_last_writes(
        level in proptest::num::u8::ANY,
        status in proptest::num::u16::ANY,
        arming in proptest::num::u16::ANY,
        features in proptest::num::u16::ANY,
    ) {
        let registers = LiveRegisters::new();
        registers.set_debug_level(level);
        registers.set_status_flags(status);
        registers.set_arming(arming);
        registers.set_features(features);

        let snapshot = registers.snapshot();
        assert_eq!(snapshot.debug_level, level);
        assert_eq!(snapshot.status_flags, status);
        assert_eq!(snapshot.arming, arming);
        assert_eq!(snapshot.features, features);
    }

    /// Worst case bounds the mean, and the last sample is whatever came last.
    #[test]
    fn perf_max_bounds_mean(samples in proptest::collection::vec(0u64..1_000_000, 1..64)) {
        let mut perf = ElapsedPerf::new("mix");
        for &us in &samples {
            perf.record(Duration::from_micros(us));
        }

        let max = samples.iter().copied().max().unwrap();
        assert_eq!(perf.events(), u32::try_from(samples.len()).unwrap());
        assert_eq!(perf.max(), Duration::from_micros(max));
        assert!(perf.mean() <= perf.max());
        assert_eq!(perf.last(), Duration::from_micros(*samples.last().unwrap()));
    }
}
