//! Decay System
//!
//! Linear loss of every stat over wall-clock time since the last snapshot.

use crate::components::{PetStats, Timestamp};

/// Derive current stats from a snapshot taken at `last_saved`.
///
/// Elapsed time before `last_saved` counts as zero, so a clock that runs
/// backwards never restores stats.
pub fn decay(stats: PetStats, last_saved: Timestamp, now: Timestamp, rate: f64) -> PetStats {
    let elapsed_seconds = (now.since(last_saved) as f64 / 1000.0).max(0.0);
    let delta = elapsed_seconds * rate;

    PetStats::new(
        stats.hunger - delta,
        stats.happiness - delta,
        stats.health - delta,
    )
}

/// Seconds until `value` reaches zero at `rate`.
pub fn seconds_to_zero(value: f64, rate: f64) -> f64 {
    if rate <= 0.0 {
        return f64::INFINITY;
    }
    value.max(0.0) / rate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DECAY_RATE;

    const EPS: f64 = 1e-9;

    fn full() -> PetStats {
        PetStats::full()
    }

    #[test]
    fn test_ten_seconds_costs_twenty_points() {
        let out = decay(full(), Timestamp(0), Timestamp(10_000), DECAY_RATE);
        assert_eq!(out, PetStats::new(80.0, 80.0, 80.0));
    }

    #[test]
    fn test_fifty_seconds_empties_full_stats() {
        let out = decay(full(), Timestamp(0), Timestamp(50_000), DECAY_RATE);
        assert_eq!(out, PetStats::zero());
    }

    #[test]
    fn test_matches_closed_form_and_never_increases() {
        for start in [0.0, 12.5, 50.0, 99.0, 100.0] {
            let stats = PetStats::new(start, start, start);
            let mut previous = start;
            for ms in (0..=60_000).step_by(750) {
                let out = decay(stats, Timestamp(0), Timestamp(ms), DECAY_RATE);
                let expected = (start - DECAY_RATE * ms as f64 / 1000.0).clamp(0.0, 100.0);
                assert!((out.hunger - expected).abs() < EPS, "start {} at {}ms", start, ms);
                assert!(out.hunger <= previous + EPS);
                previous = out.hunger;
            }
        }
    }

    #[test]
    fn test_split_decay_equals_single_decay() {
        let stats = PetStats::new(90.0, 70.0, 40.0);
        let once = decay(stats, Timestamp(0), Timestamp(17_300), DECAY_RATE);
        let halfway = decay(stats, Timestamp(0), Timestamp(6_100), DECAY_RATE);
        let twice = decay(halfway, Timestamp(6_100), Timestamp(17_300), DECAY_RATE);

        assert!((once.hunger - twice.hunger).abs() < EPS);
        assert!((once.happiness - twice.happiness).abs() < EPS);
        assert!((once.health - twice.health).abs() < EPS);
    }

    #[test]
    fn test_clock_running_backwards_is_ignored() {
        let stats = PetStats::new(30.0, 30.0, 30.0);
        assert_eq!(decay(stats, Timestamp(5_000), Timestamp(1_000), DECAY_RATE), stats);
    }

    #[test]
    fn test_seconds_to_zero() {
        assert_eq!(seconds_to_zero(100.0, DECAY_RATE), 50.0);
        assert_eq!(seconds_to_zero(-3.0, DECAY_RATE), 0.0);
        assert!(seconds_to_zero(10.0, 0.0).is_infinite());
    }
}
