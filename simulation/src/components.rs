//! Value types for a pet and its clock
//!
//! A `PetRecord` is never patched in place by callers; the `with_*` helpers
//! return a new record with exactly one concern changed.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const STAT_MIN: f64 = 0.0;
pub const STAT_MAX: f64 = 100.0;

// ============================================================================
// Time
// ============================================================================

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_millis())
    }

    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }

    /// Signed milliseconds from `earlier` to `self`.
    pub fn since(self, earlier: Timestamp) -> i64 {
        self.0.saturating_sub(earlier.0)
    }

    pub fn plus_millis(self, ms: i64) -> Self {
        Self(self.0.saturating_add(ms))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "{}ms", self.0),
        }
    }
}

/// Source of "now" for a session. Swapped for `ManualClock` in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

// ============================================================================
// Stats
// ============================================================================

fn clamp_stat(value: f64) -> f64 {
    if value.is_nan() {
        return STAT_MIN;
    }
    value.clamp(STAT_MIN, STAT_MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PetStats {
    pub hunger: f64,
    pub happiness: f64,
    pub health: f64,
}

impl PetStats {
    /// Build stats, clamping every value into [0, 100].
    pub fn new(hunger: f64, happiness: f64, health: f64) -> Self {
        Self {
            hunger: clamp_stat(hunger),
            happiness: clamp_stat(happiness),
            health: clamp_stat(health),
        }
    }

    pub fn full() -> Self {
        Self::new(STAT_MAX, STAT_MAX, STAT_MAX)
    }

    pub fn zero() -> Self {
        Self::new(STAT_MIN, STAT_MIN, STAT_MIN)
    }

    /// Re-clamp values that may have come from an untrusted source.
    pub fn clamped(self) -> Self {
        Self::new(self.hunger, self.happiness, self.health)
    }

    /// Hunger or health at or below zero. Happiness never counts.
    pub fn is_critical(&self) -> bool {
        self.hunger <= STAT_MIN || self.health <= STAT_MIN
    }

    /// The lower of the two stats that can kill the pet.
    pub fn vital_floor(&self) -> f64 {
        self.hunger.min(self.health)
    }

    /// Refill the stat an interaction targets.
    pub fn restored(self, kind: InteractionKind) -> Self {
        match kind {
            InteractionKind::Feed => Self { hunger: STAT_MAX, ..self },
            InteractionKind::Play => Self { happiness: STAT_MAX, ..self },
            InteractionKind::Heal => Self { health: STAT_MAX, ..self },
        }
    }
}

impl Default for PetStats {
    fn default() -> Self {
        Self::full()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Feed,
    Play,
    Heal,
}

impl InteractionKind {
    pub const ALL: [InteractionKind; 3] = [
        InteractionKind::Feed,
        InteractionKind::Play,
        InteractionKind::Heal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::Feed => "feed",
            InteractionKind::Play => "play",
            InteractionKind::Heal => "heal",
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Age
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Age {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d {}h {}m", self.days, self.hours, self.minutes)
    }
}

// ============================================================================
// Record
// ============================================================================

/// Everything persisted for one user's pet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetRecord {
    pub pet_type: String,
    pub pet_name: String,
    pub stats: PetStats,
    /// Instant `stats` were last known to be accurate.
    pub last_saved: Timestamp,
    pub last_interaction: Timestamp,
    pub birth_date: Timestamp,
    pub is_adult: bool,
    pub last_transformed: Option<Timestamp>,
    pub is_dead: bool,
    /// Set only while hunger or health sits at zero inside the grace window.
    pub death_timer_start: Option<Timestamp>,
}

impl PetRecord {
    pub fn new(pet_type: impl Into<String>, pet_name: impl Into<String>, now: Timestamp) -> Self {
        Self {
            pet_type: pet_type.into(),
            pet_name: pet_name.into(),
            stats: PetStats::full(),
            last_saved: now,
            last_interaction: now,
            birth_date: now,
            is_adult: false,
            last_transformed: None,
            is_dead: false,
            death_timer_start: None,
        }
    }

    /// Stats observed at `now`; they become the new baseline for decay.
    pub fn with_stats(&self, stats: PetStats, now: Timestamp) -> Self {
        Self {
            stats: stats.clamped(),
            last_saved: now,
            last_interaction: now,
            ..self.clone()
        }
    }

    pub fn with_critical(&self, timer_start: Timestamp) -> Self {
        Self {
            death_timer_start: Some(timer_start),
            ..self.clone()
        }
    }

    pub fn with_recovery(&self) -> Self {
        Self {
            death_timer_start: None,
            ..self.clone()
        }
    }

    pub fn with_death(&self, now: Timestamp) -> Self {
        Self {
            stats: PetStats::zero(),
            last_saved: now,
            last_interaction: now,
            is_dead: true,
            death_timer_start: None,
            ..self.clone()
        }
    }

    pub fn with_growth(&self, at: Timestamp) -> Self {
        Self {
            is_adult: true,
            last_transformed: Some(at),
            ..self.clone()
        }
    }

    pub fn with_interaction(&self, kind: InteractionKind, now: Timestamp) -> Self {
        Self {
            stats: self.stats.restored(kind),
            last_saved: now,
            last_interaction: now,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_are_clamped() {
        let stats = PetStats::new(150.0, -20.0, f64::NAN);
        assert_eq!(stats, PetStats::new(100.0, 0.0, 0.0));
    }

    #[test]
    fn test_happiness_does_not_make_stats_critical() {
        assert!(!PetStats::new(10.0, 0.0, 10.0).is_critical());
        assert!(PetStats::new(0.0, 50.0, 10.0).is_critical());
        assert!(PetStats::new(10.0, 50.0, 0.0).is_critical());
    }

    #[test]
    fn test_interaction_restores_only_its_stat() {
        let record = PetRecord::new("sheep", "Dolly", Timestamp(0))
            .with_stats(PetStats::new(10.0, 20.0, 30.0), Timestamp(1_000));
        let fed = record.with_interaction(InteractionKind::Feed, Timestamp(2_000));

        assert_eq!(fed.stats, PetStats::new(100.0, 20.0, 30.0));
        assert_eq!(fed.last_saved, Timestamp(2_000));
        assert_eq!(fed.birth_date, record.birth_date);
    }

    #[test]
    fn test_death_freezes_stats_and_clears_timer() {
        let dying = PetRecord::new("sheep", "Dolly", Timestamp(0)).with_critical(Timestamp(50_000));
        let dead = dying.with_death(Timestamp(110_000));

        assert!(dead.is_dead);
        assert_eq!(dead.stats, PetStats::zero());
        assert_eq!(dead.death_timer_start, None);
    }

    #[test]
    fn test_record_serializes_timestamps_as_millis() {
        let record = PetRecord::new("sheep", "Dolly", Timestamp(42));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["birth_date"], 42);
        assert_eq!(json["death_timer_start"], serde_json::Value::Null);
    }
}
