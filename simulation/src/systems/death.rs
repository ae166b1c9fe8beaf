//! Death System
//!
//! Starvation / sickness detection with a grace period before death.
//! Everything is computed from stored timestamps, so an evaluation that runs
//! long after the fact reaches the same verdict a continuous tick would have.

use crate::components::{PetRecord, PetStats, Timestamp};
use crate::config::SimulationConfig;
use crate::systems::decay::seconds_to_zero;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathState {
    Alive,
    /// Hunger or health hit zero at `timer_start`.
    Critical { timer_start: Timestamp },
    Dead,
}

impl DeathState {
    /// State as stored on the record, without looking at the clock.
    pub fn of(record: &PetRecord) -> Self {
        if record.is_dead {
            DeathState::Dead
        } else if let Some(timer_start) = record.death_timer_start {
            DeathState::Critical { timer_start }
        } else {
            DeathState::Alive
        }
    }
}

/// Edge between two consecutive states, for logging and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathTransition {
    EnteredCritical { timer_start: Timestamp },
    Recovered,
    Died,
}

pub fn transition(before: DeathState, after: DeathState) -> Option<DeathTransition> {
    match (before, after) {
        (DeathState::Dead, _) => None,
        (_, DeathState::Dead) => Some(DeathTransition::Died),
        (DeathState::Alive, DeathState::Critical { timer_start }) => {
            Some(DeathTransition::EnteredCritical { timer_start })
        }
        (DeathState::Critical { .. }, DeathState::Alive) => Some(DeathTransition::Recovered),
        _ => None,
    }
}

/// Instant the lower of hunger and health reaches zero, decaying from
/// `stats` as saved at `last_saved`.
pub fn time_to_zero(stats: &PetStats, last_saved: Timestamp, rate: f64) -> Timestamp {
    let ms = (seconds_to_zero(stats.vital_floor(), rate) * 1000.0).round();
    // f64 -> i64 saturates, so an infinite horizon lands on i64::MAX
    last_saved.plus_millis(ms as i64)
}

/// Decide the death state at `now`.
///
/// `record` is the snapshot before decay was applied; `current` are the
/// stats after decay (and after any interaction) at `now`.
pub fn evaluate(
    record: &PetRecord,
    current: &PetStats,
    now: Timestamp,
    config: &SimulationConfig,
) -> DeathState {
    if record.is_dead {
        return DeathState::Dead;
    }
    if !current.is_critical() {
        return DeathState::Alive;
    }

    let timer_start = record.death_timer_start.unwrap_or_else(|| {
        time_to_zero(&record.stats, record.last_saved, config.decay_rate).min(now)
    });

    if now.since(timer_start) >= config.grace_period_ms {
        DeathState::Dead
    } else {
        DeathState::Critical { timer_start }
    }
}

/// Write a verdict onto a record whose stats are already current.
pub fn apply(record: &PetRecord, state: DeathState, now: Timestamp) -> PetRecord {
    match state {
        DeathState::Dead if record.is_dead => record.clone(),
        DeathState::Dead => record.with_death(now),
        DeathState::Critical { timer_start } => record.with_critical(timer_start),
        DeathState::Alive => record.with_recovery(),
    }
}
