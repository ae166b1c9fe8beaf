//! Pet Session - main orchestrator
//!
//! Owns one user's in-memory `PetRecord` and moves it forward through the
//! decay -> death -> aging -> growth pipeline, persisting after each step.
//! Every step is computed from stored timestamps, so the same code path
//! catches up after the app was closed for hours.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::components::{Age, Clock, InteractionKind, PetRecord, PetStats, Timestamp};
use crate::config::SimulationConfig;
use crate::error::{PetError, Result};
use crate::metrics::MetricsCollector;
use crate::names::{validate_pet_name, validate_pet_type};
use crate::persistence::PetStore;
use crate::systems::death::{self, DeathState, DeathTransition};
use crate::systems::{aging, decay, growth, Growth};

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Nothing stored for this user; the player still has to pick a pet.
    NewUser,
    Loaded(PetRecord),
}

#[derive(Debug, Clone, PartialEq)]
pub enum InteractionOutcome {
    Applied(PetRecord),
    /// Already dead, or the grace period ran out before the interaction.
    PetIsDead,
}

/// What one tick did
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub at: Timestamp,
    pub stats: PetStats,
    pub state: DeathState,
    pub transition: Option<DeathTransition>,
    pub matured: bool,
    pub age: Age,
    /// Set when the write failed; the next tick writes again.
    pub persist_error: Option<String>,
}

impl TickReport {
    pub fn is_dead(&self) -> bool {
        self.state == DeathState::Dead
    }

    pub fn persisted(&self) -> bool {
        self.persist_error.is_none()
    }
}

/// Result of running the pipeline over a record
struct Step {
    record: PetRecord,
    transition: Option<DeathTransition>,
    matured: bool,
}

pub struct PetSession {
    user_id: String,
    record: Option<PetRecord>,
    is_new_user: bool,
    /// In-memory record is ahead of the store.
    unsaved: bool,
    store: Arc<dyn PetStore>,
    metrics: Arc<dyn MetricsCollector>,
    clock: Arc<dyn Clock>,
    config: SimulationConfig,
}

impl PetSession {
    pub fn new(
        user_id: impl Into<String>,
        store: Arc<dyn PetStore>,
        metrics: Arc<dyn MetricsCollector>,
        clock: Arc<dyn Clock>,
        config: SimulationConfig,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            record: None,
            is_new_user: true,
            unsaved: false,
            store,
            metrics,
            clock,
            config,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn record(&self) -> Option<&PetRecord> {
        self.record.as_ref()
    }

    pub fn is_new_user(&self) -> bool {
        self.is_new_user
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Whether a tick runner still has work: a live pet, or a dead one whose
    /// final write has not landed yet.
    pub fn needs_ticking(&self) -> bool {
        match &self.record {
            Some(record) => !record.is_dead || self.unsaved,
            None => false,
        }
    }

    /// Surveys are suspended once the pet has died.
    pub fn surveys_suspended(&self) -> bool {
        self.record.as_ref().map(|r| r.is_dead).unwrap_or(false)
    }

    /// Age keeps counting after death.
    pub fn age(&self, now: Timestamp) -> Option<Age> {
        self.record.as_ref().map(|r| aging::age(r.birth_date, now))
    }

    /// Fetch the stored record and catch up on everything that happened
    /// while no session was running.
    pub fn load(&mut self) -> Result<LoadOutcome> {
        let now = self.clock.now();
        let Some(stored) = self.store.read(&self.user_id)? else {
            debug!("No pet stored for {}", self.user_id);
            self.record = None;
            self.is_new_user = true;
            self.unsaved = false;
            return Ok(LoadOutcome::NewUser);
        };

        // A death already counted in memory whose write never landed is
        // replayed from memory instead of being detected a second time.
        let counted_death = self
            .record
            .as_ref()
            .filter(|r| r.is_dead && !stored.is_dead && r.birth_date == stored.birth_date)
            .cloned();
        let step = match counted_death {
            Some(record) => Step {
                record,
                transition: None,
                matured: false,
            },
            None => self.advance(&stored, now),
        };
        self.observe(&step);
        self.is_new_user = false;
        self.unsaved = false;

        if has_changed(&stored, &step.record) {
            if let Some(e) = self.persist_quietly(&step.record) {
                warn!("Catch-up write for {} failed, will retry on tick: {}", self.user_id, e);
            }
        }

        info!(
            "Loaded {} ({}) for {}: hunger {:.1}, happiness {:.1}, health {:.1}{}",
            step.record.pet_name,
            step.record.pet_type,
            self.user_id,
            step.record.stats.hunger,
            step.record.stats.happiness,
            step.record.stats.health,
            if step.record.is_dead { " [dead]" } else { "" }
        );
        self.record = Some(step.record.clone());
        Ok(LoadOutcome::Loaded(step.record))
    }

    /// One periodic evaluation. `None` when there is nothing to do.
    ///
    /// Persistence failures never escape; they are reported in the
    /// `TickReport` and the next tick writes the newer state.
    pub fn tick(&mut self, now: Timestamp) -> Option<TickReport> {
        let record = self.record.clone()?;

        if record.is_dead {
            if !self.unsaved {
                return None;
            }
            let persist_error = self.persist_quietly(&record);
            return Some(self.report(&record, now, None, false, persist_error));
        }

        let step = self.advance(&record, now);
        self.observe(&step);
        let persist_error = self.persist_quietly(&step.record);
        if let Some(e) = &persist_error {
            warn!("Tick write for {} failed, will retry: {}", self.user_id, e);
        }
        self.record = Some(step.record.clone());

        let report = self.report(&step.record, now, step.transition, step.matured, persist_error);
        debug!(
            "Tick {} for {}: {:?} hunger {:.1} health {:.1}",
            now, self.user_id, report.state, report.stats.hunger, report.stats.health
        );
        Some(report)
    }

    /// Feed, play or heal. Catches up to now first, so an interaction that
    /// arrives after the grace period ran out finds a dead pet.
    pub fn interact(&mut self, kind: InteractionKind) -> Result<InteractionOutcome> {
        let now = self.clock.now();
        let record = self
            .record
            .clone()
            .ok_or_else(|| PetError::NotFound(self.user_id.clone()))?;
        if record.is_dead {
            return Ok(InteractionOutcome::PetIsDead);
        }

        let step = self.advance(&record, now);
        if step.record.is_dead {
            self.observe(&step);
            if let Some(e) = self.persist_quietly(&step.record) {
                warn!("Write of death for {} failed, will retry: {}", self.user_id, e);
            }
            self.record = Some(step.record);
            return Ok(InteractionOutcome::PetIsDead);
        }

        let interacted = step.record.with_interaction(kind, now);
        let next = if interacted.stats.is_critical() {
            interacted
        } else {
            interacted.with_recovery()
        };

        // User-initiated: a failed write means the interaction did not happen
        self.store.write(&self.user_id, &next)?;
        self.unsaved = false;

        self.observe(&step);
        if step.record.death_timer_start.is_some() && next.death_timer_start.is_none() {
            info!("{} recovered after {} from {}", next.pet_name, kind, self.user_id);
        }
        if let Err(e) = self.metrics.record_interaction(&self.user_id, kind) {
            warn!("Failed to record {} for {}: {}", kind, self.user_id, e);
        }

        self.record = Some(next.clone());
        Ok(InteractionOutcome::Applied(next))
    }

    /// Start a fresh pet. A previous pet is discarded, never merged.
    pub fn create(&mut self, pet_type: &str, pet_name: &str) -> Result<PetRecord> {
        let pet_type = validate_pet_type(pet_type)?;
        let pet_name = validate_pet_name(pet_name)?;
        let now = self.clock.now();

        // Single write over the user's key; nothing changes if it fails
        let record = PetRecord::new(pet_type, pet_name, now);
        self.store.write(&self.user_id, &record)?;
        if let Some(previous) = &self.record {
            info!("Discarded {} for {}", previous.pet_name, self.user_id);
        }

        info!("Created {} the {} for {}", record.pet_name, record.pet_type, self.user_id);
        self.record = Some(record.clone());
        self.is_new_user = false;
        self.unsaved = false;
        Ok(record)
    }

    /// Forget the pet entirely, in the store and in memory.
    pub fn reset(&mut self) -> Result<()> {
        self.store.clear(&self.user_id)?;
        self.record = None;
        self.is_new_user = true;
        self.unsaved = false;
        info!("Reset pet for {}", self.user_id);
        Ok(())
    }

    fn advance(&self, record: &PetRecord, now: Timestamp) -> Step {
        if record.is_dead {
            return Step {
                record: record.clone(),
                transition: None,
                matured: false,
            };
        }

        let current = decay::decay(record.stats, record.last_saved, now, self.config.decay_rate);
        let before = DeathState::of(record);
        let after = death::evaluate(record, &current, now, &self.config);
        let mut next = death::apply(&record.with_stats(current, now), after, now);

        let mut matured = false;
        if !next.is_dead {
            if let Growth::Matured { at } =
                growth::maybe_grow(next.birth_date, next.is_adult, now, self.config.maturation_ms)
            {
                next = next.with_growth(at);
                matured = true;
            }
        }

        Step {
            record: next,
            transition: death::transition(before, after),
            matured,
        }
    }

    /// Log transitions and signal the death metric.
    fn observe(&self, step: &Step) {
        let name = &step.record.pet_name;
        match step.transition {
            Some(DeathTransition::EnteredCritical { timer_start }) => {
                info!("{} is in critical condition since {}", name, timer_start);
            }
            Some(DeathTransition::Recovered) => {
                info!("{} is out of critical condition", name);
            }
            Some(DeathTransition::Died) => {
                info!("{} has died ({})", name, self.user_id);
                if let Err(e) = self.metrics.record_death(&self.user_id) {
                    warn!("Failed to record death for {}: {}", self.user_id, e);
                }
            }
            None => {}
        }
        if step.matured {
            info!("{} has grown into an adult", name);
        }
    }

    fn persist_quietly(&mut self, record: &PetRecord) -> Option<String> {
        match self.store.write(&self.user_id, record) {
            Ok(()) => {
                self.unsaved = false;
                None
            }
            Err(e) => {
                self.unsaved = true;
                Some(e.to_string())
            }
        }
    }

    fn report(
        &self,
        record: &PetRecord,
        now: Timestamp,
        transition: Option<DeathTransition>,
        matured: bool,
        persist_error: Option<String>,
    ) -> TickReport {
        TickReport {
            at: now,
            stats: record.stats,
            state: DeathState::of(record),
            transition,
            matured,
            age: aging::age(record.birth_date, now),
            persist_error,
        }
    }
}

/// Meaningful change, ignoring the bookkeeping timestamps.
fn has_changed(before: &PetRecord, after: &PetRecord) -> bool {
    before.stats != after.stats
        || before.is_dead != after.is_dead
        || before.death_timer_start != after.death_timer_start
        || before.is_adult != after.is_adult
}
