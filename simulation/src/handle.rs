//! Session handle - the host-facing side of a pet session
//!
//! Pairs the shared `PetSession` with its `TickRunner` and makes sure the
//! runner is stopped before anything that replaces or clears the record, so
//! there is never a second writer for the same user.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::info;

use crate::components::{InteractionKind, PetRecord};
use crate::error::{PetError, Result};
use crate::session::{InteractionOutcome, LoadOutcome, PetSession, TickReport};
use crate::tick_runner::TickRunner;

pub struct SessionHandle {
    session: Arc<Mutex<PetSession>>,
    tick_runner: Mutex<Option<TickRunner>>,
}

impl SessionHandle {
    pub fn new(session: PetSession) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            tick_runner: Mutex::new(None),
        }
    }

    fn session(&self) -> Result<MutexGuard<'_, PetSession>> {
        self.session.lock().map_err(|_| PetError::Poisoned)
    }

    /// Stop the runner and wait for it. Must not be called with the session
    /// lock held.
    pub fn stop(&self) {
        let runner = match self.tick_runner.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(mut runner) = runner {
            runner.stop();
        }
    }

    pub fn is_ticking(&self) -> bool {
        match self.tick_runner.lock() {
            Ok(guard) => guard.as_ref().map(|r| r.is_running()).unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Start the periodic tick. Any previous runner is stopped first.
    /// Returns false when there is no live pet to tick.
    pub fn start_ticking<F>(&self, callback: F) -> Result<bool>
    where
        F: FnMut(TickReport) + Send + 'static,
    {
        self.stop();

        let interval = {
            let session = self.session()?;
            if !session.needs_ticking() {
                return Ok(false);
            }
            Duration::from_millis(session.config().tick_interval_ms)
        };

        let mut runner = TickRunner::new();
        let started = runner.start(Arc::clone(&self.session), interval, callback);
        let mut slot = self.tick_runner.lock().map_err(|_| PetError::Poisoned)?;
        *slot = Some(runner);
        Ok(started)
    }

    pub fn load(&self) -> Result<LoadOutcome> {
        self.stop();
        self.session()?.load()
    }

    pub fn interact(&self, kind: InteractionKind) -> Result<InteractionOutcome> {
        self.session()?.interact(kind)
    }

    /// Create a new pet. Ticking is stopped; call `start_ticking` again.
    pub fn create(&self, pet_type: &str, pet_name: &str) -> Result<PetRecord> {
        self.stop();
        self.session()?.create(pet_type, pet_name)
    }

    pub fn reset(&self) -> Result<()> {
        self.stop();
        self.session()?.reset()
    }

    /// Stop all background work for this user.
    pub fn sign_out(&self) {
        self.stop();
        if let Ok(session) = self.session() {
            info!("Signed out {}", session.user_id());
        }
    }

    pub fn snapshot(&self) -> Option<PetRecord> {
        self.session().ok()?.record().cloned()
    }

    pub fn surveys_suspended(&self) -> bool {
        self.session().map(|s| s.surveys_suspended()).unwrap_or(false)
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::PetStats;
    use crate::session::tests::{harness, with_pet, Harness, T};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::thread;
    use std::time::Instant;

    /// Handle over the harness's store, metrics and clock, ticking every 10ms.
    fn fast_handle(h: &Harness) -> SessionHandle {
        let mut config = h.session.config().clone();
        config.tick_interval_ms = 10;
        SessionHandle::new(PetSession::new(
            h.session.user_id(),
            h.store.clone(),
            h.metrics.clone(),
            h.clock.clone(),
            config,
        ))
    }

    fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        cond()
    }

    #[test]
    fn test_no_ticking_without_pet() {
        let handle = fast_handle(&harness());
        assert!(!handle.start_ticking(|_| {}).unwrap());
        assert!(!handle.is_ticking());
    }

    #[test]
    fn test_ticks_and_interacts() {
        let h = with_pet();
        let handle = fast_handle(&h);
        handle.load().unwrap();

        let ticks = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&ticks);
        assert!(handle
            .start_ticking(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap());
        assert!(wait_for(|| ticks.load(Ordering::SeqCst) >= 3));

        h.clock.set(T.plus_millis(5_000));
        let outcome = handle.interact(InteractionKind::Feed).unwrap();
        assert!(matches!(outcome, InteractionOutcome::Applied(_)));
        assert!(handle.is_ticking());
        assert_eq!(h.metrics.user("user-1").unwrap().feeds, 1);

        handle.sign_out();
        assert!(!handle.is_ticking());
    }

    #[test]
    fn test_reset_stops_background_writes() {
        let h = with_pet();
        let handle = fast_handle(&h);
        handle.load().unwrap();
        assert!(handle.start_ticking(|_| {}).unwrap());

        handle.reset().unwrap();
        assert!(!handle.is_ticking());
        assert_eq!(h.stored(), None);

        thread::sleep(Duration::from_millis(60));
        assert_eq!(h.stored(), None);
        assert!(!handle.start_ticking(|_| {}).unwrap());
    }

    #[test]
    fn test_create_stops_old_runner() {
        let h = with_pet();
        let handle = fast_handle(&h);
        handle.load().unwrap();
        handle.start_ticking(|_| {}).unwrap();

        let fresh = handle.create("pinkSheep", "Shaun").unwrap();
        assert!(!handle.is_ticking());
        assert_eq!(fresh.stats, PetStats::full());
        assert_eq!(handle.snapshot(), Some(fresh.clone()));
        assert_eq!(h.stored(), Some(fresh));
    }

    #[test]
    fn test_runner_ends_when_pet_dies() {
        let h = with_pet();
        let handle = fast_handle(&h);
        handle.load().unwrap();

        h.clock.set(T.plus_millis(500_000));
        assert!(handle.start_ticking(|_| {}).unwrap());
        assert!(wait_for(|| !handle.is_ticking()));

        assert!(handle.surveys_suspended());
        assert!(h.stored().unwrap().is_dead);
        assert_eq!(h.metrics.user("user-1").unwrap().deaths, 1);
    }

    #[test]
    fn test_drop_stops_runner() {
        let h = with_pet();
        let handle = fast_handle(&h);
        handle.load().unwrap();
        handle.start_ticking(|_| {}).unwrap();
        drop(handle);

        let before = h.stored();
        h.clock.set(T.plus_millis(20_000));
        thread::sleep(Duration::from_millis(50));
        assert_eq!(h.stored(), before);
    }
}
