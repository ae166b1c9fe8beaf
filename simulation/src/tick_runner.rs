//! Tick Runner - background thread that ticks a pet session at regular intervals

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::session::{PetSession, TickReport};

/// Owns the ticking thread for one session.
///
/// At most one thread runs per runner. `stop()` returns only after the thread
/// has exited, so no write can land afterwards.
pub struct TickRunner {
    is_running: Arc<AtomicBool>,
    stop_tx: Option<Sender<()>>,
    thread_handle: Option<JoinHandle<()>>,
}

impl TickRunner {
    pub fn new() -> Self {
        Self {
            is_running: Arc::new(AtomicBool::new(false)),
            stop_tx: None,
            thread_handle: None,
        }
    }

    /// Start ticking `session` every `interval`.
    ///
    /// `callback` sees each report after the tick's write finished and the
    /// session lock was released. The thread ends on its own once the session
    /// has nothing left to tick (no pet, or a dead pet that is fully saved).
    /// Returns false if this runner is already running.
    pub fn start<F>(&mut self, session: Arc<Mutex<PetSession>>, interval: Duration, mut callback: F) -> bool
    where
        F: FnMut(TickReport) + Send + 'static,
    {
        if self.is_running.load(Ordering::SeqCst) {
            warn!("Tick runner already running");
            return false;
        }
        // Reap a thread that exited on its own
        self.stop();

        info!("Starting tick runner ({}ms intervals)", interval.as_millis());
        self.is_running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.is_running);
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            let mut next_tick = Instant::now() + interval;
            loop {
                // Sleep until the next deadline or until told to stop
                let wait = next_tick.saturating_duration_since(Instant::now());
                match stop_rx.recv_timeout(wait) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }

                let report = {
                    let mut s = match session.lock() {
                        Ok(guard) => guard,
                        Err(_) => {
                            warn!("Pet session lock poisoned, stopping tick runner");
                            break;
                        }
                    };
                    if !s.needs_ticking() {
                        debug!("Nothing left to tick for {}", s.user_id());
                        break;
                    }
                    let now = s.now();
                    s.tick(now)
                };

                if let Some(report) = report {
                    callback(report);
                }

                next_tick += interval;
                let now = Instant::now();
                if next_tick < now {
                    // A slow write overran the slot; skip ahead instead of bursting
                    next_tick = now;
                }
            }
            running.store(false, Ordering::SeqCst);
            info!("Tick runner thread stopped");
        });

        self.stop_tx = Some(stop_tx);
        self.thread_handle = Some(handle);
        true
    }

    /// Stop ticking and wait for the thread to exit.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            // The thread may already be gone; a closed channel is fine
            let _ = tx.send(());
        }
        if let Some(handle) = self.thread_handle.take() {
            debug!("Stopping tick runner...");
            if handle.join().is_err() {
                warn!("Tick runner thread panicked");
            }
        }
        self.is_running.store(false, Ordering::SeqCst);
    }

    /// Check if the runner thread is currently alive
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }
}

impl Default for TickRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TickRunner {
    fn drop(&mut self) {
        self.stop();
    }
}
