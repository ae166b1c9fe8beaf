//! Death and interaction counters
//!
//! Callers treat every collector as fire-and-forget: an `Err` is logged by
//! the session and never reaches the player.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

use crate::components::InteractionKind;
use crate::error::{PetError, Result};

pub trait MetricsCollector: Send + Sync {
    fn record_death(&self, user_id: &str) -> Result<()>;
    fn record_interaction(&self, user_id: &str, kind: InteractionKind) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserMetrics {
    pub deaths: u64,
    pub feeds: u64,
    pub plays: u64,
    pub heals: u64,
}

impl UserMetrics {
    pub fn interactions(&self, kind: InteractionKind) -> u64 {
        match kind {
            InteractionKind::Feed => self.feeds,
            InteractionKind::Play => self.plays,
            InteractionKind::Heal => self.heals,
        }
    }
}

/// Totals across every user
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSummary {
    pub total_deaths: u64,
    pub total_feeds: u64,
    pub total_plays: u64,
    pub total_heals: u64,
    pub user_count: u64,
}

/// In-process per-user counters.
#[derive(Debug, Default)]
pub struct PetMetrics {
    users: Mutex<HashMap<String, UserMetrics>>,
}

impl PetMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn users(&self) -> Result<MutexGuard<'_, HashMap<String, UserMetrics>>> {
        self.users
            .lock()
            .map_err(|_| PetError::Metrics("metrics lock poisoned".into()))
    }

    pub fn user(&self, user_id: &str) -> Option<UserMetrics> {
        self.users().ok()?.get(user_id).copied()
    }

    pub fn summary(&self) -> MetricsSummary {
        let Ok(users) = self.users() else {
            return MetricsSummary::default();
        };
        users.values().fold(
            MetricsSummary {
                user_count: users.len() as u64,
                ..MetricsSummary::default()
            },
            |mut acc, m| {
                acc.total_deaths += m.deaths;
                acc.total_feeds += m.feeds;
                acc.total_plays += m.plays;
                acc.total_heals += m.heals;
                acc
            },
        )
    }
}

impl MetricsCollector for PetMetrics {
    fn record_death(&self, user_id: &str) -> Result<()> {
        let mut users = self.users()?;
        let entry = users.entry(user_id.to_string()).or_default();
        entry.deaths = entry.deaths.saturating_add(1);
        Ok(())
    }

    fn record_interaction(&self, user_id: &str, kind: InteractionKind) -> Result<()> {
        let mut users = self.users()?;
        let entry = users.entry(user_id.to_string()).or_default();
        let counter = match kind {
            InteractionKind::Feed => &mut entry.feeds,
            InteractionKind::Play => &mut entry.plays,
            InteractionKind::Heal => &mut entry.heals,
        };
        *counter = counter.saturating_add(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_per_user() {
        let metrics = PetMetrics::new();
        metrics.record_interaction("a", InteractionKind::Feed).unwrap();
        metrics.record_interaction("a", InteractionKind::Feed).unwrap();
        metrics.record_interaction("a", InteractionKind::Heal).unwrap();
        metrics.record_death("b").unwrap();

        let a = metrics.user("a").expect("a counters");
        assert_eq!(a.interactions(InteractionKind::Feed), 2);
        assert_eq!(a.interactions(InteractionKind::Play), 0);
        assert_eq!(a.heals, 1);
        assert_eq!(a.deaths, 0);
        assert_eq!(metrics.user("b").unwrap().deaths, 1);
        assert_eq!(metrics.user("c"), None);
    }

    #[test]
    fn test_summary_aggregates_all_users() {
        let metrics = PetMetrics::new();
        assert_eq!(metrics.summary(), MetricsSummary::default());

        metrics.record_interaction("a", InteractionKind::Play).unwrap();
        metrics.record_interaction("b", InteractionKind::Feed).unwrap();
        metrics.record_death("a").unwrap();
        metrics.record_death("b").unwrap();

        assert_eq!(
            metrics.summary(),
            MetricsSummary {
                total_deaths: 2,
                total_feeds: 1,
                total_plays: 1,
                total_heals: 0,
                user_count: 2,
            }
        );
    }
}
