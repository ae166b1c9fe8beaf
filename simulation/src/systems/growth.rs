//! Growth System
//!
//! One-way juvenile -> adult transition once the pet is old enough.

use crate::components::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Growth {
    Juvenile,
    /// Became an adult during this evaluation.
    Matured { at: Timestamp },
    Adult,
}

impl Growth {
    pub fn is_adult(&self) -> bool {
        !matches!(self, Growth::Juvenile)
    }
}

pub fn maybe_grow(birth_date: Timestamp, is_adult: bool, now: Timestamp, maturation_ms: i64) -> Growth {
    if is_adult {
        Growth::Adult
    } else if now.since(birth_date) >= maturation_ms {
        Growth::Matured { at: now }
    } else {
        Growth::Juvenile
    }
}
