//! Aging System - age derived from birth date on demand

use crate::components::{Age, Timestamp};

const MS_PER_MINUTE: u64 = 60 * 1000;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: u64 = 24 * MS_PER_HOUR;

/// Split the distance between `birth_date` and `now` into days, hours and
/// minutes. Pure duration: no calendar or timezone.
///
/// Death does not stop this; callers get the age a tombstone would show
/// growing with wall-clock time.
pub fn age(birth_date: Timestamp, now: Timestamp) -> Age {
    let diff = now.since(birth_date).unsigned_abs();

    Age {
        days: diff / MS_PER_DAY,
        hours: (diff % MS_PER_DAY) / MS_PER_HOUR,
        minutes: (diff % MS_PER_HOUR) / MS_PER_MINUTE,
    }
}
