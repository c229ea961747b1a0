use std::collections::HashMap;

use chrono::NaiveDate;

use crate::limits::DEFAULT_MAX_BOOKINGS_PER_DAY;
use crate::model::{BookingSetting, DayOverride};

// ── Capacity Accounting ──────────────────────────────────────────

/// Effective daily cap for one (campus, date): the day override's
/// `max_bookings` when present, else the campus default, else the documented
/// fallback of 50. Closed days are the oracle's concern, not this one's.
pub fn effective_capacity(
    setting: Option<&BookingSetting>,
    day_override: Option<&DayOverride>,
) -> u32 {
    if let Some(ov) = day_override
        && let Some(cap) = ov.max_bookings {
            return cap;
        }
    setting.map_or(DEFAULT_MAX_BOOKINGS_PER_DAY, |s| s.max_bookings_per_day)
}

/// Per-run booking counts, seeded lazily from the store and advanced as the
/// allocator assigns. Local to one invocation — concurrent runs do not see
/// each other's allocations.
#[derive(Default)]
pub(crate) struct DayLedger {
    counts: HashMap<NaiveDate, u32>,
}

impl DayLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, date: NaiveDate) -> Option<u32> {
        self.counts.get(&date).copied()
    }

    pub fn seed(&mut self, date: NaiveDate, load: u32) {
        self.counts.insert(date, load);
    }

    pub fn bump(&mut self, date: NaiveDate) {
        *self.counts.entry(date).or_insert(0) += 1;
    }
}

/// Structural email check: one `@`, non-empty local part, dotted domain.
/// Deliverability is the mail provider's problem.
pub(crate) fn valid_email(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !tld.is_empty()
}
