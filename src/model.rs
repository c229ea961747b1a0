use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Why the appointment exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentKind {
    PhysicalExam,
    Consultation,
    Dental,
}

/// Lifecycle state. Only `Scheduled` and `Completed` occupy daily capacity;
/// `Cancelled` and `NoShow` are excluded from every count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn occupies_capacity(self) -> bool {
        matches!(self, AppointmentStatus::Scheduled | AppointmentStatus::Completed)
    }
}

/// The fixed slot table. Scheduled bookings must land on one of the four
/// listed windows; walk-ins get the all-day placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    EarlyMorning,
    LateMorning,
    EarlyAfternoon,
    LateAfternoon,
    WalkIn,
}

impl Slot {
    pub const SCHEDULED: [Slot; 4] = [
        Slot::EarlyMorning,
        Slot::LateMorning,
        Slot::EarlyAfternoon,
        Slot::LateAfternoon,
    ];

    /// `[start, end)` time-of-day window for this slot.
    pub fn window(self) -> (NaiveTime, NaiveTime) {
        // All constants are valid times, so the unwraps cannot fire.
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        match self {
            Slot::EarlyMorning => (t(8, 0), t(10, 0)),
            Slot::LateMorning => (t(10, 0), t(12, 0)),
            Slot::EarlyAfternoon => (t(13, 0), t(15, 0)),
            Slot::LateAfternoon => (t(15, 0), t(17, 0)),
            Slot::WalkIn => (t(0, 0), NaiveTime::from_hms_opt(23, 59, 0).unwrap()),
        }
    }

    /// Map raw times back onto the slot table. `None` means the pair is not a
    /// listed slot and not the walk-in placeholder.
    pub fn from_window(start: NaiveTime, end: NaiveTime) -> Option<Slot> {
        [
            Slot::EarlyMorning,
            Slot::LateMorning,
            Slot::EarlyAfternoon,
            Slot::LateAfternoon,
            Slot::WalkIn,
        ]
        .into_iter()
        .find(|s| s.window() == (start, end))
    }

    pub fn is_walk_in(self) -> bool {
        matches!(self, Slot::WalkIn)
    }
}

/// Patient identity snapshotted at booking time — walk-ins have no account,
/// so this is never a live join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Ulid,
    pub campus_id: Ulid,
    /// Naive local calendar date; the clinic has no time-zone ambiguity.
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub kind: AppointmentKind,
    pub status: AppointmentStatus,
    pub patient: Patient,
}

/// Per-campus capacity default applied to every business day.
/// Invariant: `max_bookings_per_day >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingSetting {
    pub max_bookings_per_day: u32,
}

/// Per-date exception. A closed day accepts zero bookings regardless of
/// `max_bookings`; an absent `max_bookings` falls back to the campus default.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DayOverride {
    pub max_bookings: Option<u32>,
    pub is_closed: bool,
    pub notes: Option<String>,
}

/// Per-campus business-day rules. The default week is Monday through Friday.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub include_saturday: bool,
    pub include_sunday: bool,
    pub holiday_dates: HashSet<NaiveDate>,
}

/// Admission-path input: raw times are validated against the slot table
/// before anything is written.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub campus_id: Ulid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub kind: AppointmentKind,
    pub patient: Patient,
}

// ── Operation result types ───────────────────────────────────────

/// One applied reassignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub id: Ulid,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub bookable: bool,
    pub capacity: u32,
    pub load: u32,
}

impl DaySummary {
    pub fn remaining(&self) -> u32 {
        if !self.bookable {
            return 0;
        }
        self.capacity.saturating_sub(self.load)
    }
}

/// A target day the manual path would push past its cap. Under the `Warn`
/// policy these are returned alongside the applied moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityWarning {
    pub date: NaiveDate,
    pub capacity: u32,
    pub projected: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualOutcome {
    pub moves: Vec<Move>,
    pub warnings: Vec<CapacityWarning>,
}

/// Writes performed by a triage save. A repeated save with the same checked
/// set reports zeros — nothing left to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriageOutcome {
    pub marked_completed: u32,
    pub reverted: u32,
}

/// Aggregated reminder counts. Individual send failures land in `failed`;
/// they never abort the run they accompany.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReminderReport {
    pub sent: u32,
    pub skipped: u32,
    pub failed: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_windows_match_table() {
        let (start, end) = Slot::EarlyMorning.window();
        assert_eq!(start, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(end, NaiveTime::from_hms_opt(10, 0, 0).unwrap());

        let (start, end) = Slot::LateAfternoon.window();
        assert_eq!(start, NaiveTime::from_hms_opt(15, 0, 0).unwrap());
        assert_eq!(end, NaiveTime::from_hms_opt(17, 0, 0).unwrap());
    }

    #[test]
    fn slot_from_window_roundtrip() {
        for slot in Slot::SCHEDULED {
            let (start, end) = slot.window();
            assert_eq!(Slot::from_window(start, end), Some(slot));
        }
        let (start, end) = Slot::WalkIn.window();
        assert_eq!(Slot::from_window(start, end), Some(Slot::WalkIn));
    }

    #[test]
    fn slot_from_window_rejects_off_table_times() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let eleven = NaiveTime::from_hms_opt(11, 0, 0).unwrap();
        assert_eq!(Slot::from_window(nine, eleven), None);
    }

    #[test]
    fn capacity_occupancy_by_status() {
        assert!(AppointmentStatus::Scheduled.occupies_capacity());
        assert!(AppointmentStatus::Completed.occupies_capacity());
        assert!(!AppointmentStatus::Cancelled.occupies_capacity());
        assert!(!AppointmentStatus::NoShow.occupies_capacity());
    }

    #[test]
    fn summary_remaining_never_underflows() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let over = DaySummary { date, bookable: true, capacity: 2, load: 5 };
        assert_eq!(over.remaining(), 0);

        let closed = DaySummary { date, bookable: false, capacity: 10, load: 0 };
        assert_eq!(closed.remaining(), 0);
    }

    #[test]
    fn default_schedule_config_is_weekdays_only() {
        let config = ScheduleConfig::default();
        assert!(!config.include_saturday);
        assert!(!config.include_sunday);
        assert!(config.holiday_dates.is_empty());
    }
}
