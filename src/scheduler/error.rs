use chrono::{NaiveDate, NaiveTime};
use ulid::Ulid;

use crate::repo::RepoError;

#[derive(Debug)]
pub enum ScheduleError {
    /// Nothing to reschedule.
    EmptyBatch,
    LimitExceeded(&'static str),
    InvalidEmail(String),
    /// The time pair is neither a listed slot nor the walk-in placeholder.
    InvalidSlot { start: NaiveTime, end: NaiveTime },
    /// Target or booking day fails the business-day rules.
    DayNotBookable(NaiveDate),
    /// Admission check: the day is already at capacity.
    DayFull { date: NaiveDate, capacity: u32 },
    /// Manual mode: non-completed appointments with no target assigned.
    MissingTargets(Vec<Ulid>),
    /// Manual mode: target id is not in the source day's movable set.
    UnknownTarget(Ulid),
    /// Manual mode: same appointment targeted twice in one batch.
    DuplicateTarget(Ulid),
    /// Manual mode under the Block policy: a target day would exceed its cap.
    CapacityExceeded {
        date: NaiveDate,
        capacity: u32,
        projected: u32,
    },
    /// Auto mode exhausted its search horizon. Moves applied before
    /// exhaustion remain applied.
    PlacementNotFound { placed: usize, remaining: usize },
    /// A per-item update failed mid-batch. Earlier updates are not rolled
    /// back; the caller must re-fetch to learn actual state.
    PartialBatch {
        applied: usize,
        failed: Ulid,
        source: RepoError,
    },
    Repo(RepoError),
}

impl std::fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleError::EmptyBatch => write!(f, "empty appointment batch"),
            ScheduleError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            ScheduleError::InvalidEmail(email) => write!(f, "invalid email address: {email}"),
            ScheduleError::InvalidSlot { start, end } => {
                write!(f, "[{start}, {end}) is not a bookable slot")
            }
            ScheduleError::DayNotBookable(date) => write!(f, "{date} is not a bookable day"),
            ScheduleError::DayFull { date, capacity } => {
                write!(f, "{date} is full: capacity {capacity} reached")
            }
            ScheduleError::MissingTargets(ids) => {
                write!(f, "{} appointment(s) have no target date: ", ids.len())?;
                for (i, id) in ids.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{id}")?;
                }
                Ok(())
            }
            ScheduleError::UnknownTarget(id) => {
                write!(f, "appointment {id} is not movable from the source day")
            }
            ScheduleError::DuplicateTarget(id) => {
                write!(f, "appointment {id} targeted more than once")
            }
            ScheduleError::CapacityExceeded {
                date,
                capacity,
                projected,
            } => write!(
                f,
                "{date} would hold {projected} appointments, over capacity {capacity}"
            ),
            ScheduleError::PlacementNotFound { placed, remaining } => write!(
                f,
                "no placement day within horizon: {placed} moved, {remaining} left on source day"
            ),
            ScheduleError::PartialBatch {
                applied,
                failed,
                source,
            } => write!(
                f,
                "batch stopped at {failed} after {applied} move(s): {source}"
            ),
            ScheduleError::Repo(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ScheduleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScheduleError::PartialBatch { source, .. } | ScheduleError::Repo(source) => {
                Some(source)
            }
            _ => None,
        }
    }
}

impl From<RepoError> for ScheduleError {
    fn from(e: RepoError) -> Self {
        ScheduleError::Repo(e)
    }
}
