//! The appointment store seam. The host application implements this against
//! its backend-as-a-service; the core never talks to storage directly.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use ulid::Ulid;

use crate::model::*;

#[derive(Debug)]
pub enum RepoError {
    NotFound(Ulid),
    Conflict(String),
    Backend(String),
}

impl std::fmt::Display for RepoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepoError::NotFound(id) => write!(f, "not found: {id}"),
            RepoError::Conflict(msg) => write!(f, "conflict: {msg}"),
            RepoError::Backend(msg) => write!(f, "store error: {msg}"),
        }
    }
}

impl std::error::Error for RepoError {}

/// Conjunctive appointment query. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub campus_id: Option<Ulid>,
    /// Inclusive date range.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub status: Option<AppointmentStatus>,
}

impl AppointmentFilter {
    pub fn campus(campus_id: Ulid) -> Self {
        Self {
            campus_id: Some(campus_id),
            ..Self::default()
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date_range = Some((date, date));
        self
    }

    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.date_range = Some((from, to));
        self
    }

    pub fn with_status(mut self, status: AppointmentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, appointment: &Appointment) -> bool {
        if let Some(campus_id) = self.campus_id
            && appointment.campus_id != campus_id {
                return false;
            }
        if let Some((from, to)) = self.date_range
            && (appointment.date < from || appointment.date > to) {
                return false;
            }
        if let Some(status) = self.status
            && appointment.status != status {
                return false;
            }
        true
    }
}

/// Creation fields. The store assigns the id; new appointments start as
/// `Scheduled`.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub campus_id: Ulid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub kind: AppointmentKind,
    pub patient: Patient,
}

/// Partial update. Unset fields are left untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppointmentPatch {
    pub date: Option<NaiveDate>,
    pub status: Option<AppointmentStatus>,
}

impl AppointmentPatch {
    /// Move to a new date and put the appointment back in play.
    pub fn reschedule_to(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            status: Some(AppointmentStatus::Scheduled),
        }
    }

    pub fn status(status: AppointmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

#[async_trait]
pub trait Repository: Send + Sync {
    /// Appointments matching the filter, in stable (date, start time, id)
    /// order. Batch operations preserve this order, so it decides which
    /// appointments land on nearer target days when capacity is tight.
    async fn appointments(&self, filter: AppointmentFilter) -> Result<Vec<Appointment>, RepoError>;

    async fn create_appointment(&self, fields: NewAppointment) -> Result<Appointment, RepoError>;

    async fn update_appointment(
        &self,
        id: Ulid,
        patch: AppointmentPatch,
    ) -> Result<Appointment, RepoError>;

    /// Administrative hard delete; the scheduling core never calls this.
    async fn delete_appointment(&self, id: Ulid) -> Result<(), RepoError>;

    async fn booking_setting(&self, campus_id: Ulid) -> Result<Option<BookingSetting>, RepoError>;

    async fn day_override(
        &self,
        campus_id: Ulid,
        date: NaiveDate,
    ) -> Result<Option<DayOverride>, RepoError>;

    /// Bulk override fetch for an inclusive date range.
    async fn day_overrides(
        &self,
        campus_id: Ulid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<HashMap<NaiveDate, DayOverride>, RepoError>;

    async fn schedule_config(&self, campus_id: Ulid) -> Result<Option<ScheduleConfig>, RepoError>;
}
