//! Reminder delivery seam. The core hands individual appointments to a
//! sender and aggregates counts; transport (mail provider, queue) belongs to
//! the host.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use ulid::Ulid;

use crate::model::Appointment;

#[derive(Debug)]
pub struct SendError(pub String);

impl std::fmt::Display for SendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "send failed: {}", self.0)
    }
}

impl std::error::Error for SendError {}

#[async_trait]
pub trait ReminderSender: Send + Sync {
    /// Deliver one reminder. A failure is reported back as a count by the
    /// caller; it never aborts the surrounding operation.
    async fn send(
        &self,
        appointment: &Appointment,
        template_override: Option<&str>,
    ) -> Result<(), SendError>;
}

/// Sender that drops everything. Useful when embedding the scheduler without
/// a mail path.
pub struct DiscardReminders;

#[async_trait]
impl ReminderSender for DiscardReminders {
    async fn send(&self, _: &Appointment, _: Option<&str>) -> Result<(), SendError> {
        Ok(())
    }
}

/// Records deliveries and fails selected addresses on demand.
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(Ulid, Option<String>)>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_address(&self, email: &str) {
        self.failing.lock().unwrap().insert(email.to_string());
    }

    pub fn sent(&self) -> Vec<(Ulid, Option<String>)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReminderSender for RecordingSender {
    async fn send(
        &self,
        appointment: &Appointment,
        template_override: Option<&str>,
    ) -> Result<(), SendError> {
        if self.failing.lock().unwrap().contains(&appointment.patient.email) {
            return Err(SendError(format!(
                "mailbox rejected {}",
                appointment.patient.email
            )));
        }
        self.sent
            .lock()
            .unwrap()
            .push((appointment.id, template_override.map(str::to_string)));
        Ok(())
    }
}
