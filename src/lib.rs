//! medflow — daily-capacity accounting and capacity-aware rescheduling for
//! multi-campus clinic appointment booking.
//!
//! The crate is the scheduling core only: it computes against an external
//! appointment store (the [`repo::Repository`] seam) and an external reminder
//! sender ([`notify::ReminderSender`]), and returns updated state to the
//! caller. UI, auth, and email transport live in the host application.

pub mod limits;
pub mod memory;
pub mod model;
pub mod notify;
pub mod observability;
pub mod repo;
pub mod scheduler;

pub use memory::MemoryRepo;
pub use model::*;
pub use notify::{DiscardReminders, RecordingSender, ReminderSender, SendError};
pub use repo::{AppointmentFilter, AppointmentPatch, NewAppointment, RepoError, Repository};
pub use scheduler::{OverCapacityPolicy, SchedulePolicy, ScheduleError, Scheduler};
