mod calendar;
mod capacity;
mod error;
mod mutations;
mod queries;

pub use calendar::is_bookable_day;
pub use capacity::effective_capacity;
pub use error::ScheduleError;

use std::sync::Arc;

use ulid::Ulid;

use crate::limits::DEFAULT_SEARCH_HORIZON_DAYS;
use crate::model::*;
use crate::notify::ReminderSender;
use crate::repo::Repository;

/// What to do when a manual reassignment would push a target day past its
/// cap. The observed product behavior varies between call sites, so this is
/// a knob rather than a fixed rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverCapacityPolicy {
    /// Reject the whole batch before any write.
    Block,
    /// Apply the batch and return the overloaded days as warnings.
    #[default]
    Warn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulePolicy {
    pub over_capacity: OverCapacityPolicy,
    /// Days past the source date the auto allocator searches.
    pub search_horizon_days: u32,
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        Self {
            over_capacity: OverCapacityPolicy::default(),
            search_horizon_days: DEFAULT_SEARCH_HORIZON_DAYS,
        }
    }
}

/// The scheduling core. Stateless between calls: every capacity decision
/// reads through the repository, and the only in-memory bookkeeping is the
/// per-run day ledger inside one allocator invocation. Capacity checks are
/// read-then-decide with no atomic reservation — two concurrent callers can
/// jointly overshoot a nearly-full day. That gap is inherited from the
/// product and documented rather than papered over.
pub struct Scheduler<R, N> {
    repo: Arc<R>,
    reminders: Arc<N>,
    policy: SchedulePolicy,
}

/// Campus-wide configuration loaded once per operation.
pub(crate) struct CampusContext {
    pub config: ScheduleConfig,
    pub setting: Option<BookingSetting>,
}

impl<R: Repository, N: ReminderSender> Scheduler<R, N> {
    pub fn new(repo: Arc<R>, reminders: Arc<N>) -> Self {
        Self::with_policy(repo, reminders, SchedulePolicy::default())
    }

    pub fn with_policy(repo: Arc<R>, reminders: Arc<N>, policy: SchedulePolicy) -> Self {
        Self {
            repo,
            reminders,
            policy,
        }
    }

    pub fn policy(&self) -> SchedulePolicy {
        self.policy
    }

    pub(crate) fn repo(&self) -> &R {
        &self.repo
    }

    pub(crate) fn reminders(&self) -> &N {
        &self.reminders
    }

    pub(crate) async fn campus_context(
        &self,
        campus_id: Ulid,
    ) -> Result<CampusContext, ScheduleError> {
        let config = self
            .repo
            .schedule_config(campus_id)
            .await?
            .unwrap_or_default();
        let setting = self.repo.booking_setting(campus_id).await?;
        Ok(CampusContext { config, setting })
    }
}
