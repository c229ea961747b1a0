use chrono::NaiveDate;
use ulid::Ulid;

use crate::limits::MAX_SUMMARY_WINDOW_DAYS;
use crate::model::*;
use crate::notify::ReminderSender;
use crate::repo::{AppointmentFilter, Repository};

use super::calendar::is_bookable_day;
use super::capacity::effective_capacity;
use super::{ScheduleError, Scheduler};

impl<R: Repository, N: ReminderSender> Scheduler<R, N> {
    /// Booking count for one (campus, date): scheduled plus completed.
    /// Every capacity decision in the crate goes through this count.
    pub async fn current_load(
        &self,
        campus_id: Ulid,
        date: NaiveDate,
    ) -> Result<u32, ScheduleError> {
        let hits = self
            .repo()
            .appointments(AppointmentFilter::campus(campus_id).on(date))
            .await?;
        Ok(hits.iter().filter(|a| a.status.occupies_capacity()).count() as u32)
    }

    /// Effective cap for one (campus, date).
    pub async fn day_capacity(
        &self,
        campus_id: Ulid,
        date: NaiveDate,
    ) -> Result<u32, ScheduleError> {
        let ctx = self.campus_context(campus_id).await?;
        let day_override = self.repo().day_override(campus_id, date).await?;
        Ok(effective_capacity(
            ctx.setting.as_ref(),
            day_override.as_ref(),
        ))
    }

    /// Whether the day is bookable and under its cap.
    pub async fn has_capacity(
        &self,
        campus_id: Ulid,
        date: NaiveDate,
    ) -> Result<bool, ScheduleError> {
        let summary = self.day_summary(campus_id, date).await?;
        Ok(summary.bookable && summary.load < summary.capacity)
    }

    pub async fn day_summary(
        &self,
        campus_id: Ulid,
        date: NaiveDate,
    ) -> Result<DaySummary, ScheduleError> {
        let ctx = self.campus_context(campus_id).await?;
        let day_override = self.repo().day_override(campus_id, date).await?;
        Ok(DaySummary {
            date,
            bookable: is_bookable_day(date, &ctx.config, day_override.as_ref()),
            capacity: effective_capacity(ctx.setting.as_ref(), day_override.as_ref()),
            load: self.current_load(campus_id, date).await?,
        })
    }

    /// Summaries for an inclusive date range, fed by one bulk override
    /// fetch and one appointment scan. This is the calendar-view feed the
    /// caller refreshes after mutations.
    pub async fn range_summary(
        &self,
        campus_id: Ulid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DaySummary>, ScheduleError> {
        if to < from {
            return Ok(Vec::new());
        }
        if (to - from).num_days() >= i64::from(MAX_SUMMARY_WINDOW_DAYS) {
            return Err(ScheduleError::LimitExceeded("summary window too wide"));
        }

        let ctx = self.campus_context(campus_id).await?;
        let overrides = self.repo().day_overrides(campus_id, from, to).await?;
        let hits = self
            .repo()
            .appointments(AppointmentFilter::campus(campus_id).between(from, to))
            .await?;

        let mut loads: std::collections::HashMap<NaiveDate, u32> = std::collections::HashMap::new();
        for appointment in &hits {
            if appointment.status.occupies_capacity() {
                *loads.entry(appointment.date).or_insert(0) += 1;
            }
        }

        let mut summaries = Vec::new();
        let mut date = from;
        while date <= to {
            let day_override = overrides.get(&date);
            summaries.push(DaySummary {
                date,
                bookable: is_bookable_day(date, &ctx.config, day_override),
                capacity: effective_capacity(ctx.setting.as_ref(), day_override),
                load: loads.get(&date).copied().unwrap_or(0),
            });
            let Some(next) = date.succ_opt() else { break };
            date = next;
        }
        Ok(summaries)
    }

    /// The day's non-cancelled appointments in stable order — the listing
    /// behind the triage checklist and the manual-pick form.
    pub async fn day_appointments(
        &self,
        campus_id: Ulid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, ScheduleError> {
        let hits = self
            .repo()
            .appointments(AppointmentFilter::campus(campus_id).on(date))
            .await?;
        Ok(hits
            .into_iter()
            .filter(|a| a.status != AppointmentStatus::Cancelled)
            .collect())
    }
}
