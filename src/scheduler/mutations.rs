use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use chrono::NaiveDate;
use tracing::{info, warn};
use ulid::Ulid;

use crate::limits::{MAX_BATCH_SIZE, MAX_NAME_LEN};
use crate::model::*;
use crate::notify::ReminderSender;
use crate::observability;
use crate::repo::{AppointmentPatch, NewAppointment, Repository};

use super::calendar::is_bookable_day;
use super::capacity::{DayLedger, effective_capacity, valid_email};
use super::{OverCapacityPolicy, ScheduleError, Scheduler};

impl<R: Repository, N: ReminderSender> Scheduler<R, N> {
    /// Booking admission: validate the request, check the day, insert.
    ///
    /// The capacity check is point-in-time, not a reservation — two
    /// concurrent requests against the last free slot can both pass it.
    pub async fn book(&self, request: BookingRequest) -> Result<Appointment, ScheduleError> {
        let BookingRequest {
            campus_id,
            date,
            start_time,
            end_time,
            kind,
            patient,
        } = request;

        if patient.name.len() > MAX_NAME_LEN {
            return Err(ScheduleError::LimitExceeded("patient name too long"));
        }
        if !valid_email(&patient.email) {
            return Err(ScheduleError::InvalidEmail(patient.email));
        }
        if Slot::from_window(start_time, end_time).is_none() {
            return Err(ScheduleError::InvalidSlot {
                start: start_time,
                end: end_time,
            });
        }

        let ctx = self.campus_context(campus_id).await?;
        let day_override = self.repo().day_override(campus_id, date).await?;
        if !is_bookable_day(date, &ctx.config, day_override.as_ref()) {
            metrics::counter!(observability::BOOKINGS_REJECTED_TOTAL).increment(1);
            return Err(ScheduleError::DayNotBookable(date));
        }
        let capacity = effective_capacity(ctx.setting.as_ref(), day_override.as_ref());
        let load = self.current_load(campus_id, date).await?;
        if load >= capacity {
            metrics::counter!(observability::BOOKINGS_REJECTED_TOTAL).increment(1);
            return Err(ScheduleError::DayFull { date, capacity });
        }

        let appointment = self
            .repo()
            .create_appointment(NewAppointment {
                campus_id,
                date,
                start_time,
                end_time,
                kind,
                patient,
            })
            .await?;
        metrics::counter!(observability::BOOKINGS_TOTAL).increment(1);
        info!("booked {} on {date} ({load} -> {})", appointment.id, load + 1);
        Ok(appointment)
    }

    /// Auto-spread: move a batch off `source_date` onto the nearest future
    /// bookable days with room, filling each day to its cap before spilling
    /// to the next (greedy bin-packing by date order). Caller order is
    /// preserved and decides who lands nearer.
    ///
    /// Moves apply one at a time and are never rolled back: a store failure
    /// surfaces as `PartialBatch`, horizon exhaustion as
    /// `PlacementNotFound`, in both cases with earlier moves left applied.
    pub async fn auto_reschedule(
        &self,
        campus_id: Ulid,
        source_date: NaiveDate,
        ids: &[Ulid],
    ) -> Result<Vec<Move>, ScheduleError> {
        if ids.is_empty() {
            return Err(ScheduleError::EmptyBatch);
        }
        if ids.len() > MAX_BATCH_SIZE {
            return Err(ScheduleError::LimitExceeded("batch too large"));
        }
        let mut seen = HashSet::with_capacity(ids.len());
        for &id in ids {
            if !seen.insert(id) {
                return Err(ScheduleError::DuplicateTarget(id));
            }
        }

        let started = Instant::now();
        let ctx = self.campus_context(campus_id).await?;
        let horizon = self.policy().search_horizon_days;
        let horizon_end = source_date
            .checked_add_days(chrono::Days::new(u64::from(horizon)))
            .ok_or(ScheduleError::LimitExceeded("date out of range"))?;
        let overrides = self
            .repo()
            .day_overrides(campus_id, source_date, horizon_end)
            .await?;

        let mut ledger = DayLedger::new();
        let mut moves: Vec<Move> = Vec::with_capacity(ids.len());
        let mut cursor = source_date
            .succ_opt()
            .ok_or(ScheduleError::LimitExceeded("date out of range"))?;
        let mut offset: u32 = 1;

        for &id in ids {
            // Advance to the first day that is bookable and has room left,
            // counting this run's own allocations.
            loop {
                if offset > horizon {
                    warn!(
                        "auto reschedule off {source_date} exhausted {horizon}-day horizon \
                         with {} of {} moved",
                        moves.len(),
                        ids.len()
                    );
                    return Err(ScheduleError::PlacementNotFound {
                        placed: moves.len(),
                        remaining: ids.len() - moves.len(),
                    });
                }
                let day_override = overrides.get(&cursor);
                if is_bookable_day(cursor, &ctx.config, day_override) {
                    let capacity = effective_capacity(ctx.setting.as_ref(), day_override);
                    let load = match ledger.get(cursor) {
                        Some(load) => load,
                        None => {
                            let load = self.current_load(campus_id, cursor).await?;
                            ledger.seed(cursor, load);
                            load
                        }
                    };
                    if load < capacity {
                        break;
                    }
                }
                cursor = cursor
                    .succ_opt()
                    .ok_or(ScheduleError::LimitExceeded("date out of range"))?;
                offset += 1;
            }

            match self
                .repo()
                .update_appointment(id, AppointmentPatch::reschedule_to(cursor))
                .await
            {
                Ok(_) => {
                    ledger.bump(cursor);
                    moves.push(Move {
                        id,
                        from: source_date,
                        to: cursor,
                    });
                }
                Err(source) => {
                    warn!(
                        "auto reschedule off {source_date} stopped at {id}: {source} \
                         ({} move(s) already applied)",
                        moves.len()
                    );
                    return Err(ScheduleError::PartialBatch {
                        applied: moves.len(),
                        failed: id,
                        source,
                    });
                }
            }
        }

        metrics::counter!(observability::RESCHEDULE_RUNS_TOTAL).increment(1);
        metrics::counter!(observability::RESCHEDULE_MOVES_TOTAL).increment(moves.len() as u64);
        metrics::histogram!(observability::RESCHEDULE_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        info!(
            "auto rescheduled {} appointment(s) off {source_date}, furthest target {}",
            moves.len(),
            cursor
        );
        Ok(moves)
    }

    /// Manual pick: the operator assigns every non-completed appointment on
    /// the source day an explicit target date. Validation is fail-fast —
    /// nothing is written unless the whole batch validates. Over-capacity
    /// targets are a hard error or a returned warning depending on
    /// `OverCapacityPolicy`.
    pub async fn manual_reschedule(
        &self,
        campus_id: Ulid,
        source_date: NaiveDate,
        targets: &[(Ulid, NaiveDate)],
    ) -> Result<ManualOutcome, ScheduleError> {
        if targets.len() > MAX_BATCH_SIZE {
            return Err(ScheduleError::LimitExceeded("batch too large"));
        }

        let started = Instant::now();
        let ctx = self.campus_context(campus_id).await?;
        let day = self.day_appointments(campus_id, source_date).await?;

        let movable: HashSet<Ulid> = day
            .iter()
            .filter(|a| a.status != AppointmentStatus::Completed)
            .map(|a| a.id)
            .collect();

        let mut targeted = HashSet::with_capacity(targets.len());
        for &(id, _) in targets {
            if !movable.contains(&id) {
                return Err(ScheduleError::UnknownTarget(id));
            }
            if !targeted.insert(id) {
                return Err(ScheduleError::DuplicateTarget(id));
            }
        }

        let missing: Vec<Ulid> = day
            .iter()
            .filter(|a| a.status != AppointmentStatus::Completed && !targeted.contains(&a.id))
            .map(|a| a.id)
            .collect();
        if !missing.is_empty() {
            return Err(ScheduleError::MissingTargets(missing));
        }

        // Would-be load per target day. Items staying on the source day are
        // already in that day's count, so only cross-day moves add.
        let mut incoming: BTreeMap<NaiveDate, u32> = BTreeMap::new();
        for &(_, date) in targets {
            if date != source_date {
                *incoming.entry(date).or_insert(0) += 1;
            }
        }

        let mut warnings: Vec<CapacityWarning> = Vec::new();
        for (&date, &added) in &incoming {
            let day_override = self.repo().day_override(campus_id, date).await?;
            if !is_bookable_day(date, &ctx.config, day_override.as_ref()) {
                return Err(ScheduleError::DayNotBookable(date));
            }
            let capacity = effective_capacity(ctx.setting.as_ref(), day_override.as_ref());
            let projected = self.current_load(campus_id, date).await? + added;
            if projected > capacity {
                match self.policy().over_capacity {
                    OverCapacityPolicy::Block => {
                        return Err(ScheduleError::CapacityExceeded {
                            date,
                            capacity,
                            projected,
                        });
                    }
                    OverCapacityPolicy::Warn => {
                        warn!("manual reschedule overloads {date}: {projected} > {capacity}");
                        warnings.push(CapacityWarning {
                            date,
                            capacity,
                            projected,
                        });
                    }
                }
            }
        }

        let mut moves: Vec<Move> = Vec::with_capacity(targets.len());
        for &(id, date) in targets {
            match self
                .repo()
                .update_appointment(id, AppointmentPatch::reschedule_to(date))
                .await
            {
                Ok(_) => moves.push(Move {
                    id,
                    from: source_date,
                    to: date,
                }),
                Err(source) => {
                    warn!(
                        "manual reschedule off {source_date} stopped at {id}: {source} \
                         ({} move(s) already applied)",
                        moves.len()
                    );
                    return Err(ScheduleError::PartialBatch {
                        applied: moves.len(),
                        failed: id,
                        source,
                    });
                }
            }
        }

        metrics::counter!(observability::RESCHEDULE_RUNS_TOTAL).increment(1);
        metrics::counter!(observability::RESCHEDULE_MOVES_TOTAL).increment(moves.len() as u64);
        metrics::histogram!(observability::RESCHEDULE_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        info!(
            "manually rescheduled {} appointment(s) off {source_date} ({} warning(s))",
            moves.len(),
            warnings.len()
        );
        Ok(ManualOutcome { moves, warnings })
    }

    /// Persist the completion checklist for a day: checked scheduled
    /// appointments become `Completed`, unchecked previously-completed ones
    /// revert to `Scheduled`. Runs before a reschedule so completed items
    /// are not swept up. Writes only on state change, so a repeated save
    /// with the same set is a no-op.
    pub async fn save_triage(
        &self,
        campus_id: Ulid,
        date: NaiveDate,
        completed: &HashSet<Ulid>,
    ) -> Result<TriageOutcome, ScheduleError> {
        let day = self.day_appointments(campus_id, date).await?;
        if day.len() > MAX_BATCH_SIZE {
            return Err(ScheduleError::LimitExceeded("batch too large"));
        }

        let mut outcome = TriageOutcome::default();
        for appointment in &day {
            let checked = completed.contains(&appointment.id);
            // Only the Scheduled <-> Completed pair toggles; no-shows keep
            // their status either way.
            let patch = match appointment.status {
                AppointmentStatus::Scheduled if checked => {
                    Some(AppointmentPatch::status(AppointmentStatus::Completed))
                }
                AppointmentStatus::Completed if !checked => {
                    Some(AppointmentPatch::status(AppointmentStatus::Scheduled))
                }
                _ => None,
            };
            let Some(patch) = patch else { continue };
            match self.repo().update_appointment(appointment.id, patch).await {
                Ok(_) => {
                    if checked {
                        outcome.marked_completed += 1;
                    } else {
                        outcome.reverted += 1;
                    }
                }
                Err(source) => {
                    return Err(ScheduleError::PartialBatch {
                        applied: (outcome.marked_completed + outcome.reverted) as usize,
                        failed: appointment.id,
                        source,
                    });
                }
            }
        }

        let writes = u64::from(outcome.marked_completed + outcome.reverted);
        if writes > 0 {
            metrics::counter!(observability::TRIAGE_WRITES_TOTAL).increment(writes);
            info!(
                "triage on {date}: {} completed, {} reverted",
                outcome.marked_completed, outcome.reverted
            );
        }
        Ok(outcome)
    }

    /// Fire reminders for a day's scheduled appointments. Fire-and-forget
    /// from the caller's perspective: sender failures are aggregated into
    /// the report, never raised.
    pub async fn send_day_reminders(
        &self,
        campus_id: Ulid,
        date: NaiveDate,
        template_override: Option<&str>,
    ) -> Result<ReminderReport, ScheduleError> {
        let day = self.day_appointments(campus_id, date).await?;

        let mut report = ReminderReport::default();
        for appointment in &day {
            if appointment.status != AppointmentStatus::Scheduled
                || appointment.patient.email.is_empty()
            {
                report.skipped += 1;
                continue;
            }
            match self.reminders().send(appointment, template_override).await {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    warn!("reminder for {} failed: {e}", appointment.id);
                    report.failed += 1;
                }
            }
        }

        metrics::counter!(observability::REMINDERS_SENT_TOTAL).increment(u64::from(report.sent));
        metrics::counter!(observability::REMINDERS_FAILED_TOTAL)
            .increment(u64::from(report.failed));
        info!(
            "reminders for {date}: {} sent, {} skipped, {} failed",
            report.sent, report.skipped, report.failed
        );
        Ok(report)
    }
}
