//! DashMap-backed repository for tests, benches, and embedders that have no
//! external store. Carries a write counter and per-id fault injection so
//! batch-failure paths can be exercised.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use ulid::Ulid;

use crate::model::*;
use crate::repo::{AppointmentFilter, AppointmentPatch, NewAppointment, RepoError, Repository};

#[derive(Default)]
pub struct MemoryRepo {
    appointments: DashMap<Ulid, Appointment>,
    settings: DashMap<Ulid, BookingSetting>,
    overrides: DashMap<(Ulid, NaiveDate), DayOverride>,
    configs: DashMap<Ulid, ScheduleConfig>,
    update_calls: AtomicU64,
    fail_updates: DashMap<Ulid, ()>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Campus configuration seeding ─────────────────────────

    pub fn put_setting(&self, campus_id: Ulid, setting: BookingSetting) {
        self.settings.insert(campus_id, setting);
    }

    pub fn put_config(&self, campus_id: Ulid, config: ScheduleConfig) {
        self.configs.insert(campus_id, config);
    }

    pub fn put_override(&self, campus_id: Ulid, date: NaiveDate, day_override: DayOverride) {
        self.overrides.insert((campus_id, date), day_override);
    }

    pub fn clear_override(&self, campus_id: Ulid, date: NaiveDate) {
        self.overrides.remove(&(campus_id, date));
    }

    // ── Test hooks ───────────────────────────────────────────

    /// Direct read, bypassing the filter path.
    pub fn appointment(&self, id: Ulid) -> Option<Appointment> {
        self.appointments.get(&id).map(|e| e.value().clone())
    }

    /// Successful `update_appointment` calls so far.
    pub fn update_calls(&self) -> u64 {
        self.update_calls.load(Ordering::Relaxed)
    }

    /// Make every future update of `id` fail with a store error.
    pub fn fail_updates_for(&self, id: Ulid) {
        self.fail_updates.insert(id, ());
    }
}

#[async_trait]
impl Repository for MemoryRepo {
    async fn appointments(&self, filter: AppointmentFilter) -> Result<Vec<Appointment>, RepoError> {
        let mut hits: Vec<Appointment> = self
            .appointments
            .iter()
            .filter(|e| filter.matches(e.value()))
            .map(|e| e.value().clone())
            .collect();
        hits.sort_by_key(|a| (a.date, a.start_time, a.id));
        Ok(hits)
    }

    async fn create_appointment(&self, fields: NewAppointment) -> Result<Appointment, RepoError> {
        let appointment = Appointment {
            id: Ulid::new(),
            campus_id: fields.campus_id,
            date: fields.date,
            start_time: fields.start_time,
            end_time: fields.end_time,
            kind: fields.kind,
            status: AppointmentStatus::Scheduled,
            patient: fields.patient,
        };
        self.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn update_appointment(
        &self,
        id: Ulid,
        patch: AppointmentPatch,
    ) -> Result<Appointment, RepoError> {
        if self.fail_updates.contains_key(&id) {
            return Err(RepoError::Backend("injected update failure".into()));
        }
        let mut entry = self
            .appointments
            .get_mut(&id)
            .ok_or(RepoError::NotFound(id))?;
        if let Some(date) = patch.date {
            entry.date = date;
        }
        if let Some(status) = patch.status {
            entry.status = status;
        }
        self.update_calls.fetch_add(1, Ordering::Relaxed);
        Ok(entry.value().clone())
    }

    async fn delete_appointment(&self, id: Ulid) -> Result<(), RepoError> {
        self.appointments
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound(id))
    }

    async fn booking_setting(&self, campus_id: Ulid) -> Result<Option<BookingSetting>, RepoError> {
        Ok(self.settings.get(&campus_id).map(|e| *e.value()))
    }

    async fn day_override(
        &self,
        campus_id: Ulid,
        date: NaiveDate,
    ) -> Result<Option<DayOverride>, RepoError> {
        Ok(self
            .overrides
            .get(&(campus_id, date))
            .map(|e| e.value().clone()))
    }

    async fn day_overrides(
        &self,
        campus_id: Ulid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<HashMap<NaiveDate, DayOverride>, RepoError> {
        Ok(self
            .overrides
            .iter()
            .filter(|e| {
                let (campus, date) = *e.key();
                campus == campus_id && date >= from && date <= to
            })
            .map(|e| (e.key().1, e.value().clone()))
            .collect())
    }

    async fn schedule_config(&self, campus_id: Ulid) -> Result<Option<ScheduleConfig>, RepoError> {
        Ok(self.configs.get(&campus_id).map(|e| e.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_appointment(campus_id: Ulid, on: NaiveDate) -> NewAppointment {
        let (start_time, end_time) = Slot::EarlyMorning.window();
        NewAppointment {
            campus_id,
            date: on,
            start_time,
            end_time,
            kind: AppointmentKind::Consultation,
            patient: Patient {
                name: "Avery Quinn".into(),
                email: "avery@example.edu".into(),
                phone: "555-0100".into(),
            },
        }
    }

    #[tokio::test]
    async fn filter_by_campus_and_date() {
        let repo = MemoryRepo::new();
        let campus_a = Ulid::new();
        let campus_b = Ulid::new();
        let monday = date(2025, 3, 3);
        let tuesday = date(2025, 3, 4);

        repo.create_appointment(new_appointment(campus_a, monday)).await.unwrap();
        repo.create_appointment(new_appointment(campus_a, tuesday)).await.unwrap();
        repo.create_appointment(new_appointment(campus_b, monday)).await.unwrap();

        let hits = repo
            .appointments(AppointmentFilter::campus(campus_a).on(monday))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].campus_id, campus_a);
        assert_eq!(hits[0].date, monday);
    }

    #[tokio::test]
    async fn update_patches_only_set_fields() {
        let repo = MemoryRepo::new();
        let campus = Ulid::new();
        let monday = date(2025, 3, 3);
        let created = repo.create_appointment(new_appointment(campus, monday)).await.unwrap();

        let updated = repo
            .update_appointment(created.id, AppointmentPatch::status(AppointmentStatus::Completed))
            .await
            .unwrap();
        assert_eq!(updated.date, monday);
        assert_eq!(updated.status, AppointmentStatus::Completed);
        assert_eq!(repo.update_calls(), 1);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let repo = MemoryRepo::new();
        let result = repo
            .update_appointment(Ulid::new(), AppointmentPatch::default())
            .await;
        assert!(matches!(result, Err(RepoError::NotFound(_))));
    }

    #[tokio::test]
    async fn injected_failure_surfaces_as_backend_error() {
        let repo = MemoryRepo::new();
        let campus = Ulid::new();
        let created = repo
            .create_appointment(new_appointment(campus, date(2025, 3, 3)))
            .await
            .unwrap();
        repo.fail_updates_for(created.id);

        let result = repo
            .update_appointment(created.id, AppointmentPatch::default())
            .await;
        assert!(matches!(result, Err(RepoError::Backend(_))));
        assert_eq!(repo.update_calls(), 0);
    }

    #[tokio::test]
    async fn bulk_overrides_respect_range() {
        let repo = MemoryRepo::new();
        let campus = Ulid::new();
        repo.put_override(campus, date(2025, 3, 3), DayOverride { is_closed: true, ..DayOverride::default() });
        repo.put_override(campus, date(2025, 3, 10), DayOverride { max_bookings: Some(5), ..DayOverride::default() });
        repo.put_override(Ulid::new(), date(2025, 3, 4), DayOverride::default());

        let hits = repo
            .day_overrides(campus, date(2025, 3, 1), date(2025, 3, 7))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[&date(2025, 3, 3)].is_closed);
    }
}
