//! Allocator stress: how long does spreading a big closure day take, and
//! how do admission checks behave while days fill up?
//!
//! Run with `cargo bench`.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use ulid::Ulid;

use medflow::{
    AppointmentKind, BookingRequest, BookingSetting, DiscardReminders, MemoryRepo, Patient,
    ScheduleConfig, ScheduleError, Scheduler, Slot,
};

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.2}ms, p50={:.2}ms, p95={:.2}ms, p99={:.2}ms, max={:.2}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        latencies.last().unwrap().as_secs_f64() * 1000.0,
    );
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn request(campus: Ulid, on: NaiveDate, slot: Slot) -> BookingRequest {
    let (start_time, end_time) = slot.window();
    BookingRequest {
        campus_id: campus,
        date: on,
        start_time,
        end_time,
        kind: AppointmentKind::Consultation,
        patient: Patient {
            name: "Load Tester".into(),
            email: "load@campus.edu".into(),
            phone: "555-0000".into(),
        },
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let repo = Arc::new(MemoryRepo::new());
    let campus = Ulid::new();
    repo.put_setting(campus, BookingSetting { max_bookings_per_day: 20 });
    // Saturdays open to make the spread a little denser.
    repo.put_config(
        campus,
        ScheduleConfig {
            include_saturday: true,
            ..ScheduleConfig::default()
        },
    );
    let scheduler = Scheduler::new(repo.clone(), Arc::new(DiscardReminders));

    // 2025-06-02 is a Monday.
    let monday = date(2025, 6, 2);

    println!("admission: booking until the week saturates");
    let mut admit_latencies = Vec::new();
    let mut admitted = 0u32;
    let mut rejected = 0u32;
    for day_offset in 0..6u64 {
        let day = monday
            .checked_add_days(chrono::Days::new(day_offset))
            .unwrap();
        for _ in 0..25 {
            let start = Instant::now();
            match scheduler.book(request(campus, day, Slot::WalkIn)).await {
                Ok(_) => admitted += 1,
                Err(ScheduleError::DayFull { .. }) => rejected += 1,
                Err(e) => panic!("unexpected admission error: {e}"),
            }
            admit_latencies.push(start.elapsed());
        }
    }
    println!("  admitted={admitted}, rejected={rejected}");
    print_latency("book", &mut admit_latencies);

    println!("allocator: spreading one closed day across the calendar");
    let mut run_latencies = Vec::new();
    for round in 0..20u64 {
        // Each round stacks a fresh batch on a far-future source day so
        // earlier rounds' placements keep the near days partially full.
        let source = date(2026, 1, 5)
            .checked_add_days(chrono::Days::new(round * 7))
            .unwrap();
        let mut ids = Vec::new();
        for _ in 0..100 {
            ids.push(
                repo.create_appointment(medflow::NewAppointment {
                    campus_id: campus,
                    date: source,
                    start_time: Slot::WalkIn.window().0,
                    end_time: Slot::WalkIn.window().1,
                    kind: AppointmentKind::Consultation,
                    patient: Patient {
                        name: "Load Tester".into(),
                        email: "load@campus.edu".into(),
                        phone: "555-0000".into(),
                    },
                })
                .await
                .unwrap()
                .id,
            );
        }

        let start = Instant::now();
        let moves = scheduler
            .auto_reschedule(campus, source, &ids)
            .await
            .unwrap();
        run_latencies.push(start.elapsed());
        assert_eq!(moves.len(), ids.len());

        let landed: HashSet<NaiveDate> = moves.iter().map(|m| m.to).collect();
        if round == 0 {
            println!("  first round spread across {} days", landed.len());
        }
    }
    print_latency("auto_reschedule (100 appts)", &mut run_latencies);
}
