use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: admitted bookings.
pub const BOOKINGS_TOTAL: &str = "medflow_bookings_total";

/// Counter: bookings rejected at admission (full or closed day).
pub const BOOKINGS_REJECTED_TOTAL: &str = "medflow_bookings_rejected_total";

/// Counter: reschedule runs (auto + manual).
pub const RESCHEDULE_RUNS_TOTAL: &str = "medflow_reschedule_runs_total";

/// Counter: individual appointment moves applied.
pub const RESCHEDULE_MOVES_TOTAL: &str = "medflow_reschedule_moves_total";

/// Histogram: reschedule run duration in seconds.
pub const RESCHEDULE_DURATION_SECONDS: &str = "medflow_reschedule_duration_seconds";

// ── USE metrics (work performed) ────────────────────────────────

/// Counter: status writes performed by triage saves.
pub const TRIAGE_WRITES_TOTAL: &str = "medflow_triage_writes_total";

/// Counter: reminders handed to the sender successfully.
pub const REMINDERS_SENT_TOTAL: &str = "medflow_reminders_sent_total";

/// Counter: reminder sends the sender reported as failed.
pub const REMINDERS_FAILED_TOTAL: &str = "medflow_reminders_failed_total";

/// Install the Prometheus metrics exporter on the given port. No-op if port
/// is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Install the default fmt tracing subscriber. Embedders with their own
/// subscriber skip this.
pub fn init_tracing() {
    tracing_subscriber::fmt::init();
}
