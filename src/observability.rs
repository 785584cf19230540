use std::net::SocketAddr;

// ── Engine metrics ──────────────────────────────────────────────

/// Counter: overlap conflicts detected during validation or
/// materialization.
pub const CONFLICTS_DETECTED_TOTAL: &str = "cancha_conflicts_detected_total";

/// Counter: reservation instances materialized from fixed reservations.
pub const INSTANCES_MATERIALIZED_TOTAL: &str = "cancha_instances_materialized_total";

/// Counter: future instances bulk-deleted by deactivation.
pub const INSTANCES_PURGED_TOTAL: &str = "cancha_instances_purged_total";

/// Counter: future instances repriced by a cascading update.
pub const INSTANCES_REPRICED_TOTAL: &str = "cancha_instances_repriced_total";

/// Counter: per-week horizon probes issued.
pub const HORIZON_PROBES_TOTAL: &str = "cancha_horizon_probes_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}
