//! Prometheus metrics exposition
//!
//! Monitor-side metrics:
//!
//! - `monitor_items_surfaced_total` (counter): items written to the output sink
//! - `monitor_items_filtered_total` (counter): label `reason`
//! - `monitor_poll_failures_total` (counter): label `phase` (`watermark`, `pass`)
//! - `monitor_watermark` (gauge): highest item id consumed so far
//!
//! The refresh actor records its own counters through the same global
//! recorder.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the global recorder and start the HTTP scrape listener.
///
/// Must be called from within a tokio runtime.
pub fn install_exporter(listen_addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(listen_addr)
        .install()
}

pub fn record_item_surfaced() {
    metrics::counter!("monitor_items_surfaced_total").increment(1);
}

pub fn record_item_filtered(reason: &'static str) {
    metrics::counter!("monitor_items_filtered_total", "reason" => reason).increment(1);
}

pub fn record_poll_failure(phase: &'static str) {
    metrics::counter!("monitor_poll_failures_total", "phase" => phase).increment(1);
}

pub fn set_watermark(id: u64) {
    metrics::gauge!("monitor_watermark").set(id as f64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::{PrometheusHandle, PrometheusRecorder};

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        record_item_surfaced();
        record_item_filtered("zero_stars");
        record_poll_failure("pass");
        set_watermark(1);
    }

    fn isolated_recorder() -> (PrometheusRecorder, PrometheusHandle) {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        (recorder, handle)
    }

    #[test]
    fn item_counters_are_recorded() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_item_surfaced();
        record_item_surfaced();
        record_item_filtered("zero_stars");

        let output = handle.render();
        assert!(
            output.contains("monitor_items_surfaced_total 2"),
            "surfaced counter missing, got:\n{output}"
        );
        assert!(
            output.contains("monitor_items_filtered_total{reason=\"zero_stars\"} 1"),
            "filtered counter must carry reason label, got:\n{output}"
        );
    }

    #[test]
    fn poll_failures_carry_phase_label() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_poll_failure("watermark");
        record_poll_failure("pass");
        record_poll_failure("pass");

        let output = handle.render();
        assert!(output.contains("monitor_poll_failures_total{phase=\"watermark\"} 1"));
        assert!(output.contains("monitor_poll_failures_total{phase=\"pass\"} 2"));
    }

    #[test]
    fn watermark_gauge_tracks_latest_value() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        set_watermark(100);
        set_watermark(105);

        let output = handle.render();
        assert!(
            output.contains("monitor_watermark 105"),
            "gauge should hold the last value, got:\n{output}"
        );
    }
}
