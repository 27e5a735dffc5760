// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics for the ClientPing automation service.
//!
//! The recorder is installed once by the binary; the gateway serves
//! [`PrometheusAdapter::render`] at `/metrics`.

pub mod recording;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use clientping_core::{ClientPingError, HealthStatus};

pub use recording::{
    record_blocked_skip, record_flow_failure, record_flow_triggered, record_latency,
    record_message, register_metrics,
};

/// Owns the handle of the globally installed Prometheus recorder.
pub struct PrometheusAdapter {
    handle: PrometheusHandle,
}

impl PrometheusAdapter {
    /// Installs the Prometheus recorder globally.
    ///
    /// Only one recorder can be installed per process; a second call fails.
    pub fn new() -> Result<Self, ClientPingError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            ClientPingError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;

        recording::register_metrics();
        tracing::info!("prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    pub fn handle(&self) -> &PrometheusHandle {
        &self.handle
    }

    /// All collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    pub fn name(&self) -> &str {
        "prometheus"
    }

    pub fn health_check(&self) -> HealthStatus {
        HealthStatus::Healthy
    }
}
