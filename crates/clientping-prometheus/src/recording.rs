// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; without an installed recorder every call is a
//! no-op, which is what tests and `check-config` rely on.

use metrics::{describe_counter, describe_histogram};

/// Register all ClientPing metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "clientping_messages_total",
        "Inbound messages handled, by channel"
    );
    describe_counter!(
        "clientping_flows_triggered_total",
        "Automation flows that fired"
    );
    describe_counter!(
        "clientping_flow_failures_total",
        "Automation flows that stopped on a failed action"
    );
    describe_counter!(
        "clientping_contacts_blocked_skips_total",
        "Inbound messages from blocked contacts that skipped automation"
    );
    describe_histogram!(
        "clientping_message_latency_seconds",
        "Time to handle one inbound message, action delays included"
    );
}

/// Record an inbound message.
pub fn record_message(channel: &str) {
    metrics::counter!("clientping_messages_total", "channel" => channel.to_string()).increment(1);
}

pub fn record_flow_triggered() {
    metrics::counter!("clientping_flows_triggered_total").increment(1);
}

pub fn record_flow_failure() {
    metrics::counter!("clientping_flow_failures_total").increment(1);
}

pub fn record_blocked_skip() {
    metrics::counter!("clientping_contacts_blocked_skips_total").increment(1);
}

/// Record end-to-end handling time.
pub fn record_latency(seconds: f64) {
    metrics::histogram!("clientping_message_latency_seconds").record(seconds);
}
