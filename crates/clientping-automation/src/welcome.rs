// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The built-in welcome flow.

use chrono::{DateTime, Utc};

use clientping_core::{ActionKind, AutomationFlow, FlowAction, FlowTrigger, NewFlow};

pub const DEFAULT_WELCOME_FLOW_ID: &str = "default-welcome";

/// Low enough that any welcome flow an operator adds takes precedence.
pub const DEFAULT_WELCOME_PRIORITY: i32 = -1000;

pub fn default_welcome_flow(message: &str, now: DateTime<Utc>) -> AutomationFlow {
    NewFlow {
        id: Some(DEFAULT_WELCOME_FLOW_ID.to_string()),
        name: "Welcome".to_string(),
        description: "Greets every new chat on its first message".to_string(),
        enabled: true,
        priority: DEFAULT_WELCOME_PRIORITY,
        triggers: vec![FlowTrigger::Welcome],
        actions: vec![FlowAction::now(ActionKind::SendMessage {
            text: message.to_string(),
        })],
    }
    .into_flow(now)
}
