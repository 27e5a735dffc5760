// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Automation flow definitions: triggers, actions, and running counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClientPingError;
use crate::types::new_id;

/// A named automation rule: when any trigger matches, run the actions in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationFlow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Higher priority wins when several flows match the same message.
    #[serde(default)]
    pub priority: i32,
    pub triggers: Vec<FlowTrigger>,
    pub actions: Vec<FlowAction>,
    #[serde(default)]
    pub stats: FlowStats,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_enabled() -> bool {
    true
}

/// Condition that activates a flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowTrigger {
    /// Fires on the first message ever received from a chat.
    Welcome,
    /// Fires when the message text contains any of the keywords.
    Keyword {
        keywords: Vec<String>,
        #[serde(default)]
        case_sensitive: bool,
    },
}

impl FlowTrigger {
    pub fn is_welcome(&self) -> bool {
        matches!(self, FlowTrigger::Welcome)
    }
}

/// One step of a flow, optionally preceded by a fixed delay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
    #[serde(flatten)]
    pub kind: ActionKind,
}

impl FlowAction {
    /// An action with no delay.
    pub fn now(kind: ActionKind) -> Self {
        Self {
            delay_ms: None,
            kind,
        }
    }

    /// An action that waits `delay_ms` before running.
    pub fn delayed(delay_ms: u64, kind: ActionKind) -> Self {
        Self {
            delay_ms: Some(delay_ms),
            kind,
        }
    }
}

/// What an action does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    /// Send a templated text message back to the chat.
    SendMessage { text: String },
    AddTag { tag: String },
    RemoveTag { tag: String },
    /// Label the conversation context with a segment name.
    SetSegment { segment: String },
    /// Store a variable in the context (mirrored into contact custom fields).
    SetVariable { key: String, value: String },
}

impl ActionKind {
    /// Short machine name, matching the serialized `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::SendMessage { .. } => "send_message",
            ActionKind::AddTag { .. } => "add_tag",
            ActionKind::RemoveTag { .. } => "remove_tag",
            ActionKind::SetSegment { .. } => "set_segment",
            ActionKind::SetVariable { .. } => "set_variable",
        }
    }
}

/// Running counters for a flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowStats {
    /// Number of times the flow was selected to run.
    pub triggered: u64,
    /// Number of runs where every action succeeded.
    pub completed: u64,
}

/// Request body for creating a flow. `id` is generated when absent.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewFlow {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub priority: i32,
    pub triggers: Vec<FlowTrigger>,
    pub actions: Vec<FlowAction>,
}

impl NewFlow {
    /// Builds a flow stamped with `now`.
    pub fn into_flow(self, now: DateTime<Utc>) -> AutomationFlow {
        AutomationFlow {
            id: self.id.unwrap_or_else(new_id),
            name: self.name,
            description: self.description,
            enabled: self.enabled,
            priority: self.priority,
            triggers: self.triggers,
            actions: self.actions,
            stats: FlowStats::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a flow. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlowPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub enabled: Option<bool>,
    pub priority: Option<i32>,
    pub triggers: Option<Vec<FlowTrigger>>,
    pub actions: Option<Vec<FlowAction>>,
}

impl AutomationFlow {
    /// Applies a patch and bumps `updated_at`. Counters are never patched.
    pub fn apply_patch(&mut self, patch: FlowPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(triggers) = patch.triggers {
            self.triggers = triggers;
        }
        if let Some(actions) = patch.actions {
            self.actions = actions;
        }
        self.updated_at = now;
    }

    /// Returns true if any trigger is a welcome trigger.
    pub fn is_welcome_flow(&self) -> bool {
        self.triggers.iter().any(FlowTrigger::is_welcome)
    }

    /// Checks structural rules: a name, at least one trigger and action,
    /// no empty keyword lists, and no empty tag or message text.
    pub fn validate(&self) -> Result<(), ClientPingError> {
        if self.id.trim().is_empty() {
            return Err(ClientPingError::Validation("flow id must not be empty".into()));
        }
        if self.name.trim().is_empty() {
            return Err(ClientPingError::Validation(
                "flow name must not be empty".into(),
            ));
        }
        if self.triggers.is_empty() {
            return Err(ClientPingError::Validation(format!(
                "flow `{}` has no triggers",
                self.name
            )));
        }
        if self.actions.is_empty() {
            return Err(ClientPingError::Validation(format!(
                "flow `{}` has no actions",
                self.name
            )));
        }

        for trigger in &self.triggers {
            if let FlowTrigger::Keyword { keywords, .. } = trigger
                && keywords.iter().all(|k| k.trim().is_empty())
            {
                return Err(ClientPingError::Validation(format!(
                    "flow `{}` has a keyword trigger without keywords",
                    self.name
                )));
            }
        }

        for (i, action) in self.actions.iter().enumerate() {
            let empty = match &action.kind {
                ActionKind::SendMessage { text } => text.trim().is_empty(),
                ActionKind::AddTag { tag } | ActionKind::RemoveTag { tag } => {
                    tag.trim().is_empty()
                }
                ActionKind::SetSegment { segment } => segment.trim().is_empty(),
                ActionKind::SetVariable { key, .. } => key.trim().is_empty(),
            };
            if empty {
                return Err(ClientPingError::Validation(format!(
                    "flow `{}` action {i} ({}) has an empty value",
                    self.name,
                    action.kind.name()
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_flow() -> AutomationFlow {
        NewFlow {
            id: Some("pricing".into()),
            name: "Pricing".into(),
            description: String::new(),
            enabled: true,
            priority: 5,
            triggers: vec![FlowTrigger::Keyword {
                keywords: vec!["price".into()],
                case_sensitive: false,
            }],
            actions: vec![FlowAction::now(ActionKind::SendMessage {
                text: "Plans start at $9".into(),
            })],
        }
        .into_flow(Utc::now())
    }

    #[test]
    fn flow_deserializes_from_api_json() {
        let json = r#"{
            "name": "Support",
            "priority": 3,
            "triggers": [
                {"type": "keyword", "keywords": ["help", "support"]},
                {"type": "welcome"}
            ],
            "actions": [
                {"type": "send_message", "text": "Hi {{name}}"},
                {"type": "add_tag", "tag": "support", "delay_ms": 500}
            ]
        }"#;
        let new: NewFlow = serde_json::from_str(json).unwrap();
        let flow = new.into_flow(Utc::now());
        assert!(flow.enabled);
        assert_eq!(flow.priority, 3);
        assert!(flow.is_welcome_flow());
        assert_eq!(flow.actions[1].delay_ms, Some(500));
        assert_eq!(
            flow.actions[1].kind,
            ActionKind::AddTag {
                tag: "support".into()
            }
        );
        assert!(!flow.id.is_empty());
    }

    #[test]
    fn action_serializes_flat_with_type_tag() {
        let action = FlowAction::delayed(
            250,
            ActionKind::SetVariable {
                key: "plan".into(),
                value: "pro".into(),
            },
        );
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["type"], "set_variable");
        assert_eq!(value["key"], "plan");
        assert_eq!(value["delay_ms"], 250);
    }

    #[test]
    fn patch_leaves_stats_untouched() {
        let mut flow = sample_flow();
        flow.stats.triggered = 4;
        flow.apply_patch(
            FlowPatch {
                priority: Some(9),
                enabled: Some(false),
                ..Default::default()
            },
            Utc::now(),
        );
        assert_eq!(flow.priority, 9);
        assert!(!flow.enabled);
        assert_eq!(flow.stats.triggered, 4);
    }

    #[test]
    fn validate_rejects_blank_keywords() {
        let mut flow = sample_flow();
        flow.triggers = vec![FlowTrigger::Keyword {
            keywords: vec!["  ".into()],
            case_sensitive: false,
        }];
        assert!(matches!(
            flow.validate(),
            Err(ClientPingError::Validation(msg)) if msg.contains("without keywords")
        ));
    }

    #[test]
    fn validate_rejects_empty_actions() {
        let mut flow = sample_flow();
        flow.actions.clear();
        assert!(flow.validate().is_err());
        assert!(sample_flow().validate().is_ok());
    }

    #[test]
    fn new_flow_rejects_unknown_fields() {
        let json = r#"{"name": "x", "triggers": [], "actions": [], "stats": {}}"#;
        assert!(serde_json::from_str::<NewFlow>(json).is_err());
    }
}
