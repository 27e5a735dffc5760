// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contacts and the segment predicates used to bucket them.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClientPingError;
use crate::types::{Channel, InboundChat, new_id};

/// Longest `last_seen_within_days` window a segment may declare (about a century).
pub const MAX_SEGMENT_WINDOW_DAYS: u32 = 36_500;

/// Canonical form of a tag, or `None` when it is blank.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// A chat identity in the contact book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub chat_id: String,
    pub channel: Channel,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub custom_fields: BTreeMap<String, String>,
    /// Ids of the segments this contact currently belongs to, sorted.
    #[serde(default)]
    pub segments: Vec<String>,
    pub message_count: u64,
    #[serde(default)]
    pub is_blocked: bool,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Contact {
    /// A new contact for the sender of `inbound`, counting that message.
    pub fn from_inbound(inbound: &InboundChat) -> Self {
        Self {
            chat_id: inbound.chat_id.clone(),
            channel: inbound.channel,
            user_id: inbound.user_id.clone(),
            name: inbound.user_name.clone(),
            tags: BTreeSet::new(),
            custom_fields: BTreeMap::new(),
            segments: Vec::new(),
            message_count: 1,
            is_blocked: false,
            first_seen: inbound.received_at,
            last_seen: inbound.received_at,
        }
    }
}

/// How a segment combines its conditions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Every condition must hold.
    #[default]
    All,
    /// At least one condition must hold.
    Any,
}

/// Comparison applied to a custom field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOp {
    Equals,
    Contains,
    Exists,
}

/// A single predicate over contact attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SegmentCondition {
    HasTag { tag: String },
    MissingTag { tag: String },
    FirstSeenAfter { at: DateTime<Utc> },
    FirstSeenBefore { at: DateTime<Utc> },
    LastSeenWithinDays { days: u32 },
    MessageCountAtLeast { count: u64 },
    MessageCountAtMost { count: u64 },
    CustomField {
        field: String,
        op: FieldOp,
        #[serde(default)]
        value: Option<String>,
    },
}

/// A named bucket of contacts defined by conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactSegment {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub match_mode: MatchMode,
    #[serde(default)]
    pub conditions: Vec<SegmentCondition>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContactSegment {
    pub fn validate(&self) -> Result<(), ClientPingError> {
        if self.name.trim().is_empty() {
            return Err(ClientPingError::Validation(
                "segment name must not be empty".into(),
            ));
        }
        for condition in &self.conditions {
            match condition {
                SegmentCondition::HasTag { tag } | SegmentCondition::MissingTag { tag }
                    if tag.trim().is_empty() =>
                {
                    return Err(ClientPingError::Validation(format!(
                        "segment `{}` has a tag condition with an empty tag",
                        self.name
                    )));
                }
                SegmentCondition::LastSeenWithinDays { days } if *days > MAX_SEGMENT_WINDOW_DAYS => {
                    return Err(ClientPingError::Validation(format!(
                        "segment `{}` last_seen_within_days must be at most {MAX_SEGMENT_WINDOW_DAYS}",
                        self.name
                    )));
                }
                SegmentCondition::CustomField { field, op, value } => {
                    if field.trim().is_empty() {
                        return Err(ClientPingError::Validation(format!(
                            "segment `{}` has a custom field condition without a field",
                            self.name
                        )));
                    }
                    if *op != FieldOp::Exists && value.is_none() {
                        return Err(ClientPingError::Validation(format!(
                            "segment `{}` custom field `{field}` needs a value",
                            self.name
                        )));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Request body for creating a segment.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewSegment {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub match_mode: MatchMode,
    #[serde(default)]
    pub conditions: Vec<SegmentCondition>,
}

impl NewSegment {
    pub fn into_segment(self, now: DateTime<Utc>) -> ContactSegment {
        ContactSegment {
            id: self.id.unwrap_or_else(new_id),
            name: self.name,
            description: self.description,
            match_mode: self.match_mode,
            conditions: self.conditions,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a segment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SegmentPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub match_mode: Option<MatchMode>,
    pub conditions: Option<Vec<SegmentCondition>>,
}

impl ContactSegment {
    pub fn apply_patch(&mut self, patch: SegmentPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(match_mode) = patch.match_mode {
            self.match_mode = match_mode;
        }
        if let Some(conditions) = patch.conditions {
            self.conditions = conditions;
        }
        self.updated_at = now;
    }
}
