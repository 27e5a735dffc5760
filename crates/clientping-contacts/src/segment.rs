// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Segment membership.
//!
//! Everything here is a pure function of the contact, the segment's
//! conditions, and the evaluation instant. No I/O, no clock reads.

use chrono::{DateTime, TimeDelta, Utc};

use clientping_core::{Contact, ContactSegment, FieldOp, MatchMode, SegmentCondition};

/// Whether a single condition holds for `contact` at `now`.
pub fn condition_holds(condition: &SegmentCondition, contact: &Contact, now: DateTime<Utc>) -> bool {
    match condition {
        SegmentCondition::HasTag { tag } => contact.tags.contains(tag.trim()),
        SegmentCondition::MissingTag { tag } => !contact.tags.contains(tag.trim()),
        SegmentCondition::FirstSeenAfter { at } => contact.first_seen > *at,
        SegmentCondition::FirstSeenBefore { at } => contact.first_seen < *at,
        SegmentCondition::LastSeenWithinDays { days } => {
            // A window reaching past the representable range covers everyone.
            match TimeDelta::try_days(i64::from(*days)).and_then(|d| now.checked_sub_signed(d)) {
                Some(cutoff) => contact.last_seen >= cutoff,
                None => true,
            }
        }
        SegmentCondition::MessageCountAtLeast { count } => contact.message_count >= *count,
        SegmentCondition::MessageCountAtMost { count } => contact.message_count <= *count,
        SegmentCondition::CustomField { field, op, value } => {
            let Some(actual) = contact.custom_fields.get(field) else {
                return false;
            };
            match (op, value) {
                (FieldOp::Exists, _) => true,
                (FieldOp::Equals, Some(expected)) => actual == expected,
                (FieldOp::Contains, Some(needle)) => actual.contains(needle.as_str()),
                (_, None) => false,
            }
        }
    }
}

/// Whether `contact` belongs to `segment` at `now`.
///
/// A segment without conditions matches every contact.
pub fn matches(segment: &ContactSegment, contact: &Contact, now: DateTime<Utc>) -> bool {
    if segment.conditions.is_empty() {
        return true;
    }
    let mut results = segment
        .conditions
        .iter()
        .map(|c| condition_holds(c, contact, now));
    match segment.match_mode {
        MatchMode::All => results.all(|r| r),
        MatchMode::Any => results.any(|r| r),
    }
}

/// Ids of every segment `contact` belongs to, sorted.
pub fn evaluate_segments(
    contact: &Contact,
    segments: &[ContactSegment],
    now: DateTime<Utc>,
) -> Vec<String> {
    let mut ids: Vec<String> = segments
        .iter()
        .filter(|s| matches(s, contact, now))
        .map(|s| s.id.clone())
        .collect();
    ids.sort();
    ids
}
