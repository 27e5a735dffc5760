// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trigger matching and flow selection.
//!
//! Matching is substring containment only. Among candidates the highest
//! `priority` wins; ties go to the earliest `created_at`, then the smallest
//! id, so the choice never depends on storage order.

use std::cmp::Ordering;

use clientping_core::{AutomationFlow, FlowTrigger};

/// Whether `trigger` fires for `text`. Welcome triggers never match text.
pub fn trigger_matches(trigger: &FlowTrigger, text: &str) -> bool {
    let FlowTrigger::Keyword {
        keywords,
        case_sensitive,
    } = trigger
    else {
        return false;
    };

    if *case_sensitive {
        keywords
            .iter()
            .any(|k| !k.is_empty() && text.contains(k.as_str()))
    } else {
        let haystack = text.to_lowercase();
        keywords
            .iter()
            .any(|k| !k.is_empty() && haystack.contains(&k.to_lowercase()))
    }
}

/// Orders flows best-first.
fn precedence(a: &AutomationFlow, b: &AutomationFlow) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

fn best<'a, I>(candidates: I) -> Option<&'a AutomationFlow>
where
    I: Iterator<Item = &'a AutomationFlow>,
{
    candidates.min_by(|a, b| precedence(a, b))
}

/// The enabled flow with a keyword trigger matching `text`, if any.
pub fn select_keyword_flow<'a>(flows: &'a [AutomationFlow], text: &str) -> Option<&'a AutomationFlow> {
    best(
        flows
            .iter()
            .filter(|f| f.enabled)
            .filter(|f| f.triggers.iter().any(|t| trigger_matches(t, text))),
    )
}

/// The enabled flow with a welcome trigger, if any.
pub fn select_welcome_flow(flows: &[AutomationFlow]) -> Option<&AutomationFlow> {
    best(flows.iter().filter(|f| f.enabled && f.is_welcome_flow()))
}

/// Sorts flows into firing order, for listings.
pub fn sort_by_precedence(flows: &mut [AutomationFlow]) {
    flows.sort_by(precedence);
}
