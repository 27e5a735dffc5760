// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The contact book: identity, tags, custom fields, block flag, and cached
//! segment membership for every chat the service has seen.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use clientping_core::{
    ClientPingError, Contact, ContactSegment, ContactStore, InboundChat, KeyedLocks, NewSegment,
    SegmentPatch, SegmentStore, StateStore, normalize_tag,
};

use crate::segment;

/// Query filter for [`ContactManager::list_contacts`]. Unset fields don't filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContactFilter {
    pub tag: Option<String>,
    /// Segment id; membership is evaluated at query time.
    pub segment: Option<String>,
    pub blocked: Option<bool>,
}

/// Tag and field changes collected from an automation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactChanges {
    pub add_tags: Vec<String>,
    pub remove_tags: Vec<String>,
    pub fields: BTreeMap<String, String>,
}

impl ContactChanges {
    pub fn is_empty(&self) -> bool {
        self.add_tags.is_empty() && self.remove_tags.is_empty() && self.fields.is_empty()
    }
}

/// Aggregate numbers for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactStats {
    pub total: usize,
    pub blocked: usize,
    pub by_channel: BTreeMap<String, usize>,
    /// Members per segment id.
    pub segments: BTreeMap<String, usize>,
}

/// Owns every contact and segment mutation.
///
/// Mutations of one contact are serialized through a per-chat lock; every
/// mutation recomputes the contact's segment list before it is stored.
pub struct ContactManager {
    store: Arc<dyn StateStore>,
    locks: KeyedLocks,
}

impl ContactManager {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
        }
    }

    /// Creates the contact on first sight; afterwards bumps `message_count`
    /// and `last_seen` and refreshes the display name.
    pub async fn record_inbound(&self, inbound: &InboundChat) -> Result<Contact, ClientPingError> {
        let _guard = self.locks.lock(&inbound.chat_id).await;
        let mut contact = match self.store.get_contact(&inbound.chat_id).await? {
            Some(mut existing) => {
                existing.message_count += 1;
                existing.last_seen = inbound.received_at;
                if !inbound.user_name.is_empty() {
                    existing.name = inbound.user_name.clone();
                }
                existing
            }
            None => {
                info!(chat_id = %inbound.chat_id, channel = %inbound.channel, "new contact");
                Contact::from_inbound(inbound)
            }
        };
        self.refresh_segments(&mut contact, inbound.received_at).await?;
        self.store.put_contact(&contact).await?;
        Ok(contact)
    }

    pub async fn get_contact(&self, chat_id: &str) -> Result<Contact, ClientPingError> {
        self.store
            .get_contact(chat_id)
            .await?
            .ok_or_else(|| ClientPingError::not_found("contact", chat_id))
    }

    pub async fn list_contacts(&self, filter: &ContactFilter) -> Result<Vec<Contact>, ClientPingError> {
        let segment = match &filter.segment {
            Some(id) => Some(self.get_segment(id).await?),
            None => None,
        };
        let tag = filter.tag.as_deref().and_then(normalize_tag);
        let now = Utc::now();
        Ok(self
            .store
            .list_contacts()
            .await?
            .into_iter()
            .filter(|c| tag.as_ref().is_none_or(|t| c.tags.contains(t)))
            .filter(|c| filter.blocked.is_none_or(|b| c.is_blocked == b))
            .filter(|c| segment.as_ref().is_none_or(|s| segment::matches(s, c, now)))
            .collect())
    }

    pub async fn delete_contact(&self, chat_id: &str) -> Result<(), ClientPingError> {
        let _guard = self.locks.lock(chat_id).await;
        if !self.store.delete_contact(chat_id).await? {
            return Err(ClientPingError::not_found("contact", chat_id));
        }
        info!(chat_id, "contact deleted");
        Ok(())
    }

    pub async fn add_tag(&self, chat_id: &str, tag: &str) -> Result<Contact, ClientPingError> {
        let tag = normalize_tag(tag)
            .ok_or_else(|| ClientPingError::Validation("tag must not be empty".into()))?;
        self.mutate(chat_id, |c| {
            c.tags.insert(tag);
        })
        .await
    }

    pub async fn remove_tag(&self, chat_id: &str, tag: &str) -> Result<Contact, ClientPingError> {
        let tag = normalize_tag(tag);
        self.mutate(chat_id, |c| {
            if let Some(tag) = &tag {
                c.tags.remove(tag);
            }
        })
        .await
    }

    pub async fn set_custom_field(
        &self,
        chat_id: &str,
        field: &str,
        value: &str,
    ) -> Result<Contact, ClientPingError> {
        let field = non_blank(field, "field")?;
        let value = value.to_string();
        self.mutate(chat_id, |c| {
            c.custom_fields.insert(field, value);
        })
        .await
    }

    pub async fn remove_custom_field(
        &self,
        chat_id: &str,
        field: &str,
    ) -> Result<Contact, ClientPingError> {
        self.mutate(chat_id, |c| {
            c.custom_fields.remove(field);
        })
        .await
    }

    pub async fn set_blocked(&self, chat_id: &str, blocked: bool) -> Result<Contact, ClientPingError> {
        let contact = self.mutate(chat_id, |c| c.is_blocked = blocked).await?;
        info!(chat_id, blocked, "contact block flag changed");
        Ok(contact)
    }

    /// Applies a batch of automation side effects in one locked write.
    pub async fn apply_changes(
        &self,
        chat_id: &str,
        changes: &ContactChanges,
    ) -> Result<Contact, ClientPingError> {
        self.mutate(chat_id, |c| {
            for tag in changes.add_tags.iter().filter_map(|t| normalize_tag(t)) {
                c.tags.insert(tag);
            }
            for tag in changes.remove_tags.iter().filter_map(|t| normalize_tag(t)) {
                c.tags.remove(&tag);
            }
            for (key, value) in &changes.fields {
                c.custom_fields.insert(key.clone(), value.clone());
            }
        })
        .await
    }

    async fn mutate<F>(&self, chat_id: &str, apply: F) -> Result<Contact, ClientPingError>
    where
        F: FnOnce(&mut Contact) + Send,
    {
        let _guard = self.locks.lock(chat_id).await;
        let mut contact = self.get_contact(chat_id).await?;
        apply(&mut contact);
        self.refresh_segments(&mut contact, Utc::now()).await?;
        self.store.put_contact(&contact).await?;
        Ok(contact)
    }

    async fn refresh_segments(
        &self,
        contact: &mut Contact,
        now: DateTime<Utc>,
    ) -> Result<(), ClientPingError> {
        let segments = self.store.list_segments().await?;
        contact.segments = segment::evaluate_segments(contact, &segments, now);
        Ok(())
    }

    /// Segment ids `contact` belongs to at `now`, against the stored segments.
    pub async fn evaluate_segments(
        &self,
        contact: &Contact,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, ClientPingError> {
        let segments = self.store.list_segments().await?;
        Ok(segment::evaluate_segments(contact, &segments, now))
    }

    // --- Segments ---

    pub async fn create_segment(&self, new: NewSegment) -> Result<ContactSegment, ClientPingError> {
        let segment = new.into_segment(Utc::now());
        segment.validate()?;
        if self.store.get_segment(&segment.id).await?.is_some() {
            return Err(ClientPingError::Conflict(format!(
                "segment `{}` already exists",
                segment.id
            )));
        }
        self.store.put_segment(&segment).await?;
        info!(segment_id = %segment.id, name = %segment.name, "segment created");
        self.reevaluate_all().await?;
        Ok(segment)
    }

    pub async fn get_segment(&self, id: &str) -> Result<ContactSegment, ClientPingError> {
        self.store
            .get_segment(id)
            .await?
            .ok_or_else(|| ClientPingError::not_found("segment", id))
    }

    pub async fn list_segments(&self) -> Result<Vec<ContactSegment>, ClientPingError> {
        self.store.list_segments().await
    }

    pub async fn update_segment(
        &self,
        id: &str,
        patch: SegmentPatch,
    ) -> Result<ContactSegment, ClientPingError> {
        let mut segment = self.get_segment(id).await?;
        segment.apply_patch(patch, Utc::now());
        segment.validate()?;
        self.store.put_segment(&segment).await?;
        debug!(segment_id = id, "segment updated");
        self.reevaluate_all().await?;
        Ok(segment)
    }

    pub async fn delete_segment(&self, id: &str) -> Result<(), ClientPingError> {
        if !self.store.delete_segment(id).await? {
            return Err(ClientPingError::not_found("segment", id));
        }
        info!(segment_id = id, "segment deleted");
        self.reevaluate_all().await
    }

    /// Contacts in the segment right now.
    pub async fn segment_members(&self, id: &str) -> Result<Vec<Contact>, ClientPingError> {
        self.list_contacts(&ContactFilter {
            segment: Some(id.to_string()),
            ..ContactFilter::default()
        })
        .await
    }

    /// Recomputes the cached segment list of every contact. Cost is
    /// O(contacts x segments).
    async fn reevaluate_all(&self) -> Result<(), ClientPingError> {
        let segments = self.store.list_segments().await?;
        let now = Utc::now();
        let mut changed = 0usize;
        for listed in self.store.list_contacts().await? {
            let _guard = self.locks.lock(&listed.chat_id).await;
            // Reload under the lock so a concurrent mutation is not overwritten.
            let Some(mut contact) = self.store.get_contact(&listed.chat_id).await? else {
                continue;
            };
            let segments_now = segment::evaluate_segments(&contact, &segments, now);
            if segments_now != contact.segments {
                contact.segments = segments_now;
                self.store.put_contact(&contact).await?;
                changed += 1;
            }
        }
        debug!(changed, "segment membership re-evaluated");
        Ok(())
    }

    pub async fn stats(&self) -> Result<ContactStats, ClientPingError> {
        let contacts = self.store.list_contacts().await?;
        let segments = self.store.list_segments().await?;
        let now = Utc::now();

        let mut stats = ContactStats {
            total: contacts.len(),
            ..ContactStats::default()
        };
        for contact in &contacts {
            if contact.is_blocked {
                stats.blocked += 1;
            }
            *stats
                .by_channel
                .entry(contact.channel.to_string())
                .or_default() += 1;
        }
        for s in &segments {
            let members = contacts
                .iter()
                .filter(|c| segment::matches(s, c, now))
                .count();
            stats.segments.insert(s.id.clone(), members);
        }
        Ok(stats)
    }
}

fn non_blank(value: &str, what: &str) -> Result<String, ClientPingError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClientPingError::Validation(format!("{what} must not be empty")));
    }
    Ok(trimmed.to_string())
}
