// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the ClientPing automation service.
//!
//! Holds the domain model (contacts, flows, segments, conversation
//! contexts), the shared error type, and the trait seams that the storage
//! backends and messaging channels implement.

pub mod contact;
pub mod context;
pub mod error;
pub mod flow;
pub mod locks;
pub mod outbound;
pub mod secret;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use contact::{
    Contact, ContactSegment, FieldOp, MAX_SEGMENT_WINDOW_DAYS, MatchMode, NewSegment,
    SegmentCondition, SegmentPatch, normalize_tag,
};
pub use context::{HistoryEntry, UserContext};
pub use error::ClientPingError;
pub use flow::{ActionKind, AutomationFlow, FlowAction, FlowPatch, FlowStats, FlowTrigger, NewFlow};
pub use locks::{KeyedGuard, KeyedLocks};
pub use outbound::{LogSender, OutboundRouter};
pub use secret::secrets_match;
pub use traits::{
    ChannelSender, ContactStore, ContextStore, FlowStore, SegmentStore, StateStore, StoreAdapter,
};
pub use types::{Channel, ChatRef, HealthStatus, InboundChat};
