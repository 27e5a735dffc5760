// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the engine, its state, and the messaging providers.
//!
//! Stores and senders use `#[async_trait]` so they can be held as
//! `Arc<dyn ...>` and swapped at startup.

pub mod channel;
pub mod store;

pub use channel::ChannelSender;
pub use store::{ContactStore, ContextStore, FlowStore, SegmentStore, StateStore, StoreAdapter};
