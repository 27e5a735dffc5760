// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact management for the ClientPing automation service.
//!
//! [`ContactManager`] keeps the contact book and segment definitions in a
//! [`clientping_core::StateStore`]; [`segment`] holds the pure membership
//! rules.

pub mod manager;
pub mod segment;

pub use manager::{ContactChanges, ContactFilter, ContactManager, ContactStats};
pub use segment::evaluate_segments;
