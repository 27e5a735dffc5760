// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for ClientPing integration tests.
//!
//! - [`RecordingSender`]: captures outbound messages, can inject failures
//! - [`TestHarness`]: a full store + contacts + engine + pipeline stack

pub mod harness;
pub mod recording_sender;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use recording_sender::{RecordingSender, SentMessage};
