// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Automation for the ClientPing service.
//!
//! - [`matcher`]: keyword matching and flow precedence
//! - [`template`]: placeholder rendering for outgoing text
//! - [`engine`]: per-chat context and flow execution
//! - [`pipeline`]: contacts + engine + fallback for each inbound message

pub mod engine;
pub mod matcher;
pub mod pipeline;
pub mod template;
pub mod welcome;

pub use engine::{ActionEffect, AutomationEngine, AutomationOutcome, EngineSettings};
pub use pipeline::{HandledMessage, MessagePipeline, PipelineSettings, SkipReason};
pub use welcome::DEFAULT_WELCOME_FLOW_ID;
