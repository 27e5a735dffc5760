// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request handlers, one module per resource.

pub mod contacts;
pub mod contexts;
pub mod flows;
pub mod messages;
pub mod segments;
pub mod system;
pub mod webhooks;
