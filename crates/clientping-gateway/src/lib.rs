// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the ClientPing automation service.
//!
//! Serves the Telegram and WhatsApp webhooks, the bearer-protected `/v1`
//! management API, and the unauthenticated `/health` and `/metrics`
//! endpoints. Every JSON body uses the `{"success": …}` envelope from
//! [`response`].

pub mod auth;
pub mod handlers;
pub mod response;
pub mod server;

pub use auth::AuthConfig;
pub use response::{ApiError, ApiResponse};
pub use server::{GatewayState, HealthState, WebhookConfig, bind, build_router, serve};
