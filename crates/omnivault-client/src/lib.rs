// SPDX-FileCopyrightText: 2026 OmniVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed client for the OmniVault daemon.
//!
//! Dials the local endpoint (Unix socket on POSIX, loopback TCP elsewhere),
//! issues one HTTP/1.1 request per connection, and translates structured
//! error bodies into [`DaemonError`] values with taxonomy predicates.

mod client;
mod error;

pub use client::Client;
pub use error::{ClientError, DaemonError};
