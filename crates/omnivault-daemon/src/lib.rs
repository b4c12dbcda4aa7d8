// SPDX-FileCopyrightText: 2026 OmniVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The OmniVault daemon: a single process owning one encrypted store,
//! serving secret CRUD over local HTTP+JSON IPC.
//!
//! The endpoint is a Unix socket on POSIX and a loopback TCP port
//! elsewhere; the wire protocol is identical on both. Every successful
//! store-touching request re-arms the auto-lock timer, and shutdown --
//! whether from a signal, `/stop`, or a listener failure -- always locks
//! the vault before the process exits.

pub mod server;
pub mod shutdown;

pub use server::Daemon;
pub use shutdown::install_signal_handler;
