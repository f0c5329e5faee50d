// Copyright 2025-Present Driftlog contributors
// SPDX-License-Identifier: Apache-2.0

//! Integration registration contract.
//!
//! Integrations are setup-then-teardown collaborators (global error
//! hooks, framework bridges) implemented outside this crate. The client
//! only owns their lifecycle: `setup` runs when the integration is added,
//! `teardown` runs once during [`Client::close`](crate::client::Client::close).

use crate::client::Client;

/// A pluggable collaborator bound to one client's lifetime.
pub trait Integration: Send + Sync {
    /// Stable name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Called once when the integration is registered.
    fn setup(&self, client: &Client);

    /// Called once during client shutdown, before transports are
    /// destroyed.
    fn teardown(&self) {}
}
