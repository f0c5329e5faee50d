// Copyright 2025-Present Driftlog contributors
// SPDX-License-Identifier: Apache-2.0

pub mod mock_server;

use std::time::{Duration, Instant};

/// Polls `condition` until it holds or `timeout` elapses.
pub async fn wait_until(mut condition: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
