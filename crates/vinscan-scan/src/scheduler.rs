// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cycle scheduling.

use std::time::Duration;

use async_trait::async_trait;

/// Source of delays between scan cycles.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Resolve after `delay`.
    async fn sleep(&self, delay: Duration);
}

/// Scheduler on the tokio timer. Under `tokio::time::pause` it follows the
/// virtual clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn sleep(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
