// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Static attempt pacing.
//!
//! Every attempt is followed by a fixed pause of `3600 / max_per_hour`
//! seconds. There is no bucket and no adaptation: the effective rate is
//! capped from above because nothing can run during the pause.

use crate::config::RateLimitConfig;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

const SECS_PER_HOUR: f64 = 3600.0;

/// Fixed-delay rate limiter.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    max_per_hour: u32,
    delay: Duration,
}

impl RateLimiter {
    /// Create a limiter allowing `max_per_hour` attempts per hour.
    ///
    /// A zero rate is rejected by `Config::validate`; here it degrades to
    /// no pause at all.
    pub fn new(max_per_hour: u32) -> Self {
        let delay = if max_per_hour == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(SECS_PER_HOUR / max_per_hour as f64)
        };
        Self {
            max_per_hour,
            delay,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_per_hour)
    }

    pub fn max_per_hour(&self) -> u32 {
        self.max_per_hour
    }

    /// Pause applied after every attempt.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Block the current task for one pacing interval.
    ///
    /// Returns `false` if the shutdown signal fired before the pause ended.
    pub async fn pause(&self, shutdown: Option<&mut watch::Receiver<bool>>) -> bool {
        debug!(delay = ?self.delay, "Rate limit pause");
        sleep_unless_cancelled(self.delay, shutdown).await
    }
}

/// Sleep for `duration`, waking early if `shutdown` flips to `true`.
///
/// Returns `true` when the full duration elapsed.
pub(crate) async fn sleep_unless_cancelled(
    duration: Duration,
    shutdown: Option<&mut watch::Receiver<bool>>,
) -> bool {
    let Some(shutdown) = shutdown else {
        tokio::time::sleep(duration).await;
        return true;
    };
    if *shutdown.borrow() {
        return false;
    }

    let sleep = tokio::time::sleep(duration);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            changed = shutdown.changed() => {
                // Sender dropped: nobody can cancel any more.
                if changed.is_err() {
                    (&mut sleep).await;
                    return true;
                }
                if *shutdown.borrow() {
                    return false;
                }
            }
        }
    }
}
