// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test harness for scheduler runs.
//!
//! Scripted backends with known outcomes, and helpers for building
//! schedulers on a seeded generator.

pub mod backends;

use mailbox_sim::{AttemptBackend, IdentityGenerator, RateLimiter, Scheduler};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Scheduler over `backend` on a fixed domain and seed.
pub fn scheduler<B: AttemptBackend>(
    backend: B,
    max_per_hour: u32,
) -> Scheduler<B, ChaCha8Rng> {
    Scheduler::new(
        IdentityGenerator::new("testmail.com"),
        RateLimiter::new(max_per_hour),
        backend,
        ChaCha8Rng::seed_from_u64(42),
    )
    .unwrap()
}
