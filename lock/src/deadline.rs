// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bounded waits for lock acquisition

use futures::Future;
use futures::TryFutureExt;
use std::time::Duration;
use tokio::time::Instant;

/// Stands in for a deadline too far out for [`Instant`] to represent
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Returned by [`Deadline::bound()`] when the wait ran out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elapsed {
    /// how long the caller was willing to wait
    pub timeout: Duration,
}

/// A limit on how long to wait for a lock, fixed when the wait begins
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    timeout: Duration,
}

impl Deadline {
    pub fn starting_now(timeout: Duration) -> Self {
        Deadline { started: Instant::now(), timeout }
    }

    /// When the wait ends
    ///
    /// A timeout that runs past what [`Instant`] can represent is treated
    /// as roughly thirty years.
    pub fn expires_at(&self) -> Instant {
        self.started
            .checked_add(self.timeout)
            .unwrap_or_else(|| self.started + FAR_FUTURE)
    }

    /// Time spent waiting so far
    pub fn waited(&self) -> Duration {
        self.started.elapsed()
    }

    /// Runs `future` until it completes or the deadline passes
    ///
    /// A future that is ready on its first poll completes even when the
    /// deadline has already passed, so a zero timeout still takes a free
    /// lock.
    pub fn bound<F>(
        self,
        future: F,
    ) -> impl Future<Output = Result<F::Output, Elapsed>>
    where
        F: Future,
    {
        let timeout = self.timeout;
        tokio::time::timeout_at(self.expires_at(), future)
            .map_err(move |_| Elapsed { timeout })
    }
}
