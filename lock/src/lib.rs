// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Named locks that serialize destructive lifecycle actions
//!
//! A [`LockManager`] hands out at most one [`LockHandle`] per lock name at a
//! time.  Acquisition waits for a bounded time and reports failure as `None`
//! rather than as an error: callers must treat that as "lock not acquired"
//! and abandon the whole action.
//!
//! A handle holds its lock until [`LockHandle::release()`] is called or the
//! handle is dropped, whichever comes first, so the lock is released on every
//! exit path of the scope that holds it.

use async_trait::async_trait;
use slog::{debug, info, o, warn, Logger};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;
use tokio::time::Instant;

mod deadline;

pub use deadline::{Deadline, Elapsed};

/// The lock that serializes every destructive lifecycle action
pub const SERIALIZED_ACTION_LOCK: &str = "serialized_action";

/// Something that hands out named locks
#[async_trait]
pub trait LockManager: Send + Sync {
    /// Waits at most `timeout` for the lock called `name`
    ///
    /// Returns `None` if the lock could not be obtained in time.
    async fn acquire(&self, name: &str, timeout: Duration)
        -> Option<LockHandle>;
}

/// Whatever keeps a lock held on behalf of a [`LockHandle`]
///
/// Releasing consumes the lease.  Implementations for a shared coordination
/// service would give the lease back here.
pub trait Lease: Send + 'static {
    fn release(self: Box<Self>);
}

impl Lease for OwnedMutexGuard<()> {
    fn release(self: Box<Self>) {
        drop(self);
    }
}

/// A held lock
pub struct LockHandle {
    name: String,
    log: Logger,
    acquired: Instant,
    lease: Option<Box<dyn Lease>>,
}

impl LockHandle {
    pub fn new(name: &str, log: &Logger, lease: Box<dyn Lease>) -> Self {
        LockHandle {
            name: name.to_owned(),
            log: log.new(o!("lock" => name.to_owned())),
            acquired: Instant::now(),
            lease: Some(lease),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether this handle still holds its lock
    pub fn is_held(&self) -> bool {
        self.lease.is_some()
    }

    /// Gives the lock back.  Calling this more than once does nothing.
    pub fn release(&mut self) {
        if let Some(lease) = self.lease.take() {
            lease.release();
            debug!(self.log, "released lock";
                "held" => ?self.acquired.elapsed(),
            );
        }
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for LockHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockHandle")
            .field("name", &self.name)
            .field("held", &self.is_held())
            .finish()
    }
}

/// A [`LockManager`] for a single process
///
/// Each lock name maps to its own async mutex, created the first time the
/// name is asked for.  Waiters are granted the lock in the order they asked
/// for it.
pub struct InProcessLockManager {
    log: Logger,
    locks: Mutex<BTreeMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl InProcessLockManager {
    pub fn new(log: &Logger) -> Self {
        InProcessLockManager {
            log: log.new(o!("component" => "InProcessLockManager")),
            locks: Mutex::new(BTreeMap::new()),
        }
    }

    fn mutex_for(&self, name: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks.entry(name.to_owned()).or_default().clone()
    }
}

#[async_trait]
impl LockManager for InProcessLockManager {
    async fn acquire(
        &self,
        name: &str,
        timeout: Duration,
    ) -> Option<LockHandle> {
        let mutex = self.mutex_for(name);
        let deadline = Deadline::starting_now(timeout);
        match deadline.bound(mutex.lock_owned()).await {
            Ok(guard) => {
                info!(self.log, "acquired lock";
                    "lock" => name,
                    "waited" => ?deadline.waited(),
                );
                Some(LockHandle::new(name, &self.log, Box::new(guard)))
            }
            Err(elapsed) => {
                warn!(self.log, "timed out waiting for lock";
                    "lock" => name,
                    "timeout" => ?elapsed.timeout,
                );
                None
            }
        }
    }
}
