// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lifecycle orchestration for bare-metal cluster provisioning
//!
//! The [`Orchestrator`] runs the destructive lifecycle actions: deleting a
//! cluster, removing one host from a cluster, and deleting a host from every
//! cluster it belongs to.  Each action
//!
//! 1. takes the system-wide action lock, giving up with
//!    [`ActionError::LockNotAcquired`] if it can't get it in time;
//! 2. checks that every record it will touch exists and may be modified by
//!    the requesting user, before modifying anything;
//! 3. marks the records as failed and open for reinstallation (cluster
//!    deletion only);
//! 4. asks the deployment backend to remove the hosts;
//! 5. removes the rows that no longer describe anything.
//!
//! If the backend fails in step 4, the action stops there.  The records stay
//! in `ERROR` with their reinstall flags set and running the same action
//! again picks up where it left off.
//!
//! The action lock is the only thing keeping actions apart: the individual
//! datastore writes are atomic on their own, but nothing else groups them.

mod config;
mod error;
mod helpers;
mod lifecycle;

pub use config::{Config, LoadError, LockConfig};
pub use error::ActionError;

use provision_db_queries::db::EntityStore;
use provision_deployment::DeploymentBackend;
use provision_lock::{LockHandle, LockManager};
use slog::{o, warn, Logger};
use std::sync::Arc;

pub struct Orchestrator {
    log: Logger,
    datastore: Arc<dyn EntityStore>,
    locks: Arc<dyn LockManager>,
    backend: Arc<dyn DeploymentBackend>,
    lock_config: LockConfig,
}

impl Orchestrator {
    pub fn new(
        log: &Logger,
        datastore: Arc<dyn EntityStore>,
        locks: Arc<dyn LockManager>,
        backend: Arc<dyn DeploymentBackend>,
        lock_config: LockConfig,
    ) -> Self {
        Orchestrator {
            log: log.new(o!("component" => "Orchestrator")),
            datastore,
            locks,
            backend,
            lock_config,
        }
    }

    async fn acquire_lock(
        &self,
        log: &Logger,
    ) -> Result<LockHandle, ActionError> {
        let name = &self.lock_config.name;
        let timeout = self.lock_config.acquire_timeout();
        match self.locks.acquire(name, timeout).await {
            Some(handle) => Ok(handle),
            None => {
                warn!(log, "failed to acquire lock"; "lock" => name);
                Err(ActionError::LockNotAcquired {
                    name: name.clone(),
                    timeout,
                })
            }
        }
    }
}
