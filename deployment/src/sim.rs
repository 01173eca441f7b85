// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Simulated installers
//!
//! These stand in for real provisioning infrastructure in `provisionctl` and
//! in test suites.  They remember every removal they were asked to perform,
//! can be made to wait before answering, and can be armed to fail.

use crate::installer::{OsInstaller, PackageInstaller, RemovalContext};
use anyhow::bail;
use async_trait::async_trait;
use provision_common::typed_uuid::{ClusterUuid, HostUuid};
use slog::{info, o, Logger};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A removal request received by a simulated installer
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RemovalCall {
    pub cluster_id: ClusterUuid,
    pub host_ids: Vec<HostUuid>,
    /// always `false` for OS installers
    pub delete_cluster: bool,
}

struct SimInstaller {
    log: Logger,
    name: String,
    calls: Mutex<Vec<RemovalCall>>,
    fail: AtomicBool,
    delay: Mutex<Duration>,
}

impl SimInstaller {
    fn new(log: &Logger, kind: &'static str, name: &str) -> Self {
        SimInstaller {
            log: log.new(o!(
                "component" => "SimInstaller",
                "kind" => kind,
                "name" => name.to_owned(),
            )),
            name: name.to_owned(),
            calls: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
            delay: Mutex::new(Duration::ZERO),
        }
    }

    async fn remove(
        &self,
        cx: &RemovalContext<'_>,
        delete_cluster: bool,
    ) -> anyhow::Result<()> {
        let call = RemovalCall {
            cluster_id: cx.cluster.id,
            host_ids: cx.hosts.iter().map(|h| h.id).collect(),
            delete_cluster,
        };
        info!(self.log, "removing hosts";
            "cluster_id" => %call.cluster_id,
            "hosts" => ?call.host_ids,
            "delete_cluster" => delete_cluster,
        );
        self.calls.lock().unwrap().push(call);

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            bail!("simulated failure in installer {:?}", self.name);
        }
        Ok(())
    }
}

macro_rules! sim_installer_common {
    ($ty:ident) => {
        impl $ty {
            /// Arms (or disarms) this installer to fail every removal
            pub fn set_fail(&self, fail: bool) {
                self.inner.fail.store(fail, Ordering::SeqCst);
            }

            /// Makes every removal wait for `delay` before answering
            pub fn set_delay(&self, delay: Duration) {
                *self.inner.delay.lock().unwrap() = delay;
            }

            /// Returns every removal received so far, oldest first
            pub fn calls(&self) -> Vec<RemovalCall> {
                self.inner.calls.lock().unwrap().clone()
            }
        }
    };
}

pub struct SimOsInstaller {
    inner: SimInstaller,
}

impl SimOsInstaller {
    pub fn new(log: &Logger, name: &str) -> Self {
        SimOsInstaller { inner: SimInstaller::new(log, "os", name) }
    }
}

sim_installer_common!(SimOsInstaller);

#[async_trait]
impl OsInstaller for SimOsInstaller {
    fn name(&self) -> &str {
        &self.inner.name
    }

    async fn delete_hosts(
        &self,
        cx: &RemovalContext<'_>,
    ) -> anyhow::Result<()> {
        self.inner.remove(cx, false).await
    }
}

pub struct SimPackageInstaller {
    inner: SimInstaller,
}

impl SimPackageInstaller {
    pub fn new(log: &Logger, name: &str) -> Self {
        SimPackageInstaller { inner: SimInstaller::new(log, "package", name) }
    }
}

sim_installer_common!(SimPackageInstaller);

#[async_trait]
impl PackageInstaller for SimPackageInstaller {
    fn name(&self) -> &str {
        &self.inner.name
    }

    async fn delete_hosts(
        &self,
        cx: &RemovalContext<'_>,
        delete_cluster: bool,
    ) -> anyhow::Result<()> {
        self.inner.remove(cx, delete_cluster).await
    }
}
