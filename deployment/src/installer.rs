// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::info::{AdapterInfo, ClusterInfo, HostInfo};
use async_trait::async_trait;

/// What an installer is asked to remove
#[derive(Clone, Copy, Debug)]
pub struct RemovalContext<'a> {
    pub adapter: &'a AdapterInfo,
    pub cluster: &'a ClusterInfo,
    pub hosts: &'a [HostInfo],
}

/// Provisions and deprovisions operating systems on hosts
#[async_trait]
pub trait OsInstaller: Send + Sync {
    /// Name under which this installer is registered
    fn name(&self) -> &str;

    /// Forgets the hosts in `cx`, so that they are no longer provisioned
    async fn delete_hosts(&self, cx: &RemovalContext<'_>)
        -> anyhow::Result<()>;
}

/// Deploys and tears down a cluster's distributed system
#[async_trait]
pub trait PackageInstaller: Send + Sync {
    /// Name under which this installer is registered
    fn name(&self) -> &str;

    /// Removes the hosts in `cx` from the cluster's deployment, and the
    /// cluster itself if `delete_cluster` is set
    async fn delete_hosts(
        &self,
        cx: &RemovalContext<'_>,
        delete_cluster: bool,
    ) -> anyhow::Result<()>;
}
