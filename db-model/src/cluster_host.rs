// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::ConfigBlob;
use chrono::{DateTime, Utc};
use provision_common::typed_uuid::{ClusterUuid, HostUuid};
use provision_common::LifecycleState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Database representation of a host's membership in a cluster
///
/// This is the unit of deployment: the package installer deploys the
/// cluster's distributed system onto each membership separately.  The row
/// exists only while the host is a declared member of the cluster.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ClusterHost {
    pub cluster_id: ClusterUuid,
    pub host_id: HostUuid,
    pub time_created: DateTime<Utc>,
    pub time_modified: DateTime<Utc>,

    pub state: LifecycleState,
    #[serde(default)]
    pub package_config: ConfigBlob,
    #[serde(default)]
    pub deployed_package_config: ConfigBlob,
    #[serde(default)]
    pub config_validated: bool,
}

impl ClusterHost {
    pub fn new(cluster_id: ClusterUuid, host_id: HostUuid) -> Self {
        let now = Utc::now();
        Self {
            cluster_id,
            host_id,
            time_created: now,
            time_modified: now,
            state: LifecycleState::Uninitialized,
            package_config: ConfigBlob::new(),
            deployed_package_config: ConfigBlob::new(),
            config_validated: false,
        }
    }

    pub fn key(&self) -> ClusterHostKey {
        ClusterHostKey { cluster_id: self.cluster_id, host_id: self.host_id }
    }
}

/// Composite identity of a [`ClusterHost`]
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd,
    Serialize,
)]
pub struct ClusterHostKey {
    pub cluster_id: ClusterUuid,
    pub host_id: HostUuid,
}

impl ClusterHostKey {
    pub fn new(cluster_id: ClusterUuid, host_id: HostUuid) -> Self {
        Self { cluster_id, host_id }
    }
}

impl fmt::Display for ClusterHostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.cluster_id, self.host_id)
    }
}

/// Fields of a [`ClusterHost`] that the lifecycle core is allowed to change
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClusterHostUpdate {
    pub state: Option<LifecycleState>,
}

impl ClusterHostUpdate {
    pub fn state(state: LifecycleState) -> Self {
        Self { state: Some(state) }
    }

    pub fn apply_to(&self, cluster_host: &mut ClusterHost) {
        if let Some(state) = self.state {
            cluster_host.state = state;
        }
        cluster_host.time_modified = Utc::now();
    }
}

/// Selects [`ClusterHost`] rows by cluster, by host, or both
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClusterHostFilter {
    pub cluster_id: Option<ClusterUuid>,
    pub host_id: Option<HostUuid>,
}

impl ClusterHostFilter {
    pub fn cluster(cluster_id: ClusterUuid) -> Self {
        Self { cluster_id: Some(cluster_id), host_id: None }
    }

    pub fn host(host_id: HostUuid) -> Self {
        Self { cluster_id: None, host_id: Some(host_id) }
    }

    pub fn matches(&self, cluster_host: &ClusterHost) -> bool {
        self.cluster_id.map_or(true, |id| id == cluster_host.cluster_id)
            && self.host_id.map_or(true, |id| id == cluster_host.host_id)
    }
}
