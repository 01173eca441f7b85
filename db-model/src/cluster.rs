// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::ConfigBlob;
use chrono::{DateTime, Utc};
use provision_common::typed_uuid::{AdapterUuid, ClusterUuid, UserUuid};
use provision_common::LifecycleState;
use serde::{Deserialize, Serialize};

/// Database representation of a Cluster
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Cluster {
    pub id: ClusterUuid,
    pub name: String,
    pub time_created: DateTime<Utc>,
    pub time_modified: DateTime<Utc>,

    pub state: LifecycleState,
    /// Set while the distributed system on this cluster may be
    /// (re)installed or torn down.
    pub reinstall_distributed_system: bool,
    pub creator_id: UserUuid,
    pub adapter_id: AdapterUuid,

    #[serde(default)]
    pub os_config: ConfigBlob,
    #[serde(default)]
    pub package_config: ConfigBlob,
    #[serde(default)]
    pub config_validated: bool,
}

impl Cluster {
    /// A newly-created cluster: nothing installed yet, and open for
    /// installation.
    pub fn new(
        name: impl Into<String>,
        adapter_id: AdapterUuid,
        creator_id: UserUuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ClusterUuid::new_v4(),
            name: name.into(),
            time_created: now,
            time_modified: now,
            state: LifecycleState::Uninitialized,
            reinstall_distributed_system: true,
            creator_id,
            adapter_id,
            os_config: ConfigBlob::new(),
            package_config: ConfigBlob::new(),
            config_validated: false,
        }
    }
}

/// Fields of a [`Cluster`] that the lifecycle core is allowed to change
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClusterUpdate {
    pub state: Option<LifecycleState>,
    pub reinstall_distributed_system: Option<bool>,
}

impl ClusterUpdate {
    pub fn state(state: LifecycleState) -> Self {
        Self { state: Some(state), ..Default::default() }
    }

    pub fn reinstall(reinstall: bool) -> Self {
        Self {
            reinstall_distributed_system: Some(reinstall),
            ..Default::default()
        }
    }

    /// Returns whether this update asks for the reinstall flag to be raised
    pub fn sets_reinstall(&self) -> bool {
        self.reinstall_distributed_system == Some(true)
    }

    /// Applies this update to `cluster`, bumping its modification time
    pub fn apply_to(&self, cluster: &mut Cluster) {
        if let Some(state) = self.state {
            cluster.state = state;
        }
        if let Some(reinstall) = self.reinstall_distributed_system {
            cluster.reinstall_distributed_system = reinstall;
        }
        cluster.time_modified = Utc::now();
    }
}
