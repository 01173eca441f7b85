// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::ConfigBlob;
use chrono::{DateTime, Utc};
use provision_common::typed_uuid::{HostUuid, UserUuid};
use provision_common::LifecycleState;
use serde::{Deserialize, Serialize};

/// Database representation of a Host
///
/// A host's id is the id of the physical machine it runs on.  One host may
/// be a member of several clusters; each membership is a separate
/// [`crate::ClusterHost`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Host {
    pub id: HostUuid,
    pub name: String,
    pub time_created: DateTime<Utc>,
    pub time_modified: DateTime<Utc>,

    pub state: LifecycleState,
    /// Set while the operating system on this host may be (re)installed or
    /// removed.
    pub reinstall_os: bool,
    pub creator_id: UserUuid,

    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub os_config: ConfigBlob,
}

impl Host {
    pub fn new(
        machine_id: HostUuid,
        name: impl Into<String>,
        creator_id: UserUuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: machine_id,
            name: name.into(),
            time_created: now,
            time_modified: now,
            state: LifecycleState::Uninitialized,
            reinstall_os: true,
            creator_id,
            mac: None,
            os_config: ConfigBlob::new(),
        }
    }
}

/// Fields of a [`Host`] that the lifecycle core is allowed to change
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HostUpdate {
    pub state: Option<LifecycleState>,
    pub reinstall_os: Option<bool>,
}

impl HostUpdate {
    pub fn state(state: LifecycleState) -> Self {
        Self { state: Some(state), ..Default::default() }
    }

    pub fn reinstall(reinstall: bool) -> Self {
        Self { reinstall_os: Some(reinstall), ..Default::default() }
    }

    /// Returns whether this update asks for the reinstall flag to be raised
    pub fn sets_reinstall(&self) -> bool {
        self.reinstall_os == Some(true)
    }

    pub fn apply_to(&self, host: &mut Host) {
        if let Some(state) = self.state {
            host.state = state;
        }
        if let Some(reinstall) = self.reinstall_os {
            host.reinstall_os = reinstall;
        }
        host.time_modified = Utc::now();
    }
}
