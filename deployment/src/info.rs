// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Snapshots of the records a [`crate::Deployer`] works from

use provision_common::typed_uuid::{
    AdapterUuid, ClusterUuid, HostUuid, UserUuid,
};
use provision_common::LifecycleState;
use serde::{Deserialize, Serialize};

/// Free-form configuration passed through to installers unchanged
pub type ConfigBlob = serde_json::Map<String, serde_json::Value>;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct AdapterInfo {
    pub id: AdapterUuid,
    pub name: String,
    pub distributed_system_name: Option<String>,
    /// name of the OS installer in the [`crate::InstallerRegistry`]
    pub os_installer: Option<String>,
    /// name of the package installer in the [`crate::InstallerRegistry`]
    pub package_installer: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ClusterInfo {
    pub id: ClusterUuid,
    pub name: String,
    pub adapter_id: AdapterUuid,
    pub creator_id: UserUuid,
    pub state: LifecycleState,
    pub os_config: ConfigBlob,
    pub package_config: ConfigBlob,
}

/// A host as a member of one particular cluster
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct HostInfo {
    pub id: HostUuid,
    pub name: String,
    pub mac: Option<String>,
    pub state: LifecycleState,
    pub reinstall_os: bool,
    pub os_config: ConfigBlob,
    /// package configuration of the host's membership in the cluster
    pub package_config: ConfigBlob,
    pub deployed_package_config: ConfigBlob,
}
