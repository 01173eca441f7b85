// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The boundary between lifecycle actions and the provisioning
//! infrastructure
//!
//! Lifecycle actions describe what they want removed with three snapshots
//! ([`AdapterInfo`], [`ClusterInfo`], and a list of [`HostInfo`]) and hand
//! them to a [`DeploymentBackend`], which returns a [`Deployer`] for that
//! cluster.  Everything the deployer does happens outside this process; the
//! caller only learns whether it worked.
//!
//! The production backend is the [`InstallerRegistry`]: a table of OS and
//! package installers, filled in at startup, from which a [`DeployManager`]
//! is assembled using the installer names recorded on the cluster's adapter.

mod errors;
mod info;
mod installer;
mod manager;
mod registry;
pub mod sim;

pub use errors::{DeployError, InstallerKind, RegistryError};
pub use info::{AdapterInfo, ClusterInfo, ConfigBlob, HostInfo};
pub use installer::{OsInstaller, PackageInstaller, RemovalContext};
pub use manager::DeployManager;
pub use registry::InstallerRegistry;

use async_trait::async_trait;

/// Removes hosts from one cluster's deployment
#[async_trait]
pub trait Deployer: Send + Sync {
    /// Removes the hosts this deployer was built for
    ///
    /// With `package_only`, only the distributed-system deployment is torn
    /// down and the hosts' operating systems are left provisioned.
    /// `delete_cluster` asks the package installer to tear down the cluster
    /// itself as well.
    async fn remove_hosts(
        &self,
        package_only: bool,
        delete_cluster: bool,
    ) -> Result<(), DeployError>;
}

/// Builds [`Deployer`]s from snapshots of a cluster
pub trait DeploymentBackend: Send + Sync {
    fn deployer(
        &self,
        adapter: AdapterInfo,
        cluster: ClusterInfo,
        hosts: Vec<HostInfo>,
    ) -> Result<Box<dyn Deployer>, DeployError>;
}

#[cfg(test)]
mod test_support {
    use crate::info::{AdapterInfo, ClusterInfo, ConfigBlob, HostInfo};
    use provision_common::typed_uuid::{
        AdapterUuid, ClusterUuid, HostUuid, UserUuid,
    };
    use provision_common::LifecycleState;

    pub fn adapter_info(
        os: Option<&str>,
        package: Option<&str>,
    ) -> AdapterInfo {
        AdapterInfo {
            id: AdapterUuid::new_v4(),
            name: String::from("test-adapter"),
            distributed_system_name: Some(String::from("hadoop")),
            os_installer: os.map(String::from),
            package_installer: package.map(String::from),
        }
    }

    pub fn cluster_info(adapter: &AdapterInfo) -> ClusterInfo {
        ClusterInfo {
            id: ClusterUuid::new_v4(),
            name: String::from("c1"),
            adapter_id: adapter.id,
            creator_id: UserUuid::new_v4(),
            state: LifecycleState::Error,
            os_config: ConfigBlob::new(),
            package_config: ConfigBlob::new(),
        }
    }

    pub fn host_info(name: &str) -> HostInfo {
        HostInfo {
            id: HostUuid::new_v4(),
            name: name.to_owned(),
            mac: None,
            state: LifecycleState::Error,
            reinstall_os: true,
            os_config: ConfigBlob::new(),
            package_config: ConfigBlob::new(),
            deployed_package_config: ConfigBlob::new(),
        }
    }
}
