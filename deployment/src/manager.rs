// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::errors::{DeployError, InstallerKind};
use crate::info::{AdapterInfo, ClusterInfo, HostInfo};
use crate::installer::{OsInstaller, PackageInstaller, RemovalContext};
use crate::Deployer;
use async_trait::async_trait;
use slog::{debug, info, o, warn, Logger};
use std::sync::Arc;

/// Drives the OS and package installers chosen by a cluster's adapter
pub struct DeployManager {
    log: Logger,
    adapter: AdapterInfo,
    cluster: ClusterInfo,
    hosts: Vec<HostInfo>,
    os_installer: Option<Arc<dyn OsInstaller>>,
    package_installer: Option<Arc<dyn PackageInstaller>>,
}

impl DeployManager {
    pub fn new(
        log: &Logger,
        adapter: AdapterInfo,
        cluster: ClusterInfo,
        hosts: Vec<HostInfo>,
        os_installer: Option<Arc<dyn OsInstaller>>,
        package_installer: Option<Arc<dyn PackageInstaller>>,
    ) -> Self {
        let log = log.new(o!(
            "component" => "DeployManager",
            "cluster_id" => cluster.id.to_string(),
        ));
        debug!(log, "created deploy manager";
            "adapter" => ?adapter,
            "hosts" => ?hosts.iter().map(|h| h.id).collect::<Vec<_>>(),
            "os_installer" =>
                os_installer.as_ref().map(|i| i.name().to_owned()),
            "package_installer" =>
                package_installer.as_ref().map(|i| i.name().to_owned()),
        );
        DeployManager {
            log,
            adapter,
            cluster,
            hosts,
            os_installer,
            package_installer,
        }
    }

    fn context(&self) -> RemovalContext<'_> {
        RemovalContext {
            adapter: &self.adapter,
            cluster: &self.cluster,
            hosts: &self.hosts,
        }
    }
}

#[async_trait]
impl Deployer for DeployManager {
    async fn remove_hosts(
        &self,
        package_only: bool,
        delete_cluster: bool,
    ) -> Result<(), DeployError> {
        let cx = self.context();
        info!(self.log, "removing hosts";
            "nhosts" => self.hosts.len(),
            "package_only" => package_only,
            "delete_cluster" => delete_cluster,
        );

        if let Some(installer) = &self.os_installer {
            if package_only {
                debug!(self.log, "leaving OS provisioning in place";
                    "installer" => installer.name(),
                );
            } else {
                installer.delete_hosts(&cx).await.map_err(|err| {
                    warn!(self.log, "OS installer failed to remove hosts";
                        "installer" => installer.name(),
                        "error" => format!("{err:#}"),
                    );
                    DeployError::RemoveHosts {
                        kind: InstallerKind::Os,
                        installer: installer.name().to_owned(),
                        cluster_id: self.cluster.id,
                        err,
                    }
                })?;
            }
        }

        if let Some(installer) = &self.package_installer {
            installer.delete_hosts(&cx, delete_cluster).await.map_err(
                |err| {
                    warn!(self.log, "package installer failed to remove hosts";
                        "installer" => installer.name(),
                        "error" => format!("{err:#}"),
                    );
                    DeployError::RemoveHosts {
                        kind: InstallerKind::Package,
                        installer: installer.name().to_owned(),
                        cluster_id: self.cluster.id,
                        err,
                    }
                },
            )?;
        }

        info!(self.log, "removed hosts");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::{RemovalCall, SimOsInstaller, SimPackageInstaller};
    use crate::test_support::{adapter_info, cluster_info, host_info};
    use assert_matches::assert_matches;
    use provision_test_utils::dev::test_setup_log;

    struct Fixture {
        os: Arc<SimOsInstaller>,
        package: Arc<SimPackageInstaller>,
        manager: DeployManager,
    }

    fn fixture(log: &Logger) -> Fixture {
        let os = Arc::new(SimOsInstaller::new(log, "cobbler"));
        let package = Arc::new(SimPackageInstaller::new(log, "chef"));
        let adapter = adapter_info(Some("cobbler"), Some("chef"));
        let cluster = cluster_info(&adapter);
        let manager = DeployManager::new(
            log,
            adapter,
            cluster,
            vec![host_info("h1"), host_info("h2")],
            Some(Arc::clone(&os) as Arc<dyn OsInstaller>),
            Some(Arc::clone(&package) as Arc<dyn PackageInstaller>),
        );
        Fixture { os, package, manager }
    }

    #[tokio::test]
    async fn test_remove_hosts() {
        let logctx = test_setup_log("test_remove_hosts");
        let Fixture { os, package, manager } = fixture(&logctx.log);
        let expected = |delete_cluster| RemovalCall {
            cluster_id: manager.cluster.id,
            host_ids: manager.hosts.iter().map(|h| h.id).collect(),
            delete_cluster,
        };

        manager.remove_hosts(false, true).await.unwrap();
        assert_eq!(os.calls(), vec![expected(false)]);
        assert_eq!(package.calls(), vec![expected(true)]);

        // package_only leaves the OS installer alone
        manager.remove_hosts(true, false).await.unwrap();
        assert_eq!(os.calls().len(), 1);
        assert_eq!(package.calls(), vec![expected(true), expected(false)]);

        logctx.cleanup_successful();
    }

    #[tokio::test]
    async fn test_remove_hosts_failure() {
        let logctx = test_setup_log("test_remove_hosts_failure");
        let Fixture { os, package, manager } = fixture(&logctx.log);

        // An OS installer failure stops before the package installer runs.
        os.set_fail(true);
        let error = manager.remove_hosts(false, true).await.unwrap_err();
        assert_matches!(
            &error,
            DeployError::RemoveHosts { kind: InstallerKind::Os, installer, .. }
                if installer == "cobbler"
        );
        assert_eq!(os.calls().len(), 1);
        assert!(package.calls().is_empty());

        os.set_fail(false);
        package.set_fail(true);
        let error = manager.remove_hosts(false, true).await.unwrap_err();
        assert_matches!(
            error,
            DeployError::RemoveHosts { kind: InstallerKind::Package, .. }
        );
        assert_eq!(package.calls().len(), 1);

        package.set_fail(false);
        manager.remove_hosts(false, true).await.unwrap();

        logctx.cleanup_successful();
    }
}
