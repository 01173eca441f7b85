// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::errors::{DeployError, InstallerKind, RegistryError};
use crate::info::{AdapterInfo, ClusterInfo, HostInfo};
use crate::installer::{OsInstaller, PackageInstaller};
use crate::manager::DeployManager;
use crate::{Deployer, DeploymentBackend};
use slog::{info, o, Logger};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Installers known to this process, by name
///
/// The registry is filled in at startup and then shared read-only.
/// Installer names are unique within each kind; looking up a name that was
/// never registered is an error rather than a silent no-op.
pub struct InstallerRegistry {
    log: Logger,
    os_installers: BTreeMap<String, Arc<dyn OsInstaller>>,
    package_installers: BTreeMap<String, Arc<dyn PackageInstaller>>,
}

impl InstallerRegistry {
    pub fn new(log: &Logger) -> Self {
        InstallerRegistry {
            log: log.new(o!("component" => "InstallerRegistry")),
            os_installers: BTreeMap::new(),
            package_installers: BTreeMap::new(),
        }
    }

    pub fn register_os_installer(
        &mut self,
        installer: Arc<dyn OsInstaller>,
    ) -> Result<(), RegistryError> {
        let name = installer.name().to_owned();
        if self.os_installers.contains_key(&name) {
            return Err(RegistryError::Duplicate {
                kind: InstallerKind::Os,
                name,
            });
        }
        info!(self.log, "registered OS installer"; "name" => &name);
        self.os_installers.insert(name, installer);
        Ok(())
    }

    pub fn register_package_installer(
        &mut self,
        installer: Arc<dyn PackageInstaller>,
    ) -> Result<(), RegistryError> {
        let name = installer.name().to_owned();
        if self.package_installers.contains_key(&name) {
            return Err(RegistryError::Duplicate {
                kind: InstallerKind::Package,
                name,
            });
        }
        info!(self.log, "registered package installer"; "name" => &name);
        self.package_installers.insert(name, installer);
        Ok(())
    }

    pub fn os_installer(
        &self,
        name: &str,
    ) -> Result<Arc<dyn OsInstaller>, RegistryError> {
        self.os_installers.get(name).cloned().ok_or_else(|| {
            RegistryError::NotFound {
                kind: InstallerKind::Os,
                name: name.to_owned(),
            }
        })
    }

    pub fn package_installer(
        &self,
        name: &str,
    ) -> Result<Arc<dyn PackageInstaller>, RegistryError> {
        self.package_installers.get(name).cloned().ok_or_else(|| {
            RegistryError::NotFound {
                kind: InstallerKind::Package,
                name: name.to_owned(),
            }
        })
    }
}

impl DeploymentBackend for InstallerRegistry {
    fn deployer(
        &self,
        adapter: AdapterInfo,
        cluster: ClusterInfo,
        hosts: Vec<HostInfo>,
    ) -> Result<Box<dyn Deployer>, DeployError> {
        let os_installer = adapter
            .os_installer
            .as_deref()
            .map(|name| self.os_installer(name))
            .transpose()?;
        let package_installer = adapter
            .package_installer
            .as_deref()
            .map(|name| self.package_installer(name))
            .transpose()?;
        Ok(Box::new(DeployManager::new(
            &self.log,
            adapter,
            cluster,
            hosts,
            os_installer,
            package_installer,
        )))
    }
}
