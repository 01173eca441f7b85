// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use provision_common::typed_uuid::AdapterUuid;
use serde::{Deserialize, Serialize};

/// Database representation of an Adapter
///
/// An adapter pairs an operating system flavor with a distributed system and
/// names the installers that know how to deploy them.  The installer names
/// are resolved against the installer registry when a deployment backend is
/// built for a cluster.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Adapter {
    pub id: AdapterUuid,
    pub name: String,
    #[serde(default)]
    pub distributed_system_name: Option<String>,
    #[serde(default)]
    pub os_installer: Option<String>,
    #[serde(default)]
    pub package_installer: Option<String>,
}

impl Adapter {
    pub fn new(
        name: impl Into<String>,
        os_installer: Option<&str>,
        package_installer: Option<&str>,
    ) -> Self {
        Self {
            id: AdapterUuid::new_v4(),
            name: name.into(),
            distributed_system_name: None,
            os_installer: os_installer.map(String::from),
            package_installer: package_installer.map(String::from),
        }
    }
}
