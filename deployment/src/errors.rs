// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use provision_common::typed_uuid::ClusterUuid;
use thiserror::Error;

/// Which half of a deployment an installer is responsible for
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display)]
pub enum InstallerKind {
    #[strum(to_string = "OS")]
    Os,
    #[strum(to_string = "package")]
    Package,
}

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("{kind} installer {name:?} is already registered")]
    Duplicate { kind: InstallerKind, name: String },
    #[error("no {kind} installer named {name:?}")]
    NotFound { kind: InstallerKind, name: String },
}

#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(
        "{kind} installer {installer:?} failed to remove hosts of \
         cluster {cluster_id}"
    )]
    RemoveHosts {
        kind: InstallerKind,
        installer: String,
        cluster_id: ClusterUuid,
        #[source]
        err: anyhow::Error,
    },
}
