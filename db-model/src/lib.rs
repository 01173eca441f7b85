// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Records held by the provisioning datastore
//!
//! These are the rows the CRUD layer creates and the lifecycle orchestrator
//! mutates: clusters, hosts, the cluster-host memberships between them, the
//! adapters that name the installers responsible for a cluster, and users.

mod adapter;
mod cluster;
mod cluster_host;
mod host;
mod user;

pub use adapter::*;
pub use cluster::*;
pub use cluster_host::*;
pub use host::*;
pub use user::*;

/// An opaque, structured configuration document (OS or package
/// configuration) attached to a record
///
/// Its schema belongs to the adapter's metadata and is validated elsewhere.
pub type ConfigBlob = serde_json::Map<String, serde_json::Value>;
