// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Test support code that can be enabled by dependencies via this crate's
//! `testing` feature.
//!
//! This feature should only be enabled under `dev-dependencies` to avoid this
//! test support code leaking into release binaries.

use crate::db::DataStore;
use provision_common::typed_uuid::HostUuid;
use provision_db_model::{Adapter, Cluster, ClusterHost, Host, User};
use slog::Logger;
use std::sync::Arc;

/// Name of the OS installer that test adapters refer to
pub const TEST_OS_INSTALLER: &str = "test-os-installer";
/// Name of the package installer that test adapters refer to
pub const TEST_PACKAGE_INSTALLER: &str = "test-package-installer";

/// The users preloaded by [`datastore_test`]
pub struct TestUsers {
    /// an administrator, who may edit anything
    pub admin: User,
    /// the creator of the records made by [`create_test_cluster`] in most
    /// tests
    pub owner: User,
    /// an ordinary user who owns nothing
    pub intruder: User,
}

/// Constructs a DataStore for use in test suites that has preloaded an
/// administrator and two ordinary users
pub fn datastore_test(log: &Logger) -> (Arc<DataStore>, TestUsers) {
    let datastore = Arc::new(DataStore::new(log));
    let users = TestUsers {
        admin: datastore.user_insert(User::new("admin", true)).unwrap(),
        owner: datastore.user_insert(User::new("owner", false)).unwrap(),
        intruder: datastore.user_insert(User::new("intruder", false)).unwrap(),
    };
    (datastore, users)
}

/// A cluster created by [`create_test_cluster`], along with its hosts
pub struct TestCluster {
    pub adapter: Adapter,
    pub cluster: Cluster,
    pub hosts: Vec<Host>,
}

/// Creates a cluster named `name` owned by `creator`, with `nhosts` fresh
/// hosts as members
///
/// Every record starts out UNINITIALIZED with its reinstall flag set.  The
/// cluster's adapter names [`TEST_OS_INSTALLER`] and
/// [`TEST_PACKAGE_INSTALLER`].
pub fn create_test_cluster(
    datastore: &DataStore,
    name: &str,
    nhosts: usize,
    creator: &User,
) -> TestCluster {
    let adapter = datastore
        .adapter_insert(Adapter::new(
            format!("{name}-adapter"),
            Some(TEST_OS_INSTALLER),
            Some(TEST_PACKAGE_INSTALLER),
        ))
        .unwrap();
    let cluster = datastore
        .cluster_insert(Cluster::new(name, adapter.id, creator.id))
        .unwrap();
    let hosts = (0..nhosts)
        .map(|i| {
            let host = datastore
                .host_insert(Host::new(
                    HostUuid::new_v4(),
                    format!("{name}-host{i}"),
                    creator.id,
                ))
                .unwrap();
            add_host_to_cluster(datastore, &cluster, host.id);
            host
        })
        .collect();
    TestCluster { adapter, cluster, hosts }
}

/// Makes an existing host a member of `cluster`
pub fn add_host_to_cluster(
    datastore: &DataStore,
    cluster: &Cluster,
    host_id: HostUuid,
) -> ClusterHost {
    datastore
        .cluster_host_insert(ClusterHost::new(cluster.id, host_id))
        .unwrap()
}
