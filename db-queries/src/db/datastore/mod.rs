// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Primary control plane interface for provisioning records
//!
//! The lifecycle orchestrator consumes the datastore only through the traits
//! in this module: per-record fetch, field update, and delete operations, plus
//! a filtered listing of cluster memberships.  Each call is atomic on its
//! own.  Nothing here groups several calls into one transaction; callers that
//! need several records to change consistently serialize themselves with an
//! outer lock instead.
//!
//! [`DataStore`] is the in-memory implementation.  It is what the test suites
//! and `provisionctl` run against, and it can be loaded from and saved to a
//! [`StoreSnapshot`].

use async_trait::async_trait;
use provision_common::typed_uuid::{
    AdapterUuid, ClusterUuid, HostUuid, UserUuid,
};
use provision_common::{
    DeleteResult, Error, LifecycleState, ListResultVec, LookupResult,
    ResourceType, UpdateResult,
};
use provision_db_model::{
    Adapter, Cluster, ClusterHost, ClusterHostFilter, ClusterHostKey,
    ClusterHostUpdate, ClusterUpdate, Host, HostUpdate, User,
};
use serde::{Deserialize, Serialize};
use slog::Logger;
use std::collections::BTreeMap;
use std::sync::Mutex;

mod adapter;
mod cluster;
mod cluster_host;
mod host;
#[cfg(any(test, feature = "testing"))]
pub mod pub_test_utils;
mod user;

#[async_trait]
pub trait ClusterStore: Send + Sync {
    async fn cluster_fetch(&self, id: ClusterUuid) -> LookupResult<Cluster>;

    /// Applies `update` to the cluster.  A state change that
    /// [`LifecycleState::can_transition_to`] does not allow is rejected with
    /// [`Error::InvalidRequest`].
    async fn cluster_update(
        &self,
        id: ClusterUuid,
        update: ClusterUpdate,
    ) -> UpdateResult<Cluster>;

    async fn cluster_delete(&self, id: ClusterUuid) -> DeleteResult;
}

#[async_trait]
pub trait HostStore: Send + Sync {
    async fn host_fetch(&self, id: HostUuid) -> LookupResult<Host>;

    /// Applies `update` to the host, with the same state transition rules
    /// as [`ClusterStore::cluster_update`].
    async fn host_update(
        &self,
        id: HostUuid,
        update: HostUpdate,
    ) -> UpdateResult<Host>;

    async fn host_delete(&self, id: HostUuid) -> DeleteResult;
}

#[async_trait]
pub trait ClusterHostStore: Send + Sync {
    async fn cluster_host_fetch(
        &self,
        key: ClusterHostKey,
    ) -> LookupResult<ClusterHost>;

    async fn cluster_host_update(
        &self,
        key: ClusterHostKey,
        update: ClusterHostUpdate,
    ) -> UpdateResult<ClusterHost>;

    async fn cluster_host_delete(&self, key: ClusterHostKey) -> DeleteResult;

    async fn cluster_host_list(
        &self,
        filter: ClusterHostFilter,
    ) -> ListResultVec<ClusterHost>;
}

#[async_trait]
pub trait AdapterStore: Send + Sync {
    async fn adapter_fetch(&self, id: AdapterUuid) -> LookupResult<Adapter>;
}

/// Resolves the principal behind a request
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn user_fetch_by_name(&self, name: &str) -> LookupResult<User>;
}

/// Everything the lifecycle orchestrator needs from a datastore
pub trait EntityStore:
    ClusterStore + HostStore + ClusterHostStore + AdapterStore + UserLookup
{
}

impl<T> EntityStore for T where
    T: ClusterStore + HostStore + ClusterHostStore + AdapterStore + UserLookup
{
}

/// Rejects a state change that the lifecycle state machine does not allow
pub(crate) fn check_state_transition(
    type_name: ResourceType,
    object_id: &dyn std::fmt::Display,
    current: LifecycleState,
    next: LifecycleState,
) -> Result<(), Error> {
    if current.can_transition_to(next) {
        Ok(())
    } else {
        Err(Error::invalid_request(&format!(
            "{} {}: cannot move from {} to {}",
            type_name, object_id, current, next
        )))
    }
}

/// Every record in a [`DataStore`], in a form that can be written to and read
/// back from disk
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub adapters: Vec<Adapter>,
    #[serde(default)]
    pub clusters: Vec<Cluster>,
    #[serde(default)]
    pub hosts: Vec<Host>,
    #[serde(default)]
    pub cluster_hosts: Vec<ClusterHost>,
}

#[derive(Default)]
struct Records {
    users: BTreeMap<UserUuid, User>,
    adapters: BTreeMap<AdapterUuid, Adapter>,
    clusters: BTreeMap<ClusterUuid, Cluster>,
    hosts: BTreeMap<HostUuid, Host>,
    cluster_hosts: BTreeMap<ClusterHostKey, ClusterHost>,
}

/// In-memory datastore for provisioning records
pub struct DataStore {
    log: Logger,
    records: Mutex<Records>,
}

impl DataStore {
    pub fn new(log: &Logger) -> DataStore {
        DataStore {
            log: log.new(o!("component" => "datastore")),
            records: Mutex::new(Records::default()),
        }
    }

    /// Builds a datastore holding exactly the records in `snapshot`
    ///
    /// Records are inserted parents-first, so a snapshot whose memberships
    /// or clusters refer to missing rows is rejected the same way the
    /// individual inserts would reject them.
    pub fn from_snapshot(
        log: &Logger,
        snapshot: StoreSnapshot,
    ) -> Result<DataStore, Error> {
        let datastore = DataStore::new(log);
        for user in snapshot.users {
            datastore.user_insert(user)?;
        }
        for adapter in snapshot.adapters {
            datastore.adapter_insert(adapter)?;
        }
        for cluster in snapshot.clusters {
            datastore.cluster_insert(cluster)?;
        }
        for host in snapshot.hosts {
            datastore.host_insert(host)?;
        }
        for cluster_host in snapshot.cluster_hosts {
            datastore.cluster_host_insert(cluster_host)?;
        }
        info!(datastore.log, "loaded datastore snapshot");
        Ok(datastore)
    }

    /// Returns a copy of every record currently stored
    pub fn snapshot(&self) -> StoreSnapshot {
        let records = self.records.lock().unwrap();
        StoreSnapshot {
            users: records.users.values().cloned().collect(),
            adapters: records.adapters.values().cloned().collect(),
            clusters: records.clusters.values().cloned().collect(),
            hosts: records.hosts.values().cloned().collect(),
            cluster_hosts: records.cluster_hosts.values().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_matches::assert_matches;
    use provision_test_utils::dev::test_setup_log;

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let logctx = test_setup_log("test_snapshot_round_trip");
        let datastore = DataStore::new(&logctx.log);

        let owner = User::new("owner", false);
        let adapter = Adapter::new("centos-hadoop", Some("os"), Some("pkg"));
        let cluster = Cluster::new("c1", adapter.id, owner.id);
        let host = Host::new(HostUuid::new_v4(), "h1", owner.id);
        datastore.user_insert(owner.clone()).unwrap();
        datastore.adapter_insert(adapter).unwrap();
        datastore.cluster_insert(cluster.clone()).unwrap();
        datastore.host_insert(host.clone()).unwrap();
        datastore
            .cluster_host_insert(ClusterHost::new(cluster.id, host.id))
            .unwrap();

        let snapshot = datastore.snapshot();
        let json = serde_json::to_string_pretty(&snapshot).unwrap();
        let parsed: StoreSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);

        let reloaded = DataStore::from_snapshot(&logctx.log, parsed).unwrap();
        assert_eq!(reloaded.snapshot(), snapshot);
        let fetched = reloaded.cluster_fetch(cluster.id).await.unwrap();
        assert_eq!(fetched, cluster);

        logctx.cleanup_successful();
    }

    #[tokio::test]
    async fn test_snapshot_rejects_dangling_membership() {
        let logctx =
            test_setup_log("test_snapshot_rejects_dangling_membership");

        let owner = User::new("owner", false);
        let adapter = Adapter::new("centos-hadoop", None, None);
        let cluster = Cluster::new("c1", adapter.id, owner.id);
        let snapshot = StoreSnapshot {
            users: vec![owner],
            adapters: vec![adapter],
            clusters: vec![cluster.clone()],
            hosts: vec![],
            cluster_hosts: vec![ClusterHost::new(
                cluster.id,
                HostUuid::new_v4(),
            )],
        };
        let error =
            DataStore::from_snapshot(&logctx.log, snapshot).err().unwrap();
        assert_matches!(
            error,
            Error::ObjectNotFound { type_name: ResourceType::Host, .. }
        );

        logctx.cleanup_successful();
    }
}
