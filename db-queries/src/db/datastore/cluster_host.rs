// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`DataStore`] methods on [`ClusterHost`] memberships.

use super::check_state_transition;
use super::ClusterHostStore;
use super::DataStore;
use async_trait::async_trait;
use provision_common::typed_uuid::ToUntypedUuid;
use provision_common::{
    CreateResult, DeleteResult, Error, ListResultVec, LookupResult,
    LookupType, ResourceType, UpdateResult,
};
use provision_db_model::{
    ClusterHost, ClusterHostFilter, ClusterHostKey, ClusterHostUpdate,
};

fn not_found(key: &ClusterHostKey) -> Error {
    LookupType::ByCompositeId(key.to_string())
        .into_not_found(ResourceType::ClusterHost)
}

impl DataStore {
    /// Stores a new membership.  Both the cluster and the host must already
    /// exist.
    pub fn cluster_host_insert(
        &self,
        cluster_host: ClusterHost,
    ) -> CreateResult<ClusterHost> {
        let mut records = self.records.lock().unwrap();
        if !records.clusters.contains_key(&cluster_host.cluster_id) {
            return Err(Error::not_found_by_id(
                ResourceType::Cluster,
                &cluster_host.cluster_id.to_untyped_uuid(),
            ));
        }
        if !records.hosts.contains_key(&cluster_host.host_id) {
            return Err(Error::not_found_by_id(
                ResourceType::Host,
                &cluster_host.host_id.to_untyped_uuid(),
            ));
        }
        let key = cluster_host.key();
        if records.cluster_hosts.contains_key(&key) {
            return Err(Error::ObjectAlreadyExists {
                type_name: ResourceType::ClusterHost,
                object_name: key.to_string(),
            });
        }
        records.cluster_hosts.insert(key, cluster_host.clone());
        Ok(cluster_host)
    }
}

#[async_trait]
impl ClusterHostStore for DataStore {
    async fn cluster_host_fetch(
        &self,
        key: ClusterHostKey,
    ) -> LookupResult<ClusterHost> {
        let records = self.records.lock().unwrap();
        records.cluster_hosts.get(&key).cloned().ok_or_else(|| not_found(&key))
    }

    async fn cluster_host_update(
        &self,
        key: ClusterHostKey,
        update: ClusterHostUpdate,
    ) -> UpdateResult<ClusterHost> {
        let mut records = self.records.lock().unwrap();
        let cluster_host = records
            .cluster_hosts
            .get_mut(&key)
            .ok_or_else(|| not_found(&key))?;
        if let Some(next) = update.state {
            check_state_transition(
                ResourceType::ClusterHost,
                &key,
                cluster_host.state,
                next,
            )?;
        }
        update.apply_to(cluster_host);
        debug!(self.log, "updated cluster host";
            "cluster_host" => %key,
            "state" => %cluster_host.state,
        );
        Ok(cluster_host.clone())
    }

    async fn cluster_host_delete(&self, key: ClusterHostKey) -> DeleteResult {
        let mut records = self.records.lock().unwrap();
        records.cluster_hosts.remove(&key).ok_or_else(|| not_found(&key))?;
        info!(self.log, "deleted cluster host"; "cluster_host" => %key);
        Ok(())
    }

    async fn cluster_host_list(
        &self,
        filter: ClusterHostFilter,
    ) -> ListResultVec<ClusterHost> {
        let records = self.records.lock().unwrap();
        Ok(records
            .cluster_hosts
            .values()
            .filter(|cluster_host| filter.matches(cluster_host))
            .cloned()
            .collect())
    }
}
