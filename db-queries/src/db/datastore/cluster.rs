// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`DataStore`] methods on [`Cluster`]s.

use super::check_state_transition;
use super::ClusterStore;
use super::DataStore;
use async_trait::async_trait;
use provision_common::typed_uuid::{ClusterUuid, ToUntypedUuid};
use provision_common::{
    CreateResult, DeleteResult, Error, LookupResult, ResourceType,
    UpdateResult,
};
use provision_db_model::{Cluster, ClusterUpdate};

impl DataStore {
    /// Stores a new cluster.  Its adapter and creator must already exist.
    pub fn cluster_insert(&self, cluster: Cluster) -> CreateResult<Cluster> {
        let mut records = self.records.lock().unwrap();
        if !records.adapters.contains_key(&cluster.adapter_id) {
            return Err(Error::not_found_by_id(
                ResourceType::Adapter,
                &cluster.adapter_id.to_untyped_uuid(),
            ));
        }
        if !records.users.contains_key(&cluster.creator_id) {
            return Err(Error::not_found_by_id(
                ResourceType::User,
                &cluster.creator_id.to_untyped_uuid(),
            ));
        }
        if records.clusters.contains_key(&cluster.id) {
            return Err(Error::ObjectAlreadyExists {
                type_name: ResourceType::Cluster,
                object_name: cluster.id.to_string(),
            });
        }
        records.clusters.insert(cluster.id, cluster.clone());
        Ok(cluster)
    }
}

#[async_trait]
impl ClusterStore for DataStore {
    async fn cluster_fetch(&self, id: ClusterUuid) -> LookupResult<Cluster> {
        let records = self.records.lock().unwrap();
        records.clusters.get(&id).cloned().ok_or_else(|| {
            Error::not_found_by_id(ResourceType::Cluster, &id.to_untyped_uuid())
        })
    }

    async fn cluster_update(
        &self,
        id: ClusterUuid,
        update: ClusterUpdate,
    ) -> UpdateResult<Cluster> {
        let mut records = self.records.lock().unwrap();
        let cluster = records.clusters.get_mut(&id).ok_or_else(|| {
            Error::not_found_by_id(ResourceType::Cluster, &id.to_untyped_uuid())
        })?;
        if let Some(next) = update.state {
            check_state_transition(
                ResourceType::Cluster,
                &id,
                cluster.state,
                next,
            )?;
        }
        update.apply_to(cluster);
        debug!(self.log, "updated cluster";
            "cluster_id" => %id,
            "state" => %cluster.state,
            "reinstall_distributed_system" =>
                cluster.reinstall_distributed_system,
        );
        Ok(cluster.clone())
    }

    async fn cluster_delete(&self, id: ClusterUuid) -> DeleteResult {
        let mut records = self.records.lock().unwrap();
        if records.cluster_hosts.keys().any(|key| key.cluster_id == id) {
            return Err(Error::invalid_request(&format!(
                "cluster {} still has member hosts",
                id
            )));
        }
        records.clusters.remove(&id).ok_or_else(|| {
            Error::not_found_by_id(ResourceType::Cluster, &id.to_untyped_uuid())
        })?;
        info!(self.log, "deleted cluster"; "cluster_id" => %id);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::db::datastore::pub_test_utils::{
        create_test_cluster, datastore_test,
    };
    use crate::db::datastore::{ClusterHostStore, ClusterStore};
    use assert_matches::assert_matches;
    use provision_common::{Error, LifecycleState};
    use provision_db_model::{ClusterHostKey, ClusterUpdate};
    use provision_test_utils::dev::test_setup_log;

    #[tokio::test]
    async fn test_cluster_update_enforces_state_machine() {
        let logctx =
            test_setup_log("test_cluster_update_enforces_state_machine");
        let (datastore, users) = datastore_test(&logctx.log);
        let fixture = create_test_cluster(&datastore, "c1", 1, &users.owner);
        let id = fixture.cluster.id;

        let cluster = datastore
            .cluster_update(
                id,
                ClusterUpdate::state(LifecycleState::Installing),
            )
            .await
            .unwrap();
        assert_eq!(cluster.state, LifecycleState::Installing);
        assert!(cluster.time_modified >= fixture.cluster.time_modified);

        let cluster = datastore
            .cluster_update(id, ClusterUpdate::state(LifecycleState::Error))
            .await
            .unwrap();
        assert_eq!(cluster.state, LifecycleState::Error);

        // Rewriting ERROR is fine; leaving it is not.
        datastore
            .cluster_update(id, ClusterUpdate::state(LifecycleState::Error))
            .await
            .unwrap();
        let error = datastore
            .cluster_update(
                id,
                ClusterUpdate::state(LifecycleState::Successful),
            )
            .await
            .unwrap_err();
        assert_matches!(error, Error::InvalidRequest { .. });
        let cluster = datastore.cluster_fetch(id).await.unwrap();
        assert_eq!(cluster.state, LifecycleState::Error);

        logctx.cleanup_successful();
    }

    #[tokio::test]
    async fn test_cluster_delete_requires_no_members() {
        let logctx = test_setup_log("test_cluster_delete_requires_no_members");
        let (datastore, users) = datastore_test(&logctx.log);
        let fixture = create_test_cluster(&datastore, "c1", 1, &users.owner);
        let id = fixture.cluster.id;

        let error = datastore.cluster_delete(id).await.unwrap_err();
        assert_matches!(error, Error::InvalidRequest { .. });

        datastore
            .cluster_host_delete(ClusterHostKey::new(id, fixture.hosts[0].id))
            .await
            .unwrap();
        datastore.cluster_delete(id).await.unwrap();
        let error = datastore.cluster_fetch(id).await.unwrap_err();
        assert_matches!(error, Error::ObjectNotFound { .. });
        let error = datastore.cluster_delete(id).await.unwrap_err();
        assert_matches!(error, Error::ObjectNotFound { .. });

        logctx.cleanup_successful();
    }
}
