// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`DataStore`] methods on [`Host`]s.

use super::check_state_transition;
use super::DataStore;
use super::HostStore;
use async_trait::async_trait;
use provision_common::typed_uuid::{HostUuid, ToUntypedUuid};
use provision_common::{
    CreateResult, DeleteResult, Error, LookupResult, ResourceType,
    UpdateResult,
};
use provision_db_model::{Host, HostUpdate};

impl DataStore {
    /// Stores a new host.  Its creator must already exist.
    pub fn host_insert(&self, host: Host) -> CreateResult<Host> {
        let mut records = self.records.lock().unwrap();
        if !records.users.contains_key(&host.creator_id) {
            return Err(Error::not_found_by_id(
                ResourceType::User,
                &host.creator_id.to_untyped_uuid(),
            ));
        }
        if records.hosts.contains_key(&host.id) {
            return Err(Error::ObjectAlreadyExists {
                type_name: ResourceType::Host,
                object_name: host.id.to_string(),
            });
        }
        records.hosts.insert(host.id, host.clone());
        Ok(host)
    }
}

#[async_trait]
impl HostStore for DataStore {
    async fn host_fetch(&self, id: HostUuid) -> LookupResult<Host> {
        let records = self.records.lock().unwrap();
        records.hosts.get(&id).cloned().ok_or_else(|| {
            Error::not_found_by_id(ResourceType::Host, &id.to_untyped_uuid())
        })
    }

    async fn host_update(
        &self,
        id: HostUuid,
        update: HostUpdate,
    ) -> UpdateResult<Host> {
        let mut records = self.records.lock().unwrap();
        let host = records.hosts.get_mut(&id).ok_or_else(|| {
            Error::not_found_by_id(ResourceType::Host, &id.to_untyped_uuid())
        })?;
        if let Some(next) = update.state {
            check_state_transition(ResourceType::Host, &id, host.state, next)?;
        }
        update.apply_to(host);
        debug!(self.log, "updated host";
            "host_id" => %id,
            "state" => %host.state,
            "reinstall_os" => host.reinstall_os,
        );
        Ok(host.clone())
    }

    async fn host_delete(&self, id: HostUuid) -> DeleteResult {
        let mut records = self.records.lock().unwrap();
        if records.cluster_hosts.keys().any(|key| key.host_id == id) {
            return Err(Error::invalid_request(&format!(
                "host {} is still a member of a cluster",
                id
            )));
        }
        records.hosts.remove(&id).ok_or_else(|| {
            Error::not_found_by_id(ResourceType::Host, &id.to_untyped_uuid())
        })?;
        info!(self.log, "deleted host"; "host_id" => %id);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::db::datastore::pub_test_utils::{
        create_test_cluster, datastore_test,
    };
    use crate::db::datastore::HostStore;
    use assert_matches::assert_matches;
    use provision_common::typed_uuid::HostUuid;
    use provision_common::{Error, LifecycleState, ResourceType};
    use provision_db_model::{Host, HostUpdate};
    use provision_test_utils::dev::test_setup_log;

    #[tokio::test]
    async fn test_host_update_and_delete() {
        let logctx = test_setup_log("test_host_update_and_delete");
        let (datastore, users) = datastore_test(&logctx.log);
        let fixture = create_test_cluster(&datastore, "c1", 1, &users.owner);
        let member = fixture.hosts[0].id;

        let host = datastore
            .host_update(
                member,
                HostUpdate {
                    state: Some(LifecycleState::Error),
                    reinstall_os: Some(false),
                },
            )
            .await
            .unwrap();
        assert_eq!(host.state, LifecycleState::Error);
        assert!(!host.reinstall_os);

        // A host that is still a member of a cluster can't be deleted.
        let error = datastore.host_delete(member).await.unwrap_err();
        assert_matches!(error, Error::InvalidRequest { .. });

        let loner = datastore
            .host_insert(Host::new(HostUuid::new_v4(), "loner", users.owner.id))
            .unwrap();
        datastore.host_delete(loner.id).await.unwrap();
        let error = datastore.host_fetch(loner.id).await.unwrap_err();
        assert_matches!(
            error,
            Error::ObjectNotFound { type_name: ResourceType::Host, .. }
        );

        // Inserting the same machine twice is a conflict.
        let error =
            datastore.host_insert(fixture.hosts[0].clone()).unwrap_err();
        assert_matches!(error, Error::ObjectAlreadyExists { .. });

        logctx.cleanup_successful();
    }
}
