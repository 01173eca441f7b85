// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The destructive lifecycle actions

use crate::error::ActionError;
use crate::helpers::{
    check_sole_membership, delete_cluster_rows, delete_host_rows,
    uncovered_memberships, DeploySnapshot,
};
use crate::Orchestrator;
use provision_common::typed_uuid::{ClusterUuid, HostUuid};
use provision_common::LifecycleState;
use provision_db_model::{
    ClusterHostKey, ClusterHostUpdate, ClusterUpdate, HostUpdate,
};
use provision_db_queries::editability::{
    cluster_update_checked, host_update_checked, is_editable, EditIntent,
    OnNotEditable,
};
use slog::{info, o, warn, Logger};
use std::collections::BTreeSet;

/// Drops repeated ids, keeping the first occurrence of each
fn unique<T: Copy + Ord>(ids: &[T]) -> Vec<T> {
    let mut seen = BTreeSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

impl Orchestrator {
    /// Deletes `cluster_id`, removing `host_ids` from it
    ///
    /// The memberships of the listed hosts are always deleted.  The hosts
    /// themselves are deleted, and their operating systems deprovisioned,
    /// only with `delete_underlying_host`, which is refused for a host that
    /// also belongs to another cluster.  The cluster row goes away once no
    /// host belongs to it any more.
    pub async fn delete_cluster(
        &self,
        cluster_id: ClusterUuid,
        host_ids: &[HostUuid],
        username: &str,
        delete_underlying_host: bool,
    ) -> Result<(), ActionError> {
        let log = self.log.new(o!(
            "action" => "delete_cluster",
            "cluster_id" => cluster_id.to_string(),
            "username" => username.to_owned(),
        ));
        let mut lock = self.acquire_lock(&log).await?;
        let result = self
            .delete_cluster_locked(
                &log,
                cluster_id,
                &unique(host_ids),
                username,
                delete_underlying_host,
            )
            .await;
        lock.release();
        log_outcome(&log, &result);
        result
    }

    async fn delete_cluster_locked(
        &self,
        log: &Logger,
        cluster_id: ClusterUuid,
        host_ids: &[HostUuid],
        username: &str,
        delete_underlying_host: bool,
    ) -> Result<(), ActionError> {
        let datastore = &*self.datastore;
        let principal = datastore.user_fetch_by_name(username).await?;

        // Check everything before touching anything.  The checks are made
        // against the records as the writes below will leave them: in ERROR,
        // where only ownership can still get in the way.
        let mut cluster = datastore.cluster_fetch(cluster_id).await?;
        cluster.state = LifecycleState::Error;
        is_editable(
            &cluster,
            &principal,
            EditIntent::Reinstall,
            OnNotEditable::Fail,
        )?;
        for host_id in host_ids {
            let mut host = datastore.host_fetch(*host_id).await?;
            datastore
                .cluster_host_fetch(ClusterHostKey::new(cluster_id, *host_id))
                .await?;
            host.state = LifecycleState::Error;
            is_editable(
                &host,
                &principal,
                EditIntent::Reinstall,
                OnNotEditable::Fail,
            )?;
            if delete_underlying_host {
                check_sole_membership(datastore, cluster_id, *host_id).await?;
            }
        }

        // Memberships fail before their hosts do.
        for host_id in host_ids {
            datastore
                .cluster_host_update(
                    ClusterHostKey::new(cluster_id, *host_id),
                    ClusterHostUpdate::state(LifecycleState::Error),
                )
                .await?;
            datastore
                .host_update(*host_id, HostUpdate::state(LifecycleState::Error))
                .await?;
        }
        datastore
            .cluster_update(
                cluster_id,
                ClusterUpdate::state(LifecycleState::Error),
            )
            .await?;

        cluster_update_checked(
            datastore,
            cluster_id,
            &principal,
            ClusterUpdate::reinstall(true),
        )
        .await?;
        for host_id in host_ids {
            host_update_checked(
                datastore,
                *host_id,
                &principal,
                HostUpdate::reinstall(true),
            )
            .await?;
        }
        info!(log, "marked cluster and hosts for removal";
            "nhosts" => host_ids.len(),
        );

        self.remove_hosts(
            log,
            cluster_id,
            host_ids,
            !delete_underlying_host,
            true,
        )
        .await?;
        delete_cluster_rows(
            log,
            datastore,
            cluster_id,
            host_ids,
            delete_underlying_host,
        )
        .await?;
        Ok(())
    }

    /// Removes `host_id` from `cluster_id`, leaving the cluster's other
    /// members alone
    ///
    /// With `delete_underlying_host` the host is deprovisioned and deleted
    /// as well, provided this is the only cluster it belongs to.
    pub async fn delete_cluster_host(
        &self,
        cluster_id: ClusterUuid,
        host_id: HostUuid,
        username: &str,
        delete_underlying_host: bool,
    ) -> Result<(), ActionError> {
        let log = self.log.new(o!(
            "action" => "delete_cluster_host",
            "cluster_id" => cluster_id.to_string(),
            "host_id" => host_id.to_string(),
            "username" => username.to_owned(),
        ));
        let mut lock = self.acquire_lock(&log).await?;
        let result = self
            .delete_cluster_host_locked(
                &log,
                cluster_id,
                host_id,
                username,
                delete_underlying_host,
            )
            .await;
        lock.release();
        log_outcome(&log, &result);
        result
    }

    async fn delete_cluster_host_locked(
        &self,
        log: &Logger,
        cluster_id: ClusterUuid,
        host_id: HostUuid,
        username: &str,
        delete_underlying_host: bool,
    ) -> Result<(), ActionError> {
        let datastore = &*self.datastore;
        let principal = datastore.user_fetch_by_name(username).await?;

        let cluster = datastore.cluster_fetch(cluster_id).await?;
        let host = datastore.host_fetch(host_id).await?;
        let key = ClusterHostKey::new(cluster_id, host_id);
        datastore.cluster_host_fetch(key).await?;
        is_editable(
            &cluster,
            &principal,
            EditIntent::Edit,
            OnNotEditable::Fail,
        )?;
        if delete_underlying_host {
            is_editable(
                &host,
                &principal,
                EditIntent::Edit,
                OnNotEditable::Fail,
            )?;
            check_sole_membership(datastore, cluster_id, host_id).await?;
        }

        self.remove_hosts(
            log,
            cluster_id,
            &[host_id],
            !delete_underlying_host,
            false,
        )
        .await?;

        datastore.cluster_host_delete(key).await?;
        if delete_underlying_host {
            delete_host_rows(log, datastore, host_id).await?;
        }
        Ok(())
    }

    /// Deletes `host_id`, first removing it from each of `cluster_ids`
    ///
    /// The deployment backend is asked once per cluster to remove the host's
    /// share of that cluster's deployment, in the order given, followed by
    /// any cluster the host belongs to that `cluster_ids` left out.  Only
    /// then is the host row deleted, along with its memberships.
    pub async fn delete_host(
        &self,
        host_id: HostUuid,
        cluster_ids: &[ClusterUuid],
        username: &str,
    ) -> Result<(), ActionError> {
        let log = self.log.new(o!(
            "action" => "delete_host",
            "host_id" => host_id.to_string(),
            "username" => username.to_owned(),
        ));
        let mut lock = self.acquire_lock(&log).await?;
        let result = self
            .delete_host_locked(&log, host_id, &unique(cluster_ids), username)
            .await;
        lock.release();
        log_outcome(&log, &result);
        result
    }

    async fn delete_host_locked(
        &self,
        log: &Logger,
        host_id: HostUuid,
        cluster_ids: &[ClusterUuid],
        username: &str,
    ) -> Result<(), ActionError> {
        let datastore = &*self.datastore;
        let principal = datastore.user_fetch_by_name(username).await?;

        let host = datastore.host_fetch(host_id).await?;
        is_editable(&host, &principal, EditIntent::Edit, OnNotEditable::Fail)?;
        for cluster_id in cluster_ids {
            datastore.cluster_fetch(*cluster_id).await?;
            datastore
                .cluster_host_fetch(ClusterHostKey::new(*cluster_id, host_id))
                .await?;
        }

        // The host is removed from every cluster it belongs to, whether or
        // not the caller listed it.
        let unlisted =
            uncovered_memberships(datastore, host_id, cluster_ids).await?;
        if !unlisted.is_empty() {
            info!(log, "host belongs to clusters that were not listed";
                "cluster_ids" => ?unlisted,
            );
        }
        for cluster_id in cluster_ids.iter().chain(&unlisted) {
            self.remove_hosts(log, *cluster_id, &[host_id], true, false)
                .await?;
        }
        delete_host_rows(log, datastore, host_id).await?;
        Ok(())
    }

    /// Asks the deployment backend to remove `host_ids` from `cluster_id`
    async fn remove_hosts(
        &self,
        log: &Logger,
        cluster_id: ClusterUuid,
        host_ids: &[HostUuid],
        package_only: bool,
        delete_cluster: bool,
    ) -> Result<(), ActionError> {
        let DeploySnapshot { adapter, cluster, hosts } = DeploySnapshot::gather(
            log,
            &*self.datastore,
            cluster_id,
            host_ids,
        )
        .await?;
        let deployer = self.backend.deployer(adapter, cluster, hosts)?;
        deployer.remove_hosts(package_only, delete_cluster).await?;
        Ok(())
    }
}

fn log_outcome(log: &Logger, result: &Result<(), ActionError>) {
    match result {
        Ok(()) => info!(log, "action completed"),
        Err(error) => warn!(log, "action failed";
            "error" => %error,
            "retryable" => error.retryable(),
        ),
    }
}

#[cfg(test)]
mod test {
    use super::unique;

    #[test]
    fn test_unique_keeps_first_occurrence() {
        assert_eq!(unique(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
        assert!(unique::<u8>(&[]).is_empty());
    }
}
