// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reads and writes shared by the lifecycle actions

use provision_common::typed_uuid::{ClusterUuid, HostUuid};
use provision_common::Error;
use provision_db_model::{
    Adapter, Cluster, ClusterHost, ClusterHostFilter, ClusterHostKey, Host,
};
use provision_db_queries::db::EntityStore;
use provision_deployment::{AdapterInfo, ClusterInfo, HostInfo};
use slog::{debug, info, Logger};

fn adapter_info(adapter: Adapter) -> AdapterInfo {
    AdapterInfo {
        id: adapter.id,
        name: adapter.name,
        distributed_system_name: adapter.distributed_system_name,
        os_installer: adapter.os_installer,
        package_installer: adapter.package_installer,
    }
}

fn cluster_info(cluster: Cluster) -> ClusterInfo {
    ClusterInfo {
        id: cluster.id,
        name: cluster.name,
        adapter_id: cluster.adapter_id,
        creator_id: cluster.creator_id,
        state: cluster.state,
        os_config: cluster.os_config,
        package_config: cluster.package_config,
    }
}

fn host_info(host: Host, membership: ClusterHost) -> HostInfo {
    HostInfo {
        id: host.id,
        name: host.name,
        mac: host.mac,
        state: host.state,
        reinstall_os: host.reinstall_os,
        os_config: host.os_config,
        package_config: membership.package_config,
        deployed_package_config: membership.deployed_package_config,
    }
}

/// What a deployment backend is told about one cluster and some of its hosts
#[derive(Debug)]
pub struct DeploySnapshot {
    pub adapter: AdapterInfo,
    pub cluster: ClusterInfo,
    pub hosts: Vec<HostInfo>,
}

impl DeploySnapshot {
    /// Reads the cluster, its adapter, and each listed host together with
    /// its membership in the cluster
    pub async fn gather(
        log: &Logger,
        datastore: &dyn EntityStore,
        cluster_id: ClusterUuid,
        host_ids: &[HostUuid],
    ) -> Result<DeploySnapshot, Error> {
        let cluster = datastore.cluster_fetch(cluster_id).await?;
        let adapter = datastore.adapter_fetch(cluster.adapter_id).await?;
        let mut hosts = Vec::with_capacity(host_ids.len());
        for host_id in host_ids {
            let host = datastore.host_fetch(*host_id).await?;
            let membership = datastore
                .cluster_host_fetch(ClusterHostKey::new(cluster_id, *host_id))
                .await?;
            hosts.push(host_info(host, membership));
        }
        let snapshot = DeploySnapshot {
            adapter: adapter_info(adapter),
            cluster: cluster_info(cluster),
            hosts,
        };
        let adapter_json = serde_json::to_string(&snapshot.adapter)?;
        let cluster_json = serde_json::to_string(&snapshot.cluster)?;
        let hosts_json = serde_json::to_string(&snapshot.hosts)?;
        debug!(log, "gathered deployment snapshot";
            "adapter_info" => adapter_json,
            "cluster_info" => cluster_json,
            "hosts_info" => hosts_json,
        );
        Ok(snapshot)
    }
}

/// Returns the clusters `host_id` belongs to that are not in `covered`, in
/// cluster id order
pub async fn uncovered_memberships(
    datastore: &dyn EntityStore,
    host_id: HostUuid,
    covered: &[ClusterUuid],
) -> Result<Vec<ClusterUuid>, Error> {
    let memberships =
        datastore.cluster_host_list(ClusterHostFilter::host(host_id)).await?;
    Ok(memberships
        .into_iter()
        .map(|membership| membership.cluster_id)
        .filter(|cluster_id| !covered.contains(cluster_id))
        .collect())
}

/// Rejects deleting `host_id` along with its membership in `cluster_id`
/// while it still belongs to other clusters
///
/// Those memberships can only go once the deployment backend has removed
/// the host from each of those clusters, which is `delete_host`'s job.
pub async fn check_sole_membership(
    datastore: &dyn EntityStore,
    cluster_id: ClusterUuid,
    host_id: HostUuid,
) -> Result<(), Error> {
    let others =
        uncovered_memberships(datastore, host_id, &[cluster_id]).await?;
    if others.is_empty() {
        return Ok(());
    }
    let others: Vec<_> = others.iter().map(|id| id.to_string()).collect();
    Err(Error::invalid_request(&format!(
        "host {} also belongs to cluster(s) {}; remove it from those \
         first or delete the host itself",
        host_id,
        others.join(", ")
    )))
}

/// Deletes a host, first dropping every membership that still refers to it
///
/// Callers must already have had the deployment backend remove the host
/// from every cluster those memberships name.
pub async fn delete_host_rows(
    log: &Logger,
    datastore: &dyn EntityStore,
    host_id: HostUuid,
) -> Result<(), Error> {
    let memberships =
        datastore.cluster_host_list(ClusterHostFilter::host(host_id)).await?;
    for membership in memberships {
        datastore.cluster_host_delete(membership.key()).await?;
    }
    datastore.host_delete(host_id).await?;
    info!(log, "deleted host"; "host_id" => %host_id);
    Ok(())
}

/// Final row removal after the deployment backend has removed `host_ids`
/// from `cluster_id`
///
/// The memberships of the listed hosts are dropped.  With
/// `delete_underlying_host` the hosts themselves go too (see
/// [`check_sole_membership`]); otherwise they survive, detached from this
/// cluster.  The cluster is deleted once no memberships
/// refer to it.
pub async fn delete_cluster_rows(
    log: &Logger,
    datastore: &dyn EntityStore,
    cluster_id: ClusterUuid,
    host_ids: &[HostUuid],
    delete_underlying_host: bool,
) -> Result<(), Error> {
    for host_id in host_ids {
        datastore
            .cluster_host_delete(ClusterHostKey::new(cluster_id, *host_id))
            .await?;
        if delete_underlying_host {
            delete_host_rows(log, datastore, *host_id).await?;
        }
    }

    let remaining = datastore
        .cluster_host_list(ClusterHostFilter::cluster(cluster_id))
        .await?;
    if remaining.is_empty() {
        datastore.cluster_delete(cluster_id).await?;
        info!(log, "deleted cluster"; "cluster_id" => %cluster_id);
    } else {
        info!(log, "keeping cluster that still has members";
            "cluster_id" => %cluster_id,
            "nremaining" => remaining.len(),
        );
    }
    Ok(())
}
