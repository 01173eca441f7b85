// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Checks that concurrent lifecycle actions never interleave their writes

use async_trait::async_trait;
use futures::future::join_all;
use provision_common::typed_uuid::ClusterUuid;
use provision_common::LifecycleState;
use provision_db_queries::db::datastore::pub_test_utils::{
    create_test_cluster, datastore_test, TEST_OS_INSTALLER,
    TEST_PACKAGE_INSTALLER,
};
use provision_db_queries::db::datastore::StoreSnapshot;
use provision_db_queries::db::DataStore;
use provision_deployment::sim::SimOsInstaller;
use provision_deployment::{
    InstallerRegistry, PackageInstaller, RemovalContext,
};
use provision_lock::InProcessLockManager;
use provision_orchestrator::{LockConfig, Orchestrator};
use provision_test_utils::dev::test_setup_log;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the deployment backend saw while one removal was underway
struct Observation {
    cluster_id: ClusterUuid,
    concurrent: usize,
    store: StoreSnapshot,
}

/// A package installer that looks at the datastore each time it's asked to
/// remove hosts, and takes its time about answering
struct ObservingInstaller {
    datastore: Arc<DataStore>,
    active: AtomicUsize,
    observations: Mutex<Vec<Observation>>,
}

#[async_trait]
impl PackageInstaller for ObservingInstaller {
    fn name(&self) -> &str {
        TEST_PACKAGE_INSTALLER
    }

    async fn delete_hosts(
        &self,
        cx: &RemovalContext<'_>,
        _delete_cluster: bool,
    ) -> anyhow::Result<()> {
        let concurrent = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.observations.lock().unwrap().push(Observation {
            cluster_id: cx.cluster.id,
            concurrent,
            store: self.datastore.snapshot(),
        });
        tokio::time::sleep(Duration::from_millis(25)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_actions_never_interleave() {
    let logctx = test_setup_log("test_actions_never_interleave");
    let log = &logctx.log;
    let (datastore, users) = datastore_test(log);

    let installer = Arc::new(ObservingInstaller {
        datastore: datastore.clone(),
        active: AtomicUsize::new(0),
        observations: Mutex::new(Vec::new()),
    });
    let mut registry = InstallerRegistry::new(log);
    registry
        .register_os_installer(Arc::new(SimOsInstaller::new(
            log,
            TEST_OS_INSTALLER,
        )))
        .unwrap();
    registry.register_package_installer(installer.clone()).unwrap();
    let orchestrator = Orchestrator::new(
        log,
        datastore.clone(),
        Arc::new(InProcessLockManager::new(log)),
        Arc::new(registry),
        LockConfig::default(),
    );

    let clusters: Vec<_> = (0..4)
        .map(|i| {
            create_test_cluster(&datastore, &format!("c{i}"), 2, &users.owner)
        })
        .collect();
    let results = join_all(clusters.iter().map(|fixture| {
        let host_ids: Vec<_> = fixture.hosts.iter().map(|h| h.id).collect();
        let orchestrator = &orchestrator;
        async move {
            orchestrator
                .delete_cluster(fixture.cluster.id, &host_ids, "owner", false)
                .await
        }
    }))
    .await;
    for result in results {
        result.unwrap();
    }
    assert!(datastore.snapshot().clusters.is_empty());

    // While any one action was talking to the backend, every other cluster
    // was either untouched or already completely gone.
    let observations = installer.observations.lock().unwrap();
    assert_eq!(observations.len(), clusters.len());
    for observation in observations.iter() {
        assert_eq!(observation.concurrent, 1);
        for cluster in &observation.store.clusters {
            let expected = if cluster.id == observation.cluster_id {
                LifecycleState::Error
            } else {
                LifecycleState::Uninitialized
            };
            assert_eq!(cluster.state, expected, "cluster {}", cluster.name);
        }
        for membership in &observation.store.cluster_hosts {
            if membership.cluster_id == observation.cluster_id {
                assert_eq!(membership.state, LifecycleState::Error);
                continue;
            }
            assert_eq!(membership.state, LifecycleState::Uninitialized);
            let host = observation
                .store
                .hosts
                .iter()
                .find(|h| h.id == membership.host_id)
                .unwrap();
            assert_eq!(host.state, LifecycleState::Uninitialized);
        }
    }

    logctx.cleanup_successful();
}
