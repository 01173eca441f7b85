// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Run provisioning lifecycle actions from the command line
//!
//! The lifecycle commands load a datastore state file, run one action
//! against it with simulated installers standing in for the provisioning
//! infrastructure, and write the resulting state back out.

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use dropshot::ConfigLogging;
use provision_common::typed_uuid::{ClusterUuid, HostUuid};
use provision_db_queries::db::model::Adapter;
use provision_db_queries::db::DataStore;
use provision_deployment::sim::{SimOsInstaller, SimPackageInstaller};
use provision_deployment::InstallerRegistry;
use provision_lock::InProcessLockManager;
use provision_orchestrator::{ActionError, Config, LockConfig, Orchestrator};
use slog::{info, Logger};
use std::collections::BTreeSet;
use std::sync::Arc;

mod chef;
mod state;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Provisionctl::parse();

    if let Err(error) = args.exec().await {
        eprintln!("error: {:#}", error);
        std::process::exit(1);
    }

    Ok(())
}

/// Run provisioning lifecycle actions from the command line
#[derive(Debug, Parser)]
struct Provisionctl {
    /// log level filter (ignored with --config)
    #[arg(
        env,
        long,
        value_parser = parse_dropshot_log_level,
        default_value = "info",
    )]
    log_level: dropshot::ConfigLoggingLevel,

    /// orchestrator configuration file
    #[arg(long)]
    config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Delete a cluster, removing the given hosts from it
    DeleteCluster {
        #[command(flatten)]
        state: StateArgs,
        /// cluster to delete
        cluster: ClusterUuid,
        /// member hosts to remove
        hosts: Vec<HostUuid>,
        /// delete the hosts themselves too
        #[arg(long)]
        delete_underlying_host: bool,
    },
    /// Remove one host from a cluster
    DeleteClusterHost {
        #[command(flatten)]
        state: StateArgs,
        cluster: ClusterUuid,
        host: HostUuid,
        /// delete the host itself too
        #[arg(long)]
        delete_underlying_host: bool,
    },
    /// Delete a host, removing it from the given clusters first
    DeleteHost {
        #[command(flatten)]
        state: StateArgs,
        host: HostUuid,
        clusters: Vec<ClusterUuid>,
    },
    /// Add every role in a Chef roles directory to the Chef server
    ChefAddRoles {
        /// Chef roles directory
        #[arg(long, default_value = chef::DEFAULT_ROLES_DIR)]
        roles_dir: Utf8PathBuf,
        /// path to `knife`
        #[arg(long, default_value = "knife")]
        knife: Utf8PathBuf,
    },
}

#[derive(Debug, Args)]
struct StateArgs {
    /// datastore state file (JSON)
    #[arg(long)]
    state: Utf8PathBuf,

    /// where to write the resulting state (default: overwrite --state)
    #[arg(long)]
    output: Option<Utf8PathBuf>,

    /// user on whose behalf the action runs
    #[arg(long, default_value = "admin")]
    user: String,

    /// make every simulated installer fail its removals
    #[arg(long)]
    fail_removal: bool,
}

fn parse_dropshot_log_level(
    s: &str,
) -> Result<dropshot::ConfigLoggingLevel, anyhow::Error> {
    serde_json::from_str(&format!("{:?}", s)).context("parsing log level")
}

/// Builds a registry holding a simulated installer for every installer name
/// that `adapters` refer to
fn sim_registry(
    log: &Logger,
    adapters: &[Adapter],
    fail_removal: bool,
) -> anyhow::Result<InstallerRegistry> {
    let mut registry = InstallerRegistry::new(log);
    let os_names: BTreeSet<_> =
        adapters.iter().filter_map(|a| a.os_installer.as_deref()).collect();
    for name in os_names {
        let installer = SimOsInstaller::new(log, name);
        installer.set_fail(fail_removal);
        registry.register_os_installer(Arc::new(installer))?;
    }
    let package_names: BTreeSet<_> = adapters
        .iter()
        .filter_map(|a| a.package_installer.as_deref())
        .collect();
    for name in package_names {
        let installer = SimPackageInstaller::new(log, name);
        installer.set_fail(fail_removal);
        registry.register_package_installer(Arc::new(installer))?;
    }
    Ok(registry)
}

impl Provisionctl {
    async fn exec(self) -> Result<(), anyhow::Error> {
        let config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config {
                log: ConfigLogging::StderrTerminal {
                    level: self.log_level.clone(),
                },
                lock: LockConfig::default(),
            },
        };
        let log = config
            .log
            .to_logger("provisionctl")
            .context("failed to create logger")?;

        match self.command {
            Command::ChefAddRoles { roles_dir, knife } => {
                let added = chef::add_roles(&log, &roles_dir, &knife).await?;
                println!("added {added} roles from {roles_dir}");
                Ok(())
            }
            Command::DeleteCluster {
                state,
                cluster,
                hosts,
                delete_underlying_host,
            } => {
                let action = Action::DeleteCluster {
                    cluster,
                    hosts,
                    delete_underlying_host,
                };
                run_action(&log, &config, &state, action).await
            }
            Command::DeleteClusterHost {
                state,
                cluster,
                host,
                delete_underlying_host,
            } => {
                let action = Action::DeleteClusterHost {
                    cluster,
                    host,
                    delete_underlying_host,
                };
                run_action(&log, &config, &state, action).await
            }
            Command::DeleteHost { state, host, clusters } => {
                let action = Action::DeleteHost { host, clusters };
                run_action(&log, &config, &state, action).await
            }
        }
    }
}

enum Action {
    DeleteCluster {
        cluster: ClusterUuid,
        hosts: Vec<HostUuid>,
        delete_underlying_host: bool,
    },
    DeleteClusterHost {
        cluster: ClusterUuid,
        host: HostUuid,
        delete_underlying_host: bool,
    },
    DeleteHost {
        host: HostUuid,
        clusters: Vec<ClusterUuid>,
    },
}

impl Action {
    async fn run(
        &self,
        orchestrator: &Orchestrator,
        user: &str,
    ) -> Result<(), ActionError> {
        match self {
            Action::DeleteCluster {
                cluster,
                hosts,
                delete_underlying_host,
            } => {
                orchestrator
                    .delete_cluster(
                        *cluster,
                        hosts,
                        user,
                        *delete_underlying_host,
                    )
                    .await
            }
            Action::DeleteClusterHost {
                cluster,
                host,
                delete_underlying_host,
            } => {
                orchestrator
                    .delete_cluster_host(
                        *cluster,
                        *host,
                        user,
                        *delete_underlying_host,
                    )
                    .await
            }
            Action::DeleteHost { host, clusters } => {
                orchestrator.delete_host(*host, clusters, user).await
            }
        }
    }
}

/// Loads the state file, runs `action`, and saves the resulting state
///
/// The state is saved even when the action fails, since a failed action can
/// still have moved records into `ERROR`.
async fn run_action(
    log: &Logger,
    config: &Config,
    args: &StateArgs,
    action: Action,
) -> anyhow::Result<()> {
    let snapshot = state::load(&args.state)?;
    let registry = sim_registry(log, &snapshot.adapters, args.fail_removal)?;
    let datastore = Arc::new(
        DataStore::from_snapshot(log, snapshot)
            .with_context(|| format!("loading {}", args.state))?,
    );
    let orchestrator = Orchestrator::new(
        log,
        datastore.clone(),
        Arc::new(InProcessLockManager::new(log)),
        Arc::new(registry),
        config.lock.clone(),
    );

    let result = action.run(&orchestrator, &args.user).await;

    let output = args.output.as_ref().unwrap_or(&args.state);
    state::save(output, &datastore.snapshot())?;
    info!(log, "saved state"; "path" => %output);

    result?;
    println!("done; state written to {output}");
    Ok(())
}
