// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Loading Chef roles into the Chef server with `knife`

use anyhow::{bail, Context};
use camino::{Utf8Path, Utf8PathBuf};
use slog::{info, warn, Logger};
use std::process::{ExitStatus, Output};
use tokio::process::Command;

/// Where Chef roles are kept unless told otherwise
pub const DEFAULT_ROLES_DIR: &str = "/var/chef/roles";

#[derive(Debug, thiserror::Error)]
pub enum KnifeError {
    #[error("failed to start [{command}]")]
    Start {
        command: String,
        #[source]
        err: std::io::Error,
    },
    #[error("[{command}] failed with {status}: {stderr}")]
    Failed { command: String, status: ExitStatus, stderr: String },
}

fn command_to_string(command: &std::process::Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(|s| s.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

async fn execute(command: &mut Command) -> Result<Output, KnifeError> {
    let output = command.output().await.map_err(|err| KnifeError::Start {
        command: command_to_string(command.as_std()),
        err,
    })?;
    if !output.status.success() {
        return Err(KnifeError::Failed {
            command: command_to_string(command.as_std()),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }
    Ok(output)
}

/// Lists the role files in `roles_dir`, in name order
pub fn role_files(roles_dir: &Utf8Path) -> anyhow::Result<Vec<Utf8PathBuf>> {
    let mut roles = Vec::new();
    let entries = roles_dir
        .read_dir_utf8()
        .with_context(|| format!("reading roles directory {roles_dir}"))?;
    for entry in entries {
        let entry = entry
            .with_context(|| format!("reading roles directory {roles_dir}"))?;
        let file_type = entry
            .file_type()
            .with_context(|| format!("inspecting {}", entry.path()))?;
        if file_type.is_file() {
            roles.push(entry.into_path());
        }
    }
    roles.sort();
    Ok(roles)
}

/// Runs `knife role from file` for every role file in `roles_dir`
///
/// Every role is attempted even if some fail.  Returns the number of roles
/// added.
pub async fn add_roles(
    log: &Logger,
    roles_dir: &Utf8Path,
    knife: &Utf8Path,
) -> anyhow::Result<usize> {
    let roles = role_files(roles_dir)?;
    let mut failed = Vec::new();
    for role in &roles {
        info!(log, "adding role"; "path" => %role);
        let mut command = Command::new(knife);
        command.args(["role", "from", "file"]).arg(role);
        if let Err(error) = execute(&mut command).await {
            warn!(log, "failed to add role";
                "path" => %role,
                "error" => %error,
            );
            failed.push(role.as_str());
        }
    }
    if !failed.is_empty() {
        bail!(
            "failed to add {} of {} roles: {}",
            failed.len(),
            roles.len(),
            failed.join(", ")
        );
    }
    Ok(roles.len())
}

#[cfg(all(test, unix))]
mod test {
    use super::*;
    use camino_tempfile::Utf8TempDir;
    use provision_test_utils::dev::test_setup_log;
    use std::os::unix::fs::PermissionsExt;

    /// Writes a stand-in for `knife` that records its arguments and fails
    /// for any role file whose name contains "bad"
    fn fake_knife(dir: &Utf8Path) -> (Utf8PathBuf, Utf8PathBuf) {
        let record = dir.join("knife.log");
        let knife = dir.join("knife");
        let script = format!(
            "#!/bin/sh\n\
             echo \"$@\" >> {record}\n\
             case \"$4\" in *bad*) echo 'bad role' >&2; exit 1;; esac\n"
        );
        std::fs::write(&knife, script).unwrap();
        std::fs::set_permissions(&knife, std::fs::Permissions::from_mode(0o755))
            .unwrap();
        (knife, record)
    }

    #[tokio::test]
    async fn test_add_roles() {
        let logctx = test_setup_log("test_add_roles");
        let tools = Utf8TempDir::new().unwrap();
        let roles = Utf8TempDir::new().unwrap();
        let (knife, record) = fake_knife(tools.path());

        for name in ["b.json", "a.json"] {
            std::fs::write(roles.path().join(name), "{}").unwrap();
        }
        std::fs::create_dir(roles.path().join("subdir")).unwrap();

        let added =
            add_roles(&logctx.log, roles.path(), &knife).await.unwrap();
        assert_eq!(added, 2);
        let calls = std::fs::read_to_string(&record).unwrap();
        assert_eq!(
            calls,
            format!(
                "role from file {}\nrole from file {}\n",
                roles.path().join("a.json"),
                roles.path().join("b.json"),
            )
        );

        logctx.cleanup_successful();
    }

    #[tokio::test]
    async fn test_add_roles_keeps_going_after_failure() {
        let logctx = test_setup_log("test_add_roles_keeps_going_after_failure");
        let tools = Utf8TempDir::new().unwrap();
        let roles = Utf8TempDir::new().unwrap();
        let (knife, record) = fake_knife(tools.path());

        for name in ["a-bad.json", "b.json"] {
            std::fs::write(roles.path().join(name), "{}").unwrap();
        }

        let error =
            add_roles(&logctx.log, roles.path(), &knife).await.unwrap_err();
        let message = error.to_string();
        assert!(message.starts_with("failed to add 1 of 2 roles: "));
        assert!(message.contains("a-bad.json"));
        let calls = std::fs::read_to_string(&record).unwrap();
        assert_eq!(calls.lines().count(), 2);

        let error = role_files(&roles.path().join("missing")).unwrap_err();
        assert!(error.to_string().starts_with("reading roles directory"));

        logctx.cleanup_successful();
    }
}
