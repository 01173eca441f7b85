// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Errors reported by lifecycle actions

use provision_common::Error;
use provision_deployment::DeployError;
use std::time::Duration;
use thiserror::Error;

/// Why a lifecycle action failed
///
/// Nothing has been modified when an action fails with
/// [`ActionError::LockNotAcquired`], [`ActionError::NotEditable`],
/// [`ActionError::NotFound`], or an [`ActionError::InvalidRequest`] raised
/// before the first write.  After [`ActionError::DeploymentBackend`],
/// the targeted records are left in `ERROR` with their reinstall flags set,
/// and repeating the same action retries the removal.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("failed to acquire lock {name:?} within {timeout:?}")]
    LockNotAcquired { name: String, timeout: Duration },

    #[error(transparent)]
    NotEditable(Error),

    #[error(transparent)]
    NotFound(Error),

    #[error(transparent)]
    InvalidRequest(Error),

    #[error("deployment backend failed")]
    DeploymentBackend(#[source] DeployError),

    #[error("internal error")]
    Internal(#[source] Error),
}

impl ActionError {
    /// Returns whether repeating the action could succeed without anything
    /// else changing first
    pub fn retryable(&self) -> bool {
        match self {
            ActionError::LockNotAcquired { .. } => true,
            ActionError::DeploymentBackend(DeployError::RemoveHosts {
                ..
            }) => true,
            ActionError::DeploymentBackend(DeployError::Registry(_)) => false,
            ActionError::NotEditable(_)
            | ActionError::NotFound(_)
            | ActionError::InvalidRequest(_)
            | ActionError::Internal(_) => false,
        }
    }
}

impl From<Error> for ActionError {
    fn from(error: Error) -> Self {
        match error {
            Error::ObjectNotFound { .. } => ActionError::NotFound(error),
            Error::NotEditable { .. } => ActionError::NotEditable(error),
            Error::InvalidRequest { .. } => ActionError::InvalidRequest(error),
            Error::ObjectAlreadyExists { .. } | Error::InternalError { .. } => {
                ActionError::Internal(error)
            }
        }
    }
}

impl From<DeployError> for ActionError {
    fn from(error: DeployError) -> Self {
        ActionError::DeploymentBackend(error)
    }
}
