// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Checks that gate modifications to clusters and hosts
//!
//! A cluster or host may be modified only when all of the following hold:
//!
//! * for a reinstall (an update that raises the reinstall flag, or a
//!   destructive action), no installation is in progress;
//! * for any other edit, the record's reinstall flag is already set;
//! * the requesting principal is an administrator or created the record.
//!
//! The checks come in two call styles, selected by [`OnNotEditable`]:
//! destructive flows want a hard [`Error::NotEditable`], while review flows
//! want `false` back so they can skip the record and carry on.

use crate::db::datastore::{ClusterStore, HostStore};
use provision_common::typed_uuid::{ClusterUuid, HostUuid, UserUuid};
use provision_common::{
    Error, LifecycleState, NotEditableReason, ResourceType, UpdateResult,
};
use provision_db_model::{Cluster, ClusterUpdate, Host, HostUpdate, User};

/// What kind of modification is being attempted
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EditIntent {
    /// an ordinary edit, which requires a pending reinstall request
    Edit,
    /// a reinstall or destructive edit, which must not disturb an
    /// installation in progress
    Reinstall,
}

/// How a failed check is reported
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OnNotEditable {
    /// report [`Error::NotEditable`]
    Fail,
    /// report `Ok(false)`
    ReturnFalse,
}

/// A record whose modification is gated by [`is_editable`]
pub trait Editable {
    const RESOURCE_TYPE: ResourceType;

    fn object_id(&self) -> String;
    fn state(&self) -> LifecycleState;
    fn reinstall_requested(&self) -> bool;
    fn creator_id(&self) -> UserUuid;
}

impl Editable for Cluster {
    const RESOURCE_TYPE: ResourceType = ResourceType::Cluster;

    fn object_id(&self) -> String {
        self.id.to_string()
    }

    fn state(&self) -> LifecycleState {
        self.state
    }

    fn reinstall_requested(&self) -> bool {
        self.reinstall_distributed_system
    }

    fn creator_id(&self) -> UserUuid {
        self.creator_id
    }
}

impl Editable for Host {
    const RESOURCE_TYPE: ResourceType = ResourceType::Host;

    fn object_id(&self) -> String {
        self.id.to_string()
    }

    fn state(&self) -> LifecycleState {
        self.state
    }

    fn reinstall_requested(&self) -> bool {
        self.reinstall_os
    }

    fn creator_id(&self) -> UserUuid {
        self.creator_id
    }
}

/// Evaluates the decision table, returning the first reason that rejects the
/// modification
pub fn check_editable<E: Editable>(
    entity: &E,
    principal: &User,
    intent: EditIntent,
) -> Result<(), NotEditableReason> {
    match intent {
        EditIntent::Reinstall if entity.state().is_installing() => {
            return Err(NotEditableReason::InstallInProgress);
        }
        EditIntent::Edit if !entity.reinstall_requested() => {
            return Err(NotEditableReason::ReinstallNotRequested);
        }
        _ => (),
    }
    if !principal.is_admin && principal.id != entity.creator_id() {
        return Err(NotEditableReason::NotOwner);
    }
    Ok(())
}

/// Returns whether `principal` may modify `entity` in the way described by
/// `intent`
///
/// With [`OnNotEditable::Fail`] this never returns `Ok(false)`.
pub fn is_editable<E: Editable>(
    entity: &E,
    principal: &User,
    intent: EditIntent,
    on_not_editable: OnNotEditable,
) -> Result<bool, Error> {
    match (check_editable(entity, principal, intent), on_not_editable) {
        (Ok(()), _) => Ok(true),
        (Err(_), OnNotEditable::ReturnFalse) => Ok(false),
        (Err(reason), OnNotEditable::Fail) => Err(Error::NotEditable {
            type_name: E::RESOURCE_TYPE,
            object_id: entity.object_id(),
            state: entity.state(),
            reason,
        }),
    }
}

fn intent_for(sets_reinstall: bool) -> EditIntent {
    if sets_reinstall {
        EditIntent::Reinstall
    } else {
        EditIntent::Edit
    }
}

/// Applies `update` to a cluster after checking that `principal` may make
/// it
///
/// An update that raises the reinstall flag is checked as a reinstall;
/// anything else as an ordinary edit.
pub async fn cluster_update_checked<S>(
    datastore: &S,
    id: ClusterUuid,
    principal: &User,
    update: ClusterUpdate,
) -> UpdateResult<Cluster>
where
    S: ClusterStore + ?Sized,
{
    let cluster = datastore.cluster_fetch(id).await?;
    is_editable(
        &cluster,
        principal,
        intent_for(update.sets_reinstall()),
        OnNotEditable::Fail,
    )?;
    datastore.cluster_update(id, update).await
}

/// Applies `update` to a host after checking that `principal` may make it
///
/// See [`cluster_update_checked`].
pub async fn host_update_checked<S>(
    datastore: &S,
    id: HostUuid,
    principal: &User,
    update: HostUpdate,
) -> UpdateResult<Host>
where
    S: HostStore + ?Sized,
{
    let host = datastore.host_fetch(id).await?;
    is_editable(
        &host,
        principal,
        intent_for(update.sets_reinstall()),
        OnNotEditable::Fail,
    )?;
    datastore.host_update(id, update).await
}
