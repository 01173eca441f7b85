// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use provision_common::typed_uuid::UserUuid;
use serde::{Deserialize, Serialize};

/// Database representation of a User
///
/// Users are only read here, to decide whether the principal behind a
/// request may modify a given cluster or host.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct User {
    pub id: UserUuid,
    pub name: String,
    pub is_admin: bool,
}

impl User {
    pub fn new(name: impl Into<String>, is_admin: bool) -> Self {
        Self { id: UserUuid::new_v4(), name: name.into(), is_admin }
    }
}
