// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`DataStore`] methods on [`User`]s.

use super::DataStore;
use super::UserLookup;
use async_trait::async_trait;
use provision_common::{CreateResult, Error, LookupResult, ResourceType};
use provision_db_model::User;

impl DataStore {
    /// Stores a new user.  User names are unique.
    pub fn user_insert(&self, user: User) -> CreateResult<User> {
        let mut records = self.records.lock().unwrap();
        if records.users.contains_key(&user.id)
            || records.users.values().any(|u| u.name == user.name)
        {
            return Err(Error::ObjectAlreadyExists {
                type_name: ResourceType::User,
                object_name: user.name.clone(),
            });
        }
        records.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl UserLookup for DataStore {
    async fn user_fetch_by_name(&self, name: &str) -> LookupResult<User> {
        let records = self.records.lock().unwrap();
        records
            .users
            .values()
            .find(|user| user.name == name)
            .cloned()
            .ok_or_else(|| Error::not_found_by_name(ResourceType::User, name))
    }
}
