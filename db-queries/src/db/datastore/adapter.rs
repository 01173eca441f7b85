// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`DataStore`] methods on [`Adapter`]s.

use super::AdapterStore;
use super::DataStore;
use async_trait::async_trait;
use provision_common::typed_uuid::{AdapterUuid, ToUntypedUuid};
use provision_common::{CreateResult, Error, LookupResult, ResourceType};
use provision_db_model::Adapter;

impl DataStore {
    pub fn adapter_insert(&self, adapter: Adapter) -> CreateResult<Adapter> {
        let mut records = self.records.lock().unwrap();
        if records.adapters.contains_key(&adapter.id) {
            return Err(Error::ObjectAlreadyExists {
                type_name: ResourceType::Adapter,
                object_name: adapter.name.clone(),
            });
        }
        records.adapters.insert(adapter.id, adapter.clone());
        Ok(adapter)
    }
}

#[async_trait]
impl AdapterStore for DataStore {
    async fn adapter_fetch(&self, id: AdapterUuid) -> LookupResult<Adapter> {
        let records = self.records.lock().unwrap();
        records.adapters.get(&id).cloned().ok_or_else(|| {
            Error::not_found_by_id(ResourceType::Adapter, &id.to_untyped_uuid())
        })
    }
}
