// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Provisioning control plane: common facilities
//!
//! This crate holds the pieces that every other crate in the workspace
//! agrees on: the error type that the datastore and the editability guard
//! report, the typed identifiers for clusters, hosts, adapters and users, and
//! the lifecycle state shared by clusters, hosts and cluster memberships.

// We only use rustdoc for internal documentation, including private items, so
// it's expected that we'll have links to private items in the docs.
#![allow(rustdoc::private_intra_doc_links)]

mod error;
pub mod lifecycle;
pub mod typed_uuid;

pub use error::*;
pub use lifecycle::LifecycleState;
