// Copyright 2024 tison <wander4096@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The meta service: schemas, indexes, hosts, and users, all persisted as records in
//! the reserved meta partition of the replicated KV store every other part of the cluster already
//! speaks to. This crate owns the CRUD surface over that state and the catalog snapshot the
//! storage daemon's write and read paths consult.

mod catalog;
mod error;
mod keys;
mod service;

pub use catalog::load_catalog_snapshot;
pub use catalog::CatalogSnapshot;
pub use error::MetaError;
pub use service::alter_tag;
pub use service::bootstrap_root_user;
pub use service::create_edge_index;
pub use service::create_edge_type;
pub use service::create_space;
pub use service::create_tag;
pub use service::create_tag_index;
pub use service::create_user;
pub use service::drop_index;
pub use service::drop_space;
pub use service::get_space;
pub use service::get_user;
pub use service::list_edge_types;
pub use service::list_hosts;
pub use service::list_indexes;
pub use service::list_spaces;
pub use service::list_tags;
pub use service::list_users;
pub use service::register_host;
pub use service::upgrade_meta_v1_to_v2;
