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

//! Key construction for the meta partition: every schema, index, host, and user
//! record lives under one of the fixed prefixes in `graphd_protos::request`, keyed so a prefix
//! scan enumerates one kind of object and a direct `get` resolves one object by its natural name
//! or by its allocated id.

use graphd_protos::ids::IndexId;
use graphd_protos::ids::SchemaId;
use graphd_protos::ids::SpaceId;
use graphd_protos::request::EDGES_PREFIX;
use graphd_protos::request::HOSTS_PREFIX;
use graphd_protos::request::INDEXES_PREFIX;
use graphd_protos::request::SPACES_PREFIX;
use graphd_protos::request::TAGS_PREFIX;
use graphd_protos::request::USERS_PREFIX;

pub const NEXT_SPACE_ID_KEY: &str = "__next_space_id__";
pub const NEXT_SCHEMA_ID_KEY: &str = "__next_schema_id__";
pub const NEXT_INDEX_ID_KEY: &str = "__next_index_id__";

pub fn spaces_by_name_prefix() -> Vec<u8> {
    format!("{SPACES_PREFIX}name/").into_bytes()
}

pub fn spaces_by_id_prefix() -> Vec<u8> {
    format!("{SPACES_PREFIX}id/").into_bytes()
}

pub fn space_by_name_key(name: &str) -> Vec<u8> {
    format!("{SPACES_PREFIX}name/{name}").into_bytes()
}

pub fn space_by_id_key(space_id: SpaceId) -> Vec<u8> {
    format!("{SPACES_PREFIX}id/{}", space_id.0).into_bytes()
}

pub fn tags_by_id_prefix(space_id: SpaceId) -> Vec<u8> {
    format!("{TAGS_PREFIX}{}/id/", space_id.0).into_bytes()
}

pub fn tag_by_name_key(space_id: SpaceId, name: &str) -> Vec<u8> {
    format!("{TAGS_PREFIX}{}/name/{name}", space_id.0).into_bytes()
}

pub fn tag_by_id_key(space_id: SpaceId, tag_id: SchemaId) -> Vec<u8> {
    format!("{TAGS_PREFIX}{}/id/{}", space_id.0, tag_id.0).into_bytes()
}

pub fn edges_by_id_prefix(space_id: SpaceId) -> Vec<u8> {
    format!("{EDGES_PREFIX}{}/id/", space_id.0).into_bytes()
}

pub fn edge_by_name_key(space_id: SpaceId, name: &str) -> Vec<u8> {
    format!("{EDGES_PREFIX}{}/name/{name}", space_id.0).into_bytes()
}

pub fn edge_by_id_key(space_id: SpaceId, edge_id: SchemaId) -> Vec<u8> {
    format!("{EDGES_PREFIX}{}/id/{}", space_id.0, edge_id.0).into_bytes()
}

pub fn indexes_prefix(space_id: SpaceId) -> Vec<u8> {
    format!("{INDEXES_PREFIX}{}/", space_id.0).into_bytes()
}

pub fn index_by_id_key(space_id: SpaceId, index_id: IndexId) -> Vec<u8> {
    format!("{INDEXES_PREFIX}{}/{}", space_id.0, index_id.0).into_bytes()
}

pub fn hosts_prefix() -> Vec<u8> {
    format!("{HOSTS_PREFIX}").into_bytes()
}

pub fn host_key(host: &str, port: u16) -> Vec<u8> {
    format!("{HOSTS_PREFIX}{host}:{port}").into_bytes()
}

pub fn users_prefix() -> Vec<u8> {
    format!("{USERS_PREFIX}").into_bytes()
}

pub fn user_key(username: &str) -> Vec<u8> {
    format!("{USERS_PREFIX}{username}").into_bytes()
}
