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

use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

use crate::filter::Expr;
use crate::ids::HostAddr;
use crate::ids::IndexId;
use crate::ids::PartId;
use crate::ids::SchemaId;
use crate::ids::SpaceId;
use crate::property::ColumnDef;
use crate::property::PropValue;
use crate::result::ExecResponse;
use crate::result::PartitionResult;
use crate::schema::IndexItem;

/// The reserved space holding meta state: schemas, indexes, hosts, users, and the cluster id.
/// Exactly one partition, `META_PART_ID`, lives in it.
pub const META_SPACE_ID: SpaceId = SpaceId(0);
pub const META_PART_ID: PartId = PartId(0);

/// Reserved key under which the cluster id is persisted. Once written, never rewritten.
pub const CLUSTER_ID_KEY: &str = "__meta_cluster_id_key__";

/// Fixed meta key prefixes.
pub const SPACES_PREFIX: &str = "__spaces__";
pub const TAGS_PREFIX: &str = "__tags__";
pub const EDGES_PREFIX: &str = "__edges__";
pub const INDEXES_PREFIX: &str = "__indexes__";
pub const HOSTS_PREFIX: &str = "__hosts__";
pub const USERS_PREFIX: &str = "__users__";

// ---------------------------------------------------------------------------------------------
// Lookup planner wire types
// ---------------------------------------------------------------------------------------------

/// A bound on one indexed column within an [`IndexQueryContext`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnHint {
    Equal {
        column: String,
        value: PropValue,
    },
    Range {
        column: String,
        begin: PropValue,
        end: PropValue,
    },
    In {
        column: String,
        values: Vec<PropValue>,
    },
}

impl ColumnHint {
    pub fn column(&self) -> &str {
        match self {
            ColumnHint::Equal { column, .. } => column,
            ColumnHint::Range { column, .. } => column,
            ColumnHint::In { column, .. } => column,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexQueryContext {
    pub index_id: IndexId,
    pub hints: Vec<ColumnHint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexQuerySet {
    pub is_edge: bool,
    pub tag_or_edge_id: SchemaId,
    pub contexts: Vec<IndexQueryContext>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupIndexRequest {
    pub space_id: SpaceId,
    pub indices: IndexQuerySet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_columns: Option<Vec<String>>,
}

/// A single row produced by the lookup planner's terminal aggregate node. Column order is fixed
/// by the planner: for edges `_src, _ranking, _dst, <yield...>`, for vertices `_vid, <yield...>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub columns: Vec<PropValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupIndexResponse {
    pub column_names: Vec<String>,
    pub rows: Vec<ResultRow>,
    pub failures: Vec<PartitionResult>,
}

// ---------------------------------------------------------------------------------------------
// Atomic edge writer wire types
// ---------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    pub src_vid: Vec<u8>,
    /// Positive: out-edge, owned by `src_vid`'s partition. Negative: in-edge, owned by
    /// `dst_vid`'s partition.
    pub edge_type: i32,
    pub rank: i64,
    pub dst_vid: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEdge {
    pub key: EdgeKey,
    pub props: Vec<PropValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddEdgesRequest {
    pub space_id: SpaceId,
    pub prop_names: Vec<String>,
    pub parts: HashMap<PartId, Vec<NewEdge>>,
    /// When `true`, an edge already present at the same key is overwritten rather than rejected.
    #[serde(default)]
    pub if_not_exists: bool,
}

pub type AddEdgesResponse = ExecResponse;

// ---------------------------------------------------------------------------------------------
// updateVertex
// ---------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateVertexRequest {
    pub space_id: SpaceId,
    pub part_id: PartId,
    pub tag_id: SchemaId,
    pub vid: Vec<u8>,
    pub updated_props: Vec<(String, PropValue)>,
    /// When `true`, creates the row if absent instead of failing with a not-found error.
    #[serde(default)]
    pub insertable: bool,
}

pub type UpdateVertexResponse = ExecResponse;

// ---------------------------------------------------------------------------------------------
// Meta CRUD wire types
// ---------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceDesc {
    pub space_id: SpaceId,
    pub name: String,
    pub part_count: u32,
    pub replica_factor: u32,
    /// Fixed vertex-id byte length for this space, resolved once by the atomic edge writer
    /// and by `hashToPart` routing.
    pub vid_len: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSpaceRequest {
    pub name: String,
    pub part_count: u32,
    pub replica_factor: u32,
    pub vid_len: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSpaceResponse {
    pub space_id: SpaceId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropSpaceRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListSpacesResponse {
    pub spaces: Vec<SpaceDesc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTagRequest {
    pub space_id: SpaceId,
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateEdgeTypeRequest {
    pub space_id: SpaceId,
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlterTagRequest {
    pub space_id: SpaceId,
    pub tag_id: SchemaId,
    pub add_columns: Vec<ColumnDef>,
    pub drop_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateIndexRequest {
    pub space_id: SpaceId,
    pub schema_id: SchemaId,
    pub is_edge: bool,
    pub name: String,
    pub field_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateIndexResponse {
    pub index_id: IndexId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropIndexRequest {
    pub space_id: SpaceId,
    pub index_id: IndexId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListIndexesResponse {
    pub indexes: Vec<IndexItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostRecord {
    pub addr: HostAddr,
    /// Milliseconds-since-epoch of the last heartbeat the storage daemon wrote. The sweep that
    /// evicts stale hosts is out of scope; only the record shape and accessors are in scope.
    pub last_heartbeat_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterHostRequest {
    pub addr: HostAddr,
    pub heartbeat_ms: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListHostsResponse {
    pub hosts: Vec<HostRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    /// Already-hashed credential; this crate never sees or handles plaintext passwords.
    pub password_hash: String,
    pub is_root: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListUsersResponse {
    pub users: Vec<UserRecord>,
}
