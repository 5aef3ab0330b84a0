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

//! The schema/space seam the atomic edge writer and `updateVertex` need from the meta service,
//! kept as a trait for the same reason as `graphd_planner::SchemaCatalog`: this crate must not
//! depend on `graphd-meta` directly.

use graphd_protos::ids::SchemaId;
use graphd_protos::ids::SpaceId;
use graphd_protos::schema::IndexItem;
use graphd_protos::schema::SchemaVersion;

pub trait MetaCatalog: Send + Sync {
    /// The fixed vertex-id byte length configured for `space`, `None` if the space is unknown.
    fn vid_len(&self, space: SpaceId) -> Option<u32>;

    fn edge_schema(&self, space: SpaceId, edge_type: SchemaId) -> Option<SchemaVersion>;

    fn tag_schema(&self, space: SpaceId, tag_id: SchemaId) -> Option<SchemaVersion>;

    /// Secondary indexes defined over `edge_type`, consulted so the atomic edge writer can also
    /// maintain index entries in the same chain commit.
    fn indexes_for_edge(&self, space: SpaceId, edge_type: SchemaId) -> Vec<IndexItem>;
}

#[derive(Debug, Default, Clone)]
pub struct StaticCatalog {
    pub vid_lens: Vec<(SpaceId, u32)>,
    pub schemas: Vec<SchemaVersion>,
    pub indexes: Vec<IndexItem>,
}

impl StaticCatalog {
    pub fn new(vid_lens: Vec<(SpaceId, u32)>, schemas: Vec<SchemaVersion>, indexes: Vec<IndexItem>) -> Self {
        Self {
            vid_lens,
            schemas,
            indexes,
        }
    }
}

impl MetaCatalog for StaticCatalog {
    fn vid_len(&self, space: SpaceId) -> Option<u32> {
        self.vid_lens.iter().find(|(s, _)| *s == space).map(|(_, len)| *len)
    }

    fn edge_schema(&self, _space: SpaceId, edge_type: SchemaId) -> Option<SchemaVersion> {
        self.schemas
            .iter()
            .filter(|s| s.is_edge && s.schema_id == edge_type)
            .max_by_key(|s| s.version)
            .cloned()
    }

    fn tag_schema(&self, _space: SpaceId, tag_id: SchemaId) -> Option<SchemaVersion> {
        self.schemas
            .iter()
            .filter(|s| !s.is_edge && s.schema_id == tag_id)
            .max_by_key(|s| s.version)
            .cloned()
    }

    fn indexes_for_edge(&self, _space: SpaceId, edge_type: SchemaId) -> Vec<IndexItem> {
        self.indexes
            .iter()
            .filter(|i| i.is_edge && i.schema_id == edge_type)
            .cloned()
            .collect()
    }
}
