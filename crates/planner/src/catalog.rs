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

//! The schema/index lookup seam the planner needs from the meta service, kept as a trait so this
//! crate never depends on `graphd-meta` (which in turn depends on the planner's sibling,
//! `graphd-processor`, for its own writes — a direct dependency would cycle).

use graphd_protos::ids::IndexId;
use graphd_protos::ids::SchemaId;
use graphd_protos::ids::SpaceId;
use graphd_protos::schema::IndexItem;
use graphd_protos::schema::SchemaVersion;

pub trait SchemaCatalog: Send + Sync {
    fn schema_version(
        &self,
        space: SpaceId,
        schema_id: SchemaId,
        is_edge: bool,
    ) -> Option<SchemaVersion>;

    fn find_index(
        &self,
        space: SpaceId,
        is_edge: bool,
        schema_id: SchemaId,
        index_id: IndexId,
    ) -> Option<IndexItem>;
}

/// A fixed-table catalog, useful for tests and for any caller that already has the schema and
/// index definitions in hand.
#[derive(Debug, Default, Clone)]
pub struct StaticCatalog {
    pub schemas: Vec<SchemaVersion>,
    pub indexes: Vec<IndexItem>,
}

impl StaticCatalog {
    pub fn new(schemas: Vec<SchemaVersion>, indexes: Vec<IndexItem>) -> Self {
        Self { schemas, indexes }
    }
}

impl SchemaCatalog for StaticCatalog {
    fn schema_version(
        &self,
        _space: SpaceId,
        schema_id: SchemaId,
        is_edge: bool,
    ) -> Option<SchemaVersion> {
        self.schemas
            .iter()
            .filter(|s| s.schema_id == schema_id && s.is_edge == is_edge)
            .max_by_key(|s| s.version)
            .cloned()
    }

    fn find_index(
        &self,
        _space: SpaceId,
        is_edge: bool,
        schema_id: SchemaId,
        index_id: IndexId,
    ) -> Option<IndexItem> {
        self.indexes
            .iter()
            .find(|i| i.index_id == index_id && i.schema_id == schema_id && i.is_edge == is_edge)
            .cloned()
    }
}
