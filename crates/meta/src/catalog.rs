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

//! Builds a point-in-time [`CatalogSnapshot`] by scanning the meta partition once, feeding the
//! same scan into both `graphd_processor::StaticCatalog` (consulted by the atomic edge writer and
//! `updateVertex`) and `graphd_planner::StaticCatalog` (consulted by the lookup planner). Neither
//! sibling crate depends on this one directly — see the comments on their own `MetaCatalog`/
//! `SchemaCatalog` traits — so this is the one place that wires meta state into both.

use error_stack::Result;
use graphd_kvstore::PartitionStore;

use crate::error::MetaError;
use crate::service;

#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub processor: graphd_processor::StaticCatalog,
    pub planner: graphd_planner::StaticCatalog,
}

pub async fn load_catalog_snapshot<S: PartitionStore>(store: &S) -> Result<CatalogSnapshot, MetaError> {
    let spaces = service::list_spaces(store).await?.spaces;

    let mut vid_lens = Vec::new();
    let mut schemas = Vec::new();
    let mut indexes = Vec::new();

    for space in &spaces {
        vid_lens.push((space.space_id, space.vid_len));
        schemas.extend(service::list_tags(store, space.space_id).await?);
        schemas.extend(service::list_edge_types(store, space.space_id).await?);
        indexes.extend(service::list_indexes(store, space.space_id).await?.indexes);
    }

    Ok(CatalogSnapshot {
        processor: graphd_processor::StaticCatalog::new(vid_lens, schemas.clone(), indexes.clone()),
        planner: graphd_planner::StaticCatalog::new(schemas, indexes),
    })
}

#[cfg(test)]
mod tests {
    use graphd_kvstore::MemoryPartitionStore;
    use graphd_processor::MetaCatalog;
    use graphd_protos::ids::HostAddr;
    use graphd_protos::property::ColumnDef;
    use graphd_protos::property::ColumnType;
    use graphd_protos::request::CreateSpaceRequest;
    use graphd_protos::request::CreateTagRequest;
    use graphd_protos::request::META_PART_ID;
    use graphd_protos::request::META_SPACE_ID;

    use super::*;

    #[tokio::test]
    async fn test_snapshot_reflects_created_space_and_tag() {
        let store = MemoryPartitionStore::new();
        store.add_part(META_SPACE_ID, META_PART_ID, vec![HostAddr::new("h", 9000)]).await;

        let space = service::create_space(
            &store,
            CreateSpaceRequest {
                name: "social".to_string(),
                part_count: 4,
                replica_factor: 1,
                vid_len: 8,
            },
        )
        .await
        .unwrap();

        service::create_tag(
            &store,
            CreateTagRequest {
                space_id: space.space_id,
                name: "person".to_string(),
                columns: vec![ColumnDef::new("name", ColumnType::String, false)],
            },
        )
        .await
        .unwrap();

        let snapshot = load_catalog_snapshot(&store).await.unwrap();
        assert_eq!(snapshot.processor.vid_len(space.space_id), Some(8));
        // the allocator hands out schema id 1 to the first tag created in a fresh store.
        assert!(snapshot
            .processor
            .tag_schema(space.space_id, graphd_protos::ids::SchemaId(1))
            .is_some());
    }
}
