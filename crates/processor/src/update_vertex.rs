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

//! `updateVertex`: a single-partition property upsert, implemented as a thin consumer of the same
//! base fan-out primitive `addEdgesAtomic` uses, per this expansion's decision on the spec's open
//! question about `updateVertex`'s semantics (no chain-splitting — a vertex lives entirely in one
//! partition).

use graphd_kvstore::PartitionStore;
use graphd_protos::keys;
use graphd_protos::request::UpdateVertexRequest;
use graphd_protos::request::UpdateVertexResponse;
use graphd_protos::result::encoder_fault_to_error_code;
use graphd_protos::result::ErrorCode;
use graphd_protos::result::PartitionResult;

use crate::base::run_fanout;
use crate::catalog::MetaCatalog;

pub async fn update_vertex<S: PartitionStore>(
    store: &S,
    catalog: &dyn MetaCatalog,
    request: UpdateVertexRequest,
) -> UpdateVertexResponse {
    let space = request.space_id;
    let part = request.part_id;

    let Some(schema) = catalog.tag_schema(space, request.tag_id) else {
        return UpdateVertexResponse {
            failures: vec![PartitionResult::new(ErrorCode::TagPropNotFound, part)],
        };
    };

    let row_key = keys::vertex_row_key(&request.vid);
    let existing = match store.get(space, part, row_key.clone()).await {
        Ok(existing) => existing,
        Err(_) => {
            return UpdateVertexResponse {
                failures: vec![PartitionResult::new(ErrorCode::PartNotFound, part)],
            };
        }
    };

    if existing.is_none() && !request.insertable {
        return UpdateVertexResponse {
            failures: vec![PartitionResult::new(ErrorCode::TagPropNotFound, part)],
        };
    }

    let mut merged: Vec<(String, graphd_protos::property::PropValue)> = existing
        .as_deref()
        .and_then(|bytes| graphd_protos::codec::decode_row(&schema, bytes))
        .map(|values| {
            schema
                .columns
                .iter()
                .map(|c| c.name.clone())
                .zip(values)
                .collect()
        })
        .unwrap_or_default();

    for (name, value) in request.updated_props.clone() {
        if let Some(slot) = merged.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            merged.push((name, value));
        }
    }

    let encoded = match graphd_protos::codec::encode_row(&schema, &merged) {
        Ok(bytes) => bytes,
        Err(fault) => {
            return UpdateVertexResponse {
                failures: vec![PartitionResult::new(encoder_fault_to_error_code(fault, false), part)],
            };
        }
    };

    run_fanout(store, space, vec![part], |target_part| {
        let row_key = row_key.clone();
        let encoded = encoded.clone();
        async move { store.multi_put(space, target_part, vec![(row_key, encoded)]).await }
    })
    .await
}

#[cfg(test)]
mod tests {
    use graphd_kvstore::MemoryPartitionStore;
    use graphd_kvstore::PartitionStore;
    use graphd_protos::ids::HostAddr;
    use graphd_protos::ids::PartId;
    use graphd_protos::ids::SchemaId;
    use graphd_protos::ids::SpaceId;
    use graphd_protos::property::ColumnDef;
    use graphd_protos::property::ColumnType;
    use graphd_protos::property::PropValue;
    use graphd_protos::schema::SchemaVersion;

    use super::*;
    use crate::catalog::StaticCatalog;

    fn schema() -> SchemaVersion {
        SchemaVersion {
            schema_id: SchemaId(1),
            version: 1,
            name: "person".to_string(),
            is_edge: false,
            columns: vec![
                ColumnDef::new("name", ColumnType::String, false),
                ColumnDef::new("age", ColumnType::Int, true),
            ],
        }
    }

    #[tokio::test]
    async fn test_upsert_creates_row_when_insertable() {
        let store = MemoryPartitionStore::new();
        let space = SpaceId(1);
        store.add_part(space, PartId(1), vec![HostAddr::new("h", 9000)]).await;
        let catalog = StaticCatalog::new(vec![], vec![schema()], vec![]);

        let request = UpdateVertexRequest {
            space_id: space,
            part_id: PartId(1),
            tag_id: SchemaId(1),
            vid: b"v1".to_vec(),
            updated_props: vec![
                ("name".to_string(), PropValue::String("ann".to_string())),
                ("age".to_string(), PropValue::Int(30)),
            ],
            insertable: true,
        };
        let response = update_vertex(&store, &catalog, request).await;
        assert!(response.is_success());

        let stored = store.get(space, PartId(1), b"v1".to_vec()).await.unwrap().unwrap();
        let values = graphd_protos::codec::decode_row(&schema(), &stored).unwrap();
        assert_eq!(values[1], PropValue::Int(30));
    }

    #[tokio::test]
    async fn test_update_preserves_unchanged_columns() {
        let store = MemoryPartitionStore::new();
        let space = SpaceId(1);
        store.add_part(space, PartId(1), vec![HostAddr::new("h", 9000)]).await;
        let catalog = StaticCatalog::new(vec![], vec![schema()], vec![]);

        let seed = UpdateVertexRequest {
            space_id: space,
            part_id: PartId(1),
            tag_id: SchemaId(1),
            vid: b"v1".to_vec(),
            updated_props: vec![
                ("name".to_string(), PropValue::String("ann".to_string())),
                ("age".to_string(), PropValue::Int(30)),
            ],
            insertable: true,
        };
        update_vertex(&store, &catalog, seed).await;

        let update = UpdateVertexRequest {
            space_id: space,
            part_id: PartId(1),
            tag_id: SchemaId(1),
            vid: b"v1".to_vec(),
            updated_props: vec![("age".to_string(), PropValue::Int(31))],
            insertable: false,
        };
        update_vertex(&store, &catalog, update).await;

        let stored = store.get(space, PartId(1), b"v1".to_vec()).await.unwrap().unwrap();
        let values = graphd_protos::codec::decode_row(&schema(), &stored).unwrap();
        assert_eq!(values[0], PropValue::String("ann".to_string()));
        assert_eq!(values[1], PropValue::Int(31));
    }

    #[tokio::test]
    async fn test_update_missing_row_without_insertable_fails() {
        let store = MemoryPartitionStore::new();
        let space = SpaceId(1);
        store.add_part(space, PartId(1), vec![HostAddr::new("h", 9000)]).await;
        let catalog = StaticCatalog::new(vec![], vec![schema()], vec![]);

        let request = UpdateVertexRequest {
            space_id: space,
            part_id: PartId(1),
            tag_id: SchemaId(1),
            vid: b"missing".to_vec(),
            updated_props: vec![("age".to_string(), PropValue::Int(1))],
            insertable: false,
        };
        let response = update_vertex(&store, &catalog, request).await;
        assert!(!response.is_success());
    }
}
