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

//! `addEdgesAtomic`: resolves the space's vid length, routes each edge to its remote
//! partition, encodes rows, groups by chain, and commits every chain through a
//! [`TransactionManager`] before reporting back.

use std::collections::HashMap;

use graphd_kvstore::PartitionManager;
use graphd_kvstore::PartitionStore;
use graphd_protos::ids::PartId;
use graphd_protos::ids::SchemaId;
use graphd_protos::ids::SpaceId;
use graphd_protos::keys;
use graphd_protos::request::AddEdgesRequest;
use graphd_protos::request::AddEdgesResponse;
use graphd_protos::result::encoder_fault_to_error_code;
use graphd_protos::result::ErrorCode;
use graphd_protos::result::PartitionResult;
use graphd_protos::result::ResultCode;

use self::keycodec_bridge::encode_edge_index_entries;
use crate::catalog::MetaCatalog;
use crate::txn::Chain;
use crate::txn::TransactionManager;

fn all_failed(parts: impl Iterator<Item = PartId>, code: ErrorCode) -> AddEdgesResponse {
    AddEdgesResponse {
        failures: parts.map(|p| PartitionResult::new(code, p)).collect(),
    }
}

/// Runs the atomic edge writer against `request`. `manager` supplies each space's partition
/// count (for `hashToPart`); `catalog` supplies vid length, edge schema, and secondary indexes;
/// `txn` commits each `(local_part, remote_part)` chain.
pub async fn add_edges_atomic<S, T>(
    store: &S,
    manager: &PartitionManager,
    catalog: &dyn MetaCatalog,
    txn: &T,
    request: AddEdgesRequest,
) -> AddEdgesResponse
where
    S: PartitionStore,
    T: TransactionManager,
{
    let space = request.space_id;
    let local_parts = || request.parts.keys().copied();

    // Step 1: resolve the space's vertex-id length once.
    let Some(_vid_len) = catalog.vid_len(space) else {
        return all_failed(local_parts(), ErrorCode::InvalidSpaceVidLen);
    };

    let part_count = manager.parts(space).await.len() as u32;

    // Step 2: resolve each edge's remote partition; abort entirely (no writes) on any failure.
    let mut routed: HashMap<PartId, Vec<(PartId, graphd_protos::request::NewEdge)>> = HashMap::new();
    for (local_part, edges) in &request.parts {
        for edge in edges {
            let Some(remote_part) = crate::hash::hash_to_part(&edge.key.dst_vid, part_count) else {
                return all_failed(local_parts(), ErrorCode::SpaceNotFound);
            };
            routed
                .entry(*local_part)
                .or_default()
                .push((remote_part, edge.clone()));
        }
    }

    // Step 3: encode every edge's row against its edge type's schema.
    let mut chain_kvs: HashMap<Chain, (Vec<(Vec<u8>, Vec<u8>)>, Vec<(Vec<u8>, Vec<u8>)>)> = HashMap::new();
    let mut chain_index_kvs: HashMap<Chain, Vec<(Vec<u8>, Vec<u8>)>> = HashMap::new();
    for (local_part, edges) in &routed {
        for (remote_part, edge) in edges {
            let edge_type = SchemaId(edge.key.edge_type.abs());
            let Some(schema) = catalog.edge_schema(space, edge_type) else {
                return all_failed(local_parts(), ErrorCode::EdgePropNotFound);
            };
            let props: Vec<(String, graphd_protos::property::PropValue)> = request
                .prop_names
                .iter()
                .cloned()
                .zip(edge.props.iter().cloned())
                .collect();

            let row = match graphd_protos::codec::encode_row(&schema, &props) {
                Ok(row) => row,
                Err(fault) => return all_failed(local_parts(), encoder_fault_to_error_code(fault, true)),
            };

            let chain = Chain {
                local: *local_part,
                remote: *remote_part,
            };
            let out_key = keys::out_edge_row_key(&edge.key);
            let in_key = keys::in_edge_row_key(&edge.key);
            let entry = chain_kvs.entry(chain).or_default();
            entry.0.push((out_key.clone(), row.clone()));
            entry.1.push((in_key, row));

            let indexes = catalog.indexes_for_edge(space, edge_type);
            if !indexes.is_empty() {
                let field_values: Vec<_> = request
                    .prop_names
                    .iter()
                    .zip(edge.props.iter())
                    .collect();
                let entries = encode_edge_index_entries(&indexes, &field_values, &out_key);
                chain_index_kvs.entry(chain).or_default().extend(entries);
            }
        }
    }

    // Steps 4-6: commit every chain; record failures per local_part.
    let mut failures = Vec::new();
    for (chain, (local_kvs, remote_kvs)) in chain_kvs {
        let index_kvs = chain_index_kvs.remove(&chain).unwrap_or_default();
        let code = txn
            .add_same_part_edges(space, chain, local_kvs, remote_kvs, index_kvs)
            .await;
        if code != ResultCode::Succeeded {
            failures.push(PartitionResult::new(ErrorCode::from(code), chain.local));
        }
    }

    failures.sort_by_key(|f| f.part_id);
    AddEdgesResponse { failures }
}

mod keycodec_bridge {
    //! Index-entry encoding the edge writer needs, kept free of a `graphd-planner` dependency by
    //! re-deriving the same key layout `graphd_planner::keycodec` uses. Both crates depend only on
    //! `graphd-protos`' `PropValue`/`IndexItem`, so there is nothing to share but the scheme.

    use graphd_protos::property::ColumnType;
    use graphd_protos::property::PropValue;
    use graphd_protos::schema::IndexItem;

    fn encode_value(buf: &mut Vec<u8>, value: &PropValue) {
        match value {
            PropValue::Null => {}
            PropValue::Bool(b) => buf.push(*b as u8),
            PropValue::Int(i) => buf.extend_from_slice(&i.to_be_bytes()),
            PropValue::Float(f) => buf.extend_from_slice(&f.to_bits().to_be_bytes()),
            PropValue::Date(d) => buf.extend_from_slice(&d.to_be_bytes()),
            PropValue::DateTime(dt) => buf.extend_from_slice(&dt.to_be_bytes()),
            PropValue::String(s) => {
                buf.extend_from_slice(&(s.len() as u32).to_be_bytes());
                buf.extend_from_slice(s.as_bytes());
            }
            PropValue::List(items) => {
                let encoded = serde_json::to_vec(items).unwrap_or_default();
                buf.extend_from_slice(&(encoded.len() as u32).to_be_bytes());
                buf.extend_from_slice(&encoded);
            }
        }
    }

    fn encode_entry_key(index: &IndexItem, values: &[PropValue], base_key: &[u8]) -> Vec<u8> {
        let mut buf = (index.index_id.0 as u32).to_be_bytes().to_vec();
        if index.has_nullable_column() {
            let mut bitmap: u8 = 0;
            for (i, field) in index.fields.iter().enumerate() {
                if field.nullable && !matches!(values.get(i), Some(PropValue::Null) | None) {
                    bitmap |= 1 << i;
                }
            }
            buf.push(bitmap);
        }
        for value in values {
            encode_value(&mut buf, value);
        }
        buf.extend_from_slice(base_key);
        buf
    }

    /// Builds one index-entry key (empty value) per index covering `edge_type`, for the edge whose
    /// properties are `field_values` and whose out-edge row key is `out_key`.
    pub fn encode_edge_index_entries(
        indexes: &[IndexItem],
        field_values: &[(&String, &PropValue)],
        out_key: &[u8],
    ) -> Vec<(Vec<u8>, Vec<u8>)> {
        indexes
            .iter()
            .filter(|index| {
                index
                    .fields
                    .iter()
                    .all(|f| matches!(f.r#type, ColumnType::Bool | ColumnType::Int | ColumnType::Float | ColumnType::String | ColumnType::Date | ColumnType::DateTime | ColumnType::List))
            })
            .map(|index| {
                let values: Vec<PropValue> = index
                    .fields
                    .iter()
                    .map(|field| {
                        field_values
                            .iter()
                            .find(|(name, _)| *name == &field.name)
                            .map(|(_, value)| (*value).clone())
                            .unwrap_or(PropValue::Null)
                    })
                    .collect();
                (encode_entry_key(index, &values, out_key), Vec::new())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use graphd_kvstore::MemoryPartitionStore;
    use graphd_protos::ids::HostAddr;
    use graphd_protos::property::ColumnDef;
    use graphd_protos::property::ColumnType;
    use graphd_protos::property::PropValue;
    use graphd_protos::request::EdgeKey;
    use graphd_protos::request::NewEdge;
    use graphd_protos::schema::SchemaVersion;

    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::txn::TwoPhasePartStore;

    fn schema() -> SchemaVersion {
        SchemaVersion {
            schema_id: SchemaId(5),
            version: 1,
            name: "knows".to_string(),
            is_edge: true,
            columns: vec![ColumnDef::new("since", ColumnType::Int, false)],
        }
    }

    async fn store_with_parts(space: SpaceId, manager: &PartitionManager, count: u32) -> MemoryPartitionStore {
        let store = MemoryPartitionStore::new();
        for part in 1..=count {
            let peers = vec![HostAddr::new("h", 9000)];
            store.add_part(space, PartId(part), peers.clone()).await;
            manager.add_part(space, PartId(part), peers).await;
        }
        store
    }

    #[tokio::test]
    async fn test_atomic_write_commits_both_sides() {
        let space = SpaceId(1);
        let manager = PartitionManager::new();
        let store = store_with_parts(space, &manager, 4).await;
        let catalog = StaticCatalog::new(vec![(space, 8)], vec![schema()], vec![]);
        let txn = TwoPhasePartStore::new(&store);

        let edge = NewEdge {
            key: EdgeKey {
                src_vid: b"alice".to_vec(),
                edge_type: 5,
                rank: 0,
                dst_vid: b"bob".to_vec(),
            },
            props: vec![PropValue::Int(2020)],
        };
        let mut parts = HashMap::new();
        parts.insert(PartId(1), vec![edge.clone()]);
        let request = AddEdgesRequest {
            space_id: space,
            prop_names: vec!["since".to_string()],
            parts,
            if_not_exists: false,
        };

        let response = add_edges_atomic(&store, &manager, &catalog, &txn, request).await;
        assert!(response.is_success());

        let out_key = keys::out_edge_row_key(&edge.key);
        let remote_part = crate::hash::hash_to_part(b"bob", 4).unwrap();
        assert!(store.get(space, PartId(1), out_key).await.unwrap().is_some());
        let in_key = keys::in_edge_row_key(&edge.key);
        assert!(store.get(space, remote_part, in_key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_vid_len_fails_every_listed_partition() {
        let space = SpaceId(1);
        let manager = PartitionManager::new();
        let store = store_with_parts(space, &manager, 4).await;
        let catalog = StaticCatalog::new(vec![], vec![schema()], vec![]);
        let txn = TwoPhasePartStore::new(&store);

        let edge = NewEdge {
            key: EdgeKey {
                src_vid: b"alice".to_vec(),
                edge_type: 5,
                rank: 0,
                dst_vid: b"bob".to_vec(),
            },
            props: vec![PropValue::Int(2020)],
        };
        let mut parts = HashMap::new();
        parts.insert(PartId(1), vec![edge]);
        let request = AddEdgesRequest {
            space_id: space,
            prop_names: vec!["since".to_string()],
            parts,
            if_not_exists: false,
        };

        let response = add_edges_atomic(&store, &manager, &catalog, &txn, request).await;
        assert_eq!(response.failures.len(), 1);
        assert_eq!(response.failures[0].code, ErrorCode::InvalidSpaceVidLen);
    }
}
