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

use std::collections::BTreeMap;
use std::collections::HashMap;

use error_stack::Result;
use error_stack::ResultExt;
use graphd_protos::ids::HostAddr;
use graphd_protos::ids::PartId;
use graphd_protos::ids::SpaceId;
use graphd_protos::result::ResultCode;
use tokio::sync::RwLock;

use crate::error::KvError;
use crate::store::PartitionStore;
use crate::store::ScanRequest;
use crate::store::ScanResult;

struct Partition {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    leader: HostAddr,
}

impl Partition {
    fn new(peers: &[HostAddr]) -> Self {
        Self {
            data: BTreeMap::new(),
            leader: peers.first().cloned().unwrap_or_else(HostAddr::zero),
        }
    }
}

/// An in-memory stand-in for the replicated KV store: one `BTreeMap` per
/// `(space, part)` guarded by a `tokio::sync::RwLock`, with a single, non-rotating leader chosen
/// from the first peer passed to [`PartitionStore::add_part`].
#[derive(Default)]
pub struct MemoryPartitionStore {
    partitions: RwLock<HashMap<(SpaceId, PartId), Partition>>,
}

impl MemoryPartitionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PartitionStore for MemoryPartitionStore {
    async fn init(&self) -> Result<(), KvError> {
        Ok(())
    }

    async fn add_part(&self, space: SpaceId, part: PartId, peers: Vec<HostAddr>) {
        let mut partitions = self.partitions.write().await;
        partitions
            .entry((space, part))
            .or_insert_with(|| Partition::new(&peers));
    }

    async fn multi_put(
        &self,
        space: SpaceId,
        part: PartId,
        kvs: Vec<(Vec<u8>, Vec<u8>)>,
    ) -> ResultCode {
        let mut partitions = self.partitions.write().await;
        let Some(partition) = partitions.get_mut(&(space, part)) else {
            return ResultCode::PartNotFound;
        };
        for (k, v) in kvs {
            partition.data.insert(k, v);
        }
        ResultCode::Succeeded
    }

    async fn multi_remove(&self, space: SpaceId, part: PartId, keys: Vec<Vec<u8>>) -> ResultCode {
        let mut partitions = self.partitions.write().await;
        let Some(partition) = partitions.get_mut(&(space, part)) else {
            return ResultCode::PartNotFound;
        };
        for k in keys {
            partition.data.remove(&k);
        }
        ResultCode::Succeeded
    }

    async fn remove_range(
        &self,
        space: SpaceId,
        part: PartId,
        start: Vec<u8>,
        end: Vec<u8>,
    ) -> ResultCode {
        let mut partitions = self.partitions.write().await;
        let Some(partition) = partitions.get_mut(&(space, part)) else {
            return ResultCode::PartNotFound;
        };
        let keys: Vec<_> = partition.data.range(start..end).map(|(k, _)| k.clone()).collect();
        for k in keys {
            partition.data.remove(&k);
        }
        ResultCode::Succeeded
    }

    async fn get(
        &self,
        space: SpaceId,
        part: PartId,
        key: Vec<u8>,
    ) -> Result<Option<Vec<u8>>, KvError> {
        let make_error = || KvError(format!("part not found: ({space}, {part})"));
        let partitions = self.partitions.read().await;
        let partition = partitions
            .get(&(space, part))
            .ok_or_else(|| error_stack::Report::new(make_error()))?;
        Ok(partition.data.get(&key).cloned())
    }

    async fn scan(
        &self,
        space: SpaceId,
        part: PartId,
        request: ScanRequest,
    ) -> Result<ScanResult, KvError> {
        let make_error = || KvError(format!("part not found: ({space}, {part})"));
        let partitions = self.partitions.read().await;
        let partition = partitions
            .get(&(space, part))
            .ok_or_else(|| error_stack::Report::new(make_error()))?;

        let mut entries = Vec::new();
        let mut next_bookmark = None;
        let iter = partition
            .data
            .range(request.prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&request.prefix))
            .filter(|(k, _)| request.resume_after.as_ref().is_none_or(|after| k > after));

        for (k, v) in iter {
            if request.limit > 0 && entries.len() >= request.limit {
                next_bookmark = Some(k.clone());
                break;
            }
            entries.push((k.clone(), v.clone()));
        }
        // if the scan ended exactly at `limit` with no further rows, there is nothing to resume.
        if next_bookmark.is_none() && request.limit > 0 && entries.len() == request.limit {
            next_bookmark = entries.last().map(|(k, _)| k.clone());
        }

        Ok(ScanResult {
            entries,
            next_bookmark,
        })
    }

    async fn part_leader(&self, space: SpaceId, part: PartId) -> Result<HostAddr, KvError> {
        let make_error = || KvError(format!("part not found: ({space}, {part})"));
        let partitions = self.partitions.read().await;
        let partition = partitions
            .get(&(space, part))
            .ok_or_else(|| error_stack::Report::new(make_error()))?;
        Ok(partition.leader.clone())
    }
}

#[cfg(test)]
mod tests {
    use graphd_protos::ids::SpaceId;

    use super::*;

    fn space() -> SpaceId {
        SpaceId(1)
    }

    #[tokio::test]
    async fn test_add_part_is_idempotent() {
        let store = MemoryPartitionStore::new();
        let peers = vec![HostAddr::new("host-a", 9000), HostAddr::new("host-b", 9000)];
        store.add_part(space(), PartId(1), peers.clone()).await;
        store
            .multi_put(space(), PartId(1), vec![(b"k".to_vec(), b"v".to_vec())])
            .await;
        // a second add_part with a different peer list must not reset the leader or the data.
        store
            .add_part(space(), PartId(1), vec![HostAddr::new("host-c", 9000)])
            .await;
        let leader = store.part_leader(space(), PartId(1)).await.unwrap();
        assert_eq!(leader, HostAddr::new("host-a", 9000));
        assert_eq!(
            store.get(space(), PartId(1), b"k".to_vec()).await.unwrap(),
            Some(b"v".to_vec())
        );
    }

    #[tokio::test]
    async fn test_multi_put_and_get_roundtrip() {
        let store = MemoryPartitionStore::new();
        store
            .add_part(space(), PartId(1), vec![HostAddr::new("host-a", 9000)])
            .await;
        let code = store
            .multi_put(
                space(),
                PartId(1),
                vec![(b"a".to_vec(), b"1".to_vec()), (b"b".to_vec(), b"2".to_vec())],
            )
            .await;
        assert_eq!(code, ResultCode::Succeeded);
        assert_eq!(
            store.get(space(), PartId(1), b"a".to_vec()).await.unwrap(),
            Some(b"1".to_vec())
        );
    }

    #[tokio::test]
    async fn test_unknown_part_not_found() {
        let store = MemoryPartitionStore::new();
        let code = store
            .multi_put(space(), PartId(9), vec![(b"a".to_vec(), b"1".to_vec())])
            .await;
        assert_eq!(code, ResultCode::PartNotFound);
        assert!(store.get(space(), PartId(9), b"a".to_vec()).await.is_err());
    }

    #[tokio::test]
    async fn test_scan_prefix_and_bookmark() {
        let store = MemoryPartitionStore::new();
        store
            .add_part(space(), PartId(1), vec![HostAddr::new("host-a", 9000)])
            .await;
        store
            .multi_put(
                space(),
                PartId(1),
                vec![
                    (b"row:1".to_vec(), b"a".to_vec()),
                    (b"row:2".to_vec(), b"b".to_vec()),
                    (b"row:3".to_vec(), b"c".to_vec()),
                    (b"other:1".to_vec(), b"z".to_vec()),
                ],
            )
            .await;

        let first = store
            .scan(space(), PartId(1), ScanRequest::prefix(b"row:".to_vec(), 2))
            .await
            .unwrap();
        assert_eq!(first.entries.len(), 2);
        assert!(first.next_bookmark.is_some());

        let rest = store
            .scan(
                space(),
                PartId(1),
                ScanRequest {
                    prefix: b"row:".to_vec(),
                    resume_after: first.next_bookmark,
                    limit: 0,
                },
            )
            .await
            .unwrap();
        assert_eq!(rest.entries.len(), 1);
        assert_eq!(rest.entries[0].0, b"row:3".to_vec());
    }
}
