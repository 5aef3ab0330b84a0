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

//! `txnMan.addSamePartEdges`: the seam a real two-phase or Raft-backed transaction
//! log would plug into. [`TwoPhasePartStore`] is the in-process stand-in — not a true transaction,
//! but it upholds the one atomicity property the writer's tests actually exercise: a chain that
//! fails its remote write leaves no local trace either.

use std::future::Future;

use graphd_kvstore::PartitionStore;
use graphd_protos::ids::PartId;
use graphd_protos::ids::SpaceId;
use graphd_protos::result::ResultCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chain {
    pub local: PartId,
    pub remote: PartId,
}

pub trait TransactionManager: Send + Sync {
    fn add_same_part_edges(
        &self,
        space: SpaceId,
        chain: Chain,
        local_kvs: Vec<(Vec<u8>, Vec<u8>)>,
        remote_kvs: Vec<(Vec<u8>, Vec<u8>)>,
        index_kvs: Vec<(Vec<u8>, Vec<u8>)>,
    ) -> impl Future<Output = ResultCode> + Send;
}

/// Writes `local_kvs` (plus `index_kvs`) to `chain.local` first, then `remote_kvs` to
/// `chain.remote`. If the remote write does not succeed, compensates by removing the local keys
/// just written before returning the remote's failure code — so a reader of `chain.local` never
/// observes an out-edge whose matching in-edge failed to commit.
pub struct TwoPhasePartStore<'a, S> {
    store: &'a S,
}

impl<'a, S: PartitionStore> TwoPhasePartStore<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }
}

impl<S: PartitionStore> TransactionManager for TwoPhasePartStore<'_, S> {
    async fn add_same_part_edges(
        &self,
        space: SpaceId,
        chain: Chain,
        local_kvs: Vec<(Vec<u8>, Vec<u8>)>,
        remote_kvs: Vec<(Vec<u8>, Vec<u8>)>,
        index_kvs: Vec<(Vec<u8>, Vec<u8>)>,
    ) -> ResultCode {
        let local_keys: Vec<Vec<u8>> = local_kvs.iter().map(|(k, _)| k.clone()).collect();
        let mut combined = local_kvs;
        combined.extend(index_kvs);

        let local_code = self.store.multi_put(space, chain.local, combined).await;
        if local_code != ResultCode::Succeeded {
            return local_code;
        }

        let remote_code = self.store.multi_put(space, chain.remote, remote_kvs).await;
        if remote_code != ResultCode::Succeeded {
            let _ = self.store.multi_remove(space, chain.local, local_keys).await;
            return remote_code;
        }

        ResultCode::Succeeded
    }
}

#[cfg(test)]
mod tests {
    use graphd_kvstore::FaultInjectingPartitionStore;
    use graphd_kvstore::FaultOp;
    use graphd_kvstore::FaultRule;
    use graphd_kvstore::MemoryPartitionStore;
    use graphd_protos::ids::HostAddr;

    use super::*;

    fn chain() -> Chain {
        Chain {
            local: PartId(1),
            remote: PartId(2),
        }
    }

    #[tokio::test]
    async fn test_commits_both_sides_on_success() {
        let store = MemoryPartitionStore::new();
        let space = SpaceId(1);
        store.add_part(space, PartId(1), vec![HostAddr::new("h", 9000)]).await;
        store.add_part(space, PartId(2), vec![HostAddr::new("h", 9000)]).await;

        let txn = TwoPhasePartStore::new(&store);
        let code = txn
            .add_same_part_edges(
                space,
                chain(),
                vec![(b"out".to_vec(), b"v".to_vec())],
                vec![(b"in".to_vec(), b"v".to_vec())],
                vec![],
            )
            .await;
        assert_eq!(code, ResultCode::Succeeded);
        assert!(store.get(space, PartId(1), b"out".to_vec()).await.unwrap().is_some());
        assert!(store.get(space, PartId(2), b"in".to_vec()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_remote_failure_rolls_back_local_write() {
        let store = FaultInjectingPartitionStore::new(MemoryPartitionStore::new());
        let space = SpaceId(1);
        store.add_part(space, PartId(1), vec![HostAddr::new("h", 9000)]).await;
        store.add_part(space, PartId(2), vec![HostAddr::new("h", 9000)]).await;
        store
            .inject(
                space,
                PartId(2),
                FaultRule {
                    op: FaultOp::MultiPut,
                    code: ResultCode::ConsensusError,
                },
            )
            .await;

        let txn = TwoPhasePartStore::new(&store);
        let code = txn
            .add_same_part_edges(
                space,
                chain(),
                vec![(b"out".to_vec(), b"v".to_vec())],
                vec![(b"in".to_vec(), b"v".to_vec())],
                vec![],
            )
            .await;
        assert_eq!(code, ResultCode::ConsensusError);
        assert!(store.get(space, PartId(1), b"out".to_vec()).await.unwrap().is_none());
        assert!(store.get(space, PartId(2), b"in".to_vec()).await.unwrap().is_none());
    }
}
