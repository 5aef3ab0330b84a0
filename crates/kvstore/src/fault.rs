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

use error_stack::Result;
use graphd_protos::ids::HostAddr;
use graphd_protos::ids::PartId;
use graphd_protos::ids::SpaceId;
use graphd_protos::result::ResultCode;
use tokio::sync::RwLock;

use crate::error::KvError;
use crate::store::PartitionStore;
use crate::store::ScanRequest;
use crate::store::ScanResult;

/// Which operation a [`FaultRule`] applies to. `Any` matches every mutating operation, which is
/// the common case for simulating "this replica's write path is broken".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultOp {
    Any,
    MultiPut,
    MultiRemove,
    RemoveRange,
}

#[derive(Debug, Clone, Copy)]
pub struct FaultRule {
    pub op: FaultOp,
    pub code: ResultCode,
}

/// Test-only decorator that forces chosen `(space, part)` operations to return a
/// specific [`ResultCode`], regardless of what the wrapped store would have done. This is how
/// leader-changed propagation and simulated remote-write failure are driven deterministically
/// without a real Raft implementation to inject faults into.
#[derive(Default)]
pub struct FaultInjectingPartitionStore<S> {
    inner: S,
    rules: RwLock<HashMap<(SpaceId, PartId), FaultRule>>,
}

impl<S: PartitionStore> FaultInjectingPartitionStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            rules: RwLock::new(HashMap::new()),
        }
    }

    pub async fn inject(&self, space: SpaceId, part: PartId, rule: FaultRule) {
        self.rules.write().await.insert((space, part), rule);
    }

    pub async fn clear(&self, space: SpaceId, part: PartId) {
        self.rules.write().await.remove(&(space, part));
    }

    async fn faulted_code(&self, space: SpaceId, part: PartId, op: FaultOp) -> Option<ResultCode> {
        let rules = self.rules.read().await;
        rules.get(&(space, part)).and_then(|rule| {
            if rule.op == FaultOp::Any || rule.op == op {
                Some(rule.code)
            } else {
                None
            }
        })
    }
}

impl<S: PartitionStore> PartitionStore for FaultInjectingPartitionStore<S> {
    async fn init(&self) -> Result<(), KvError> {
        self.inner.init().await
    }

    async fn add_part(&self, space: SpaceId, part: PartId, peers: Vec<HostAddr>) {
        self.inner.add_part(space, part, peers).await
    }

    async fn multi_put(
        &self,
        space: SpaceId,
        part: PartId,
        kvs: Vec<(Vec<u8>, Vec<u8>)>,
    ) -> ResultCode {
        if let Some(code) = self.faulted_code(space, part, FaultOp::MultiPut).await {
            return code;
        }
        self.inner.multi_put(space, part, kvs).await
    }

    async fn multi_remove(&self, space: SpaceId, part: PartId, keys: Vec<Vec<u8>>) -> ResultCode {
        if let Some(code) = self.faulted_code(space, part, FaultOp::MultiRemove).await {
            return code;
        }
        self.inner.multi_remove(space, part, keys).await
    }

    async fn remove_range(
        &self,
        space: SpaceId,
        part: PartId,
        start: Vec<u8>,
        end: Vec<u8>,
    ) -> ResultCode {
        if let Some(code) = self.faulted_code(space, part, FaultOp::RemoveRange).await {
            return code;
        }
        self.inner.remove_range(space, part, start, end).await
    }

    async fn get(
        &self,
        space: SpaceId,
        part: PartId,
        key: Vec<u8>,
    ) -> Result<Option<Vec<u8>>, KvError> {
        self.inner.get(space, part, key).await
    }

    async fn scan(
        &self,
        space: SpaceId,
        part: PartId,
        request: ScanRequest,
    ) -> Result<ScanResult, KvError> {
        self.inner.scan(space, part, request).await
    }

    async fn part_leader(&self, space: SpaceId, part: PartId) -> Result<HostAddr, KvError> {
        self.inner.part_leader(space, part).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryPartitionStore;

    #[tokio::test]
    async fn test_injected_fault_overrides_result() {
        let store = FaultInjectingPartitionStore::new(MemoryPartitionStore::new());
        store
            .add_part(SpaceId(1), PartId(7), vec![HostAddr::new("h", 9000)])
            .await;
        store
            .inject(
                SpaceId(1),
                PartId(7),
                FaultRule {
                    op: FaultOp::Any,
                    code: ResultCode::LeaderChanged,
                },
            )
            .await;

        let code = store
            .multi_put(SpaceId(1), PartId(7), vec![(b"k".to_vec(), b"v".to_vec())])
            .await;
        assert_eq!(code, ResultCode::LeaderChanged);
        // reads are unaffected: the fault targets the write path only.
        assert!(store.get(SpaceId(1), PartId(7), b"k".to_vec()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_restores_normal_behavior() {
        let store = FaultInjectingPartitionStore::new(MemoryPartitionStore::new());
        store
            .add_part(SpaceId(1), PartId(7), vec![HostAddr::new("h", 9000)])
            .await;
        store
            .inject(
                SpaceId(1),
                PartId(7),
                FaultRule {
                    op: FaultOp::Any,
                    code: ResultCode::ConsensusError,
                },
            )
            .await;
        store.clear(SpaceId(1), PartId(7)).await;

        let code = store
            .multi_put(SpaceId(1), PartId(7), vec![(b"k".to_vec(), b"v".to_vec())])
            .await;
        assert_eq!(code, ResultCode::Succeeded);
    }
}
