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

//! The base async fan-out primitive that `addEdgesAtomic` and `updateVertex` are both
//! built on: dispatch one operation per partition, translate each partition's KV result code,
//! attach the current leader when the store can supply one, and resolve to a single [`ExecResponse`]
//! once every partition has answered — never before, never twice.

use std::future::Future;
use std::sync::Mutex;

use futures::future::join_all;
use graphd_kvstore::PartitionStore;
use graphd_protos::ids::PartId;
use graphd_protos::ids::SpaceId;
use graphd_protos::result::ErrorCode;
use graphd_protos::result::ExecResponse;
use graphd_protos::result::PartitionResult;
use graphd_protos::result::ResultCode;

struct FanOutState {
    calling_num: usize,
    failures: Vec<PartitionResult>,
}

/// Runs `op` once per entry in `parts`, concurrently, and folds the results into one
/// [`ExecResponse`]. `op` returns the KV result code for its partition; a non-`Succeeded` code is
/// translated to an [`ErrorCode`] and, for `LeaderChanged`, enriched with the store's current
/// notion of the partition's leader.
///
/// Invariant: the returned future resolves exactly once, only after every
/// partition's `op` has completed — the `calling_num` countdown below is the same rendezvous the
/// distilled spec's mutex-guarded counter describes, just expressed as an async join rather than a
/// manually driven callback chain.
pub async fn run_fanout<S, F, Fut>(store: &S, space: SpaceId, parts: Vec<PartId>, op: F) -> ExecResponse
where
    S: PartitionStore,
    F: Fn(PartId) -> Fut,
    Fut: Future<Output = ResultCode>,
{
    let state = Mutex::new(FanOutState {
        calling_num: parts.len(),
        failures: Vec::new(),
    });

    let tasks = parts.into_iter().map(|part| {
        let state = &state;
        let op = &op;
        async move {
            let code = op(part).await;
            if code != ResultCode::Succeeded {
                let mut result = PartitionResult::new(ErrorCode::from(code), part);
                if code == ResultCode::LeaderChanged {
                    if let Ok(leader) = store.part_leader(space, part).await {
                        if !leader.is_zero() {
                            result = result.with_leader(leader);
                        }
                    }
                }
                state.lock().unwrap().failures.push(result);
            }
            state.lock().unwrap().calling_num -= 1;
        }
    });

    join_all(tasks).await;

    let mut state = state.into_inner().unwrap();
    debug_assert_eq!(state.calling_num, 0, "every partition must report exactly once");
    state.failures.sort_by_key(|f| f.part_id);
    ExecResponse { failures: state.failures }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use graphd_kvstore::MemoryPartitionStore;
    use graphd_protos::ids::HostAddr;

    use super::*;

    #[tokio::test]
    async fn test_all_succeeded_is_empty_failure_list() {
        let store = MemoryPartitionStore::new();
        let space = SpaceId(1);
        for part in [1, 2, 3] {
            store.add_part(space, PartId(part), vec![HostAddr::new("h", 9000)]).await;
        }
        let response = run_fanout(&store, space, vec![PartId(1), PartId(2), PartId(3)], |_part| async {
            ResultCode::Succeeded
        })
        .await;
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn test_leader_changed_is_enriched_with_current_leader() {
        let store = MemoryPartitionStore::new();
        let space = SpaceId(1);
        store
            .add_part(space, PartId(1), vec![HostAddr::new("leader-host", 9000)])
            .await;
        let response = run_fanout(&store, space, vec![PartId(1)], |_part| async {
            ResultCode::LeaderChanged
        })
        .await;
        assert_eq!(response.failures.len(), 1);
        assert_eq!(response.failures[0].code, ErrorCode::LeaderChanged);
        assert_eq!(response.failures[0].leader, Some(HostAddr::new("leader-host", 9000)));
    }

    #[tokio::test]
    async fn test_resolves_exactly_once_after_every_partition_reports() {
        let store = MemoryPartitionStore::new();
        let space = SpaceId(1);
        for part in [1, 2, 3, 4] {
            store.add_part(space, PartId(part), vec![HostAddr::new("h", 9000)]).await;
        }
        let started = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));
        let parts = vec![PartId(1), PartId(2), PartId(3), PartId(4)];
        let response = run_fanout(&store, space, parts, |part| {
            let started = started.clone();
            let finished = finished.clone();
            async move {
                started.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
                finished.fetch_add(1, Ordering::SeqCst);
                if part == PartId(3) {
                    ResultCode::ConsensusError
                } else {
                    ResultCode::Succeeded
                }
            }
        })
        .await;
        assert_eq!(started.load(Ordering::SeqCst), 4);
        assert_eq!(finished.load(Ordering::SeqCst), 4);
        assert_eq!(response.failures.len(), 1);
        assert_eq!(response.failures[0].part_id, PartId(3));
    }
}
