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

//! Cluster bootstrap and identity: a self-seeding 64-bit cluster id, persisted through
//! the meta partition, elected by whichever replica happens to be the meta partition's leader at
//! first boot.

use std::time::Duration;

use error_stack::Result;
use error_stack::ResultExt;
use graphd_kvstore::PartitionStore;
use graphd_protos::ids::HostAddr;
use graphd_protos::request::CLUSTER_ID_KEY;
use graphd_protos::request::META_PART_ID;
use graphd_protos::request::META_SPACE_ID;

/// Non-cryptographic salt distinguishing cluster-id derivation from the `hashToPart` routing
/// hash, even though both ultimately call into the same `xxh3` family.
const CLUSTER_ID_SALT: &str = "graphd-cluster-id";

const LEADER_POLL_INTERVAL: Duration = Duration::from_millis(20);
const FOLLOWER_RETRY_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ClusterIdError(pub String);

/// Derives a non-zero cluster id from the canonical, sorted `host:port` peer list:
/// `xxh3("{salt}:{sorted_host_port_csv}")`, OR-ed with `1` on the zero case.
pub fn derive_cluster_id(peers: &[HostAddr]) -> u64 {
    let mut rendered: Vec<String> = peers.iter().map(|addr| addr.to_string()).collect();
    rendered.sort();
    let canonical = format!("{CLUSTER_ID_SALT}:{}", rendered.join(","));
    let hash = xxhash_rust::xxh3::xxh3_64(canonical.as_bytes());
    if hash == 0 {
        hash | 1
    } else {
        hash
    }
}

fn encode(id: u64) -> Vec<u8> {
    id.to_be_bytes().to_vec()
}

fn decode(bytes: &[u8]) -> Result<u64, ClusterIdError> {
    let array: [u8; 8] = bytes.try_into().change_context_lazy(|| {
        ClusterIdError(format!(
            "cluster id record has unexpected length {}",
            bytes.len()
        ))
    })?;
    Ok(u64::from_be_bytes(array))
}

/// Races the meta replica set to establish `gClusterId`, following a leader/follower protocol:
/// the leader derives and writes the id once, followers poll until it appears. Callers must have
/// already called [`PartitionStore::init`] and [`PartitionStore::add_part`] for `(0, 0)` before
/// calling this.
pub async fn bootstrap_cluster_id<S: PartitionStore>(
    store: &S,
    self_addr: &HostAddr,
    peers: &[HostAddr],
) -> Result<u64, ClusterIdError> {
    let make_error = || ClusterIdError("failed to bootstrap cluster id".to_string());

    let leader = loop {
        let leader = store
            .part_leader(META_SPACE_ID, META_PART_ID)
            .await
            .change_context_lazy(make_error)?;
        if !leader.is_zero() {
            break leader;
        }
        tokio::time::sleep(LEADER_POLL_INTERVAL).await;
    };
    let is_leader = leader == *self_addr;

    if let Some(existing) = read_cluster_id(store).await.change_context_lazy(make_error)? {
        return Ok(existing);
    }

    if is_leader {
        let id = derive_cluster_id(peers);
        let code = store
            .multi_put(
                META_SPACE_ID,
                META_PART_ID,
                vec![(CLUSTER_ID_KEY.as_bytes().to_vec(), encode(id))],
            )
            .await;
        if !code.is_success() {
            return Err(make_error()).attach_printable(format!(
                "leader failed to persist cluster id: {code:?}"
            ));
        }
        log::info!("elected cluster id {id} as meta partition leader");
        Ok(id)
    } else {
        log::info!("waiting for the meta partition leader to seed the cluster id");
        loop {
            tokio::time::sleep(FOLLOWER_RETRY_BACKOFF).await;
            if let Some(id) = read_cluster_id(store).await.change_context_lazy(make_error)? {
                return Ok(id);
            }
        }
    }
}

async fn read_cluster_id<S: PartitionStore>(store: &S) -> Result<Option<u64>, ClusterIdError> {
    let make_error = || ClusterIdError("failed to read cluster id".to_string());
    let bytes = store
        .get(META_SPACE_ID, META_PART_ID, CLUSTER_ID_KEY.as_bytes().to_vec())
        .await
        .change_context_lazy(make_error)?;
    bytes.map(|bytes| decode(&bytes)).transpose()
}

#[cfg(test)]
mod tests {
    use graphd_kvstore::MemoryPartitionStore;

    use super::*;

    fn peers() -> Vec<HostAddr> {
        vec![
            HostAddr::new("host-a", 9000),
            HostAddr::new("host-b", 9000),
            HostAddr::new("host-c", 9000),
        ]
    }

    #[test]
    fn test_derive_cluster_id_is_order_independent_and_nonzero() {
        let forward = derive_cluster_id(&peers());
        let shuffled = derive_cluster_id(&[peers()[2].clone(), peers()[0].clone(), peers()[1].clone()]);
        assert_eq!(forward, shuffled);
        assert_ne!(forward, 0);
    }

    #[tokio::test]
    async fn test_leader_seeds_cluster_id() {
        let store = MemoryPartitionStore::new();
        store.init().await.unwrap();
        store.add_part(META_SPACE_ID, META_PART_ID, peers()).await;

        let id = bootstrap_cluster_id(&store, &peers()[0], &peers()).await.unwrap();
        assert_ne!(id, 0);

        let persisted = read_cluster_id(&store).await.unwrap();
        assert_eq!(persisted, Some(id));
    }

    #[tokio::test]
    async fn test_follower_adopts_leader_written_id() {
        let store = MemoryPartitionStore::new();
        store.init().await.unwrap();
        store.add_part(META_SPACE_ID, META_PART_ID, peers()).await;

        let leader_id = bootstrap_cluster_id(&store, &peers()[0], &peers()).await.unwrap();
        // the follower reads a key that is already present, so it never writes.
        let follower_id = bootstrap_cluster_id(&store, &peers()[1], &peers()).await.unwrap();
        assert_eq!(leader_id, follower_id);
    }

    #[tokio::test]
    async fn test_restart_is_idempotent() {
        let store = MemoryPartitionStore::new();
        store.init().await.unwrap();
        store.add_part(META_SPACE_ID, META_PART_ID, peers()).await;

        let first = bootstrap_cluster_id(&store, &peers()[0], &peers()).await.unwrap();
        let second = bootstrap_cluster_id(&store, &peers()[0], &peers()).await.unwrap();
        assert_eq!(first, second);
    }
}
