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
use std::collections::HashSet;

use error_stack::Result;
use graphd_protos::ids::HostAddr;
use graphd_protos::ids::PartId;
use graphd_protos::ids::SpaceId;
use tokio::sync::RwLock;

use crate::error::KvError;

/// Maps `(space, part) -> ordered replica list`. Lookups never block on I/O; updates are totally
/// ordered per `(space, part)` by the single `RwLock` guarding the map.
#[derive(Debug, Default)]
pub struct PartitionManager {
    peers: RwLock<HashMap<(SpaceId, PartId), Vec<HostAddr>>>,
}

impl PartitionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn parts(&self, space: SpaceId) -> Vec<PartId> {
        self.peers
            .read()
            .await
            .keys()
            .filter(|(s, _)| *s == space)
            .map(|(_, p)| *p)
            .collect()
    }

    pub async fn peers(&self, space: SpaceId, part: PartId) -> Result<Vec<HostAddr>, KvError> {
        let make_error = || KvError(format!("part not found: ({space}, {part})"));
        self.peers
            .read()
            .await
            .get(&(space, part))
            .cloned()
            .ok_or_else(|| error_stack::Report::new(make_error()))
    }

    /// Idempotent: calling twice with the same `(space, part)` and an identical peer list is a
    /// no-op; calling with a different peer list replaces the membership (a real deployment would
    /// drive this through a membership-change protocol, out of scope here).
    pub async fn add_part(&self, space: SpaceId, part: PartId, peers: Vec<HostAddr>) {
        self.peers.write().await.insert((space, part), peers);
    }

    pub async fn all_parts(&self) -> HashSet<(SpaceId, PartId)> {
        self.peers.read().await.keys().copied().collect()
    }
}
