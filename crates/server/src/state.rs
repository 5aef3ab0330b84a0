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

//! The state shared by every handler: the partition store and its manager, this daemon's role and
//! cluster identity, and the one place ([`AppState::catalog`]) that turns a fresh meta-partition
//! scan into the `graphd_processor`/`graphd_planner` catalogs the read and write paths consult.

use std::sync::Arc;

use graphd_kvstore::MemoryPartitionStore;
use graphd_kvstore::PartitionManager;
use graphd_meta::CatalogSnapshot;
use graphd_protos::ids::HostAddr;

use crate::error::ServerError;

/// Which RPC surface this daemon exposes. The meta and storage daemons are two roles over the
/// same partition-store abstraction, not two binaries with different internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Meta,
    Storage,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryPartitionStore>,
    pub manager: Arc<PartitionManager>,
    pub role: Role,
    pub cluster_id: u64,
    pub self_addr: HostAddr,
}

impl AppState {
    /// Scans the meta partition fresh on every call. A real deployment would cache this and
    /// invalidate on write; this stand-in trades that for never serving a stale catalog, which
    /// matters more for a crate this size than the extra scan cost.
    pub async fn catalog(&self) -> Result<CatalogSnapshot, ServerError> {
        graphd_meta::load_catalog_snapshot(self.store.as_ref())
            .await
            .map_err(|report| ServerError(format!("{report:?}")))
    }

    pub async fn is_meta_leader(&self) -> bool {
        self.store
            .part_leader(
                graphd_protos::request::META_SPACE_ID,
                graphd_protos::request::META_PART_ID,
            )
            .await
            .map(|leader| leader == self.self_addr)
            .unwrap_or(false)
    }
}
