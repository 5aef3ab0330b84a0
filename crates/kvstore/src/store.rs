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

use std::future::Future;

use error_stack::Result;
use graphd_protos::ids::HostAddr;
use graphd_protos::ids::PartId;
use graphd_protos::ids::SpaceId;
use graphd_protos::result::ResultCode;

use crate::error::KvError;

/// A `scan` request over one partition's keyspace, restartable from a bookmark.
#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    pub prefix: Vec<u8>,
    /// Resume a previous scan strictly after this key.
    pub resume_after: Option<Vec<u8>>,
    pub limit: usize,
}

impl ScanRequest {
    pub fn prefix(prefix: impl Into<Vec<u8>>, limit: usize) -> Self {
        Self {
            prefix: prefix.into(),
            resume_after: None,
            limit,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub entries: Vec<(Vec<u8>, Vec<u8>)>,
    /// Present when the scan was truncated by `limit`; pass back as `resume_after` to continue.
    pub next_bookmark: Option<Vec<u8>>,
}

/// A replicated, partitioned key-value store: one independent replicated log per `(space, part)`,
/// each with a single leader at a time.
///
/// The real engine (log-structured storage plus Raft consensus) is out of scope; this trait is
/// the seam a real engine would plug into, and [`crate::MemoryPartitionStore`] is the in-process
/// stand-in this crate drives the async fan-out (C6) and atomic edge writer (C7) logic against.
pub trait PartitionStore: Send + Sync {
    /// Readies the store for use. Callers must await this before issuing any other operation, in
    /// particular before racing `part_leader(0, 0)` during cluster bootstrap.
    fn init(&self) -> impl Future<Output = Result<(), KvError>> + Send;

    /// Registers `(space, part)` with the given ordered peer list. Idempotent. The first peer is
    /// treated as the partition's leader, a static, non-rotating stand-in for leader election
    ///.
    fn add_part(
        &self,
        space: SpaceId,
        part: PartId,
        peers: Vec<HostAddr>,
    ) -> impl Future<Output = ()> + Send;

    /// Atomically applies all of `kvs` to `(space, part)`.
    fn multi_put(
        &self,
        space: SpaceId,
        part: PartId,
        kvs: Vec<(Vec<u8>, Vec<u8>)>,
    ) -> impl Future<Output = ResultCode> + Send;

    fn multi_remove(
        &self,
        space: SpaceId,
        part: PartId,
        keys: Vec<Vec<u8>>,
    ) -> impl Future<Output = ResultCode> + Send;

    /// Removes every key in the half-open range `[start, end)`.
    fn remove_range(
        &self,
        space: SpaceId,
        part: PartId,
        start: Vec<u8>,
        end: Vec<u8>,
    ) -> impl Future<Output = ResultCode> + Send;

    fn get(
        &self,
        space: SpaceId,
        part: PartId,
        key: Vec<u8>,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, KvError>> + Send;

    fn scan(
        &self,
        space: SpaceId,
        part: PartId,
        request: ScanRequest,
    ) -> impl Future<Output = Result<ScanResult, KvError>> + Send;

    /// Returns the partition's current leader, or the zero address ([`HostAddr::zero`]) before
    /// the first election. Callers poll rather than treating the zero address as an error.
    fn part_leader(
        &self,
        space: SpaceId,
        part: PartId,
    ) -> impl Future<Output = Result<HostAddr, KvError>> + Send;
}
