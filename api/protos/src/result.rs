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

use serde::Deserialize;
use serde::Serialize;

use crate::ids::HostAddr;
use crate::ids::PartId;
use crate::schema::WriteFault;

/// Result code surfaced by the replicated KV store to a processor, per one `(space, part)`
/// operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultCode {
    Succeeded,
    LeaderChanged,
    SpaceNotFound,
    PartNotFound,
    ConsensusError,
    CheckpointError,
    WriteBlocked,
    PartialResult,
    Unknown,
}

impl ResultCode {
    pub fn is_success(&self) -> bool {
        matches!(self, ResultCode::Succeeded)
    }
}

/// The fixed KV-code-to-processor-error translation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    Succeeded,
    LeaderChanged,
    SpaceNotFound,
    PartNotFound,
    ConsensusError,
    FailedToCheckpoint,
    CheckpointBlocked,
    PartialResult,
    Unknown,

    // Row-encoder faults, translated per context (edge vs. vertex) at the processor boundary.
    EdgePropNotFound,
    TagPropNotFound,
    NotNullable,
    DataTypeMismatch,
    FieldUnset,
    OutOfRange,
    InvalidFieldValue,

    // Atomic-writer specific errors.
    InvalidSpaceVidLen,

    // Planner specific errors.
    IndexNotFound,
    SchemaNotFound,
    InvalidOperation,
}

impl From<ResultCode> for ErrorCode {
    fn from(code: ResultCode) -> Self {
        match code {
            ResultCode::Succeeded => ErrorCode::Succeeded,
            ResultCode::LeaderChanged => ErrorCode::LeaderChanged,
            ResultCode::SpaceNotFound => ErrorCode::SpaceNotFound,
            ResultCode::PartNotFound => ErrorCode::PartNotFound,
            ResultCode::ConsensusError => ErrorCode::ConsensusError,
            ResultCode::CheckpointError => ErrorCode::FailedToCheckpoint,
            ResultCode::WriteBlocked => ErrorCode::CheckpointBlocked,
            ResultCode::PartialResult => ErrorCode::PartialResult,
            ResultCode::Unknown => ErrorCode::Unknown,
        }
    }
}

/// Translates a row-encoder fault into a processor [`ErrorCode`], distinguishing edge and vertex
/// contexts.
pub fn encoder_fault_to_error_code(fault: WriteFault, is_edge: bool) -> ErrorCode {
    match fault {
        WriteFault::UnknownField if is_edge => ErrorCode::EdgePropNotFound,
        WriteFault::UnknownField => ErrorCode::TagPropNotFound,
        WriteFault::NotNullable => ErrorCode::NotNullable,
        WriteFault::TypeMismatch => ErrorCode::DataTypeMismatch,
        WriteFault::FieldUnset => ErrorCode::FieldUnset,
        WriteFault::OutOfRange => ErrorCode::OutOfRange,
        WriteFault::IncorrectValue => ErrorCode::InvalidFieldValue,
    }
}

/// One partition's failure, reported back to the client. Only failures are reported — an empty
/// `Vec<PartitionResult>` in a response means full success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionResult {
    pub code: ErrorCode,
    pub part_id: PartId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leader: Option<HostAddr>,
}

impl PartitionResult {
    pub fn new(code: ErrorCode, part_id: PartId) -> Self {
        Self {
            code,
            part_id,
            leader: None,
        }
    }

    pub fn with_leader(mut self, leader: HostAddr) -> Self {
        self.leader = Some(leader);
        self
    }
}

/// Common response envelope for fan-out RPCs (`addEdgesAtomic`, `updateVertex`, ...): an empty
/// `failures` list means every partition succeeded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecResponse {
    pub failures: Vec<PartitionResult>,
}

impl ExecResponse {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}
