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

use graphd_protos::result::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error("index not found")]
    IndexNotFound,
    #[error("schema not found")]
    SchemaNotFound,
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl PlannerError {
    pub fn to_error_code(&self) -> ErrorCode {
        match self {
            PlannerError::IndexNotFound => ErrorCode::IndexNotFound,
            PlannerError::SchemaNotFound => ErrorCode::SchemaNotFound,
            PlannerError::InvalidOperation(_) => ErrorCode::InvalidOperation,
            PlannerError::Storage(_) => ErrorCode::Unknown,
        }
    }
}
