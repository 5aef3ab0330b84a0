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

mod error;
mod memory;
mod partition;
mod store;

pub use error::KvError;
pub use memory::MemoryPartitionStore;
pub use partition::PartitionManager;
pub use store::PartitionStore;
pub use store::ScanRequest;
pub use store::ScanResult;

#[cfg(any(test, feature = "test"))]
mod fault;
#[cfg(any(test, feature = "test"))]
pub use fault::FaultInjectingPartitionStore;
#[cfg(any(test, feature = "test"))]
pub use fault::FaultRule;
