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

//! The storage-daemon write path: the base fan-out primitive every multi-partition write is built
//! on, the atomic cross-partition edge writer, and `updateVertex`.

mod base;
mod catalog;
mod edge_writer;
mod hash;
mod txn;
mod update_vertex;

pub use base::run_fanout;
pub use catalog::MetaCatalog;
pub use catalog::StaticCatalog;
pub use edge_writer::add_edges_atomic;
pub use hash::hash_to_part;
pub use txn::Chain;
pub use txn::TransactionManager;
pub use txn::TwoPhasePartStore;
pub use update_vertex::update_vertex;
