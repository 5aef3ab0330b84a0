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

//! Compiles and runs `lookupIndex` plans: `IndexScan` always runs; `IndexVertex` or
//! `IndexEdge` run only when the requested columns are not already covered by the index fields;
//! `IndexFilter` runs only when the context carries a filter; `IndexOutput` always terminates the
//! pipeline, in the fixed column order `_src,_ranking,_dst,<yield...>` for edges or
//! `_vid,<yield...>` for vertices.

mod catalog;
mod error;
mod eval;
mod exec;
mod keycodec;
mod plan;

pub use catalog::SchemaCatalog;
pub use catalog::StaticCatalog;
pub use error::PlannerError;
pub use exec::execute_on_partition;
pub use plan::build_plan;
pub use plan::is_reserved_column;
pub use plan::ContextPlan;
pub use plan::Plan;
pub use plan::PlanNodeKind;
