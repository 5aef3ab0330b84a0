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

//! Runs a compiled [`Plan`] against one partition: pulls index entries (`IndexScan`), optionally
//! fetches the base row (`IndexVertex`/`IndexEdge`), optionally filters (`IndexFilter`), and
//! assembles `IndexOutput` rows in the plan's fixed column order.

use std::collections::HashMap;

use graphd_kvstore::PartitionStore;
use graphd_kvstore::ScanRequest;
use graphd_protos::ids::PartId;
use graphd_protos::ids::SpaceId;
use graphd_protos::keys;
use graphd_protos::property::PropValue;
use graphd_protos::request::ColumnHint;
use graphd_protos::request::IndexQueryContext;
use graphd_protos::request::LookupIndexResponse;
use graphd_protos::request::ResultRow;
use graphd_protos::schema::SchemaVersion;
use graphd_protos::{codec, request::LookupIndexRequest};

use crate::catalog::SchemaCatalog;
use crate::error::PlannerError;
use crate::eval;
use crate::keycodec;
use crate::plan::build_plan;
use crate::plan::context_of;
use crate::plan::ContextPlan;

fn hint_matches(hint: &ColumnHint, value: &PropValue) -> bool {
    match hint {
        ColumnHint::Equal { value: target, .. } => value == target,
        ColumnHint::Range { begin, end, .. } => {
            matches!(compare_ge(value, begin), Some(true)) && matches!(compare_lt(value, end), Some(true))
        }
        ColumnHint::In { values, .. } => values.contains(value),
    }
}

fn compare_ge(a: &PropValue, b: &PropValue) -> Option<bool> {
    use std::cmp::Ordering;
    eval_compare(a, b).map(|o| o != Ordering::Less)
}

fn compare_lt(a: &PropValue, b: &PropValue) -> Option<bool> {
    use std::cmp::Ordering;
    eval_compare(a, b).map(|o| o == Ordering::Less)
}

fn eval_compare(a: &PropValue, b: &PropValue) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (PropValue::Int(x), PropValue::Int(y)) => x.partial_cmp(y),
        (PropValue::Float(x), PropValue::Float(y)) => x.partial_cmp(y),
        (PropValue::Date(x), PropValue::Date(y)) => x.partial_cmp(y),
        (PropValue::DateTime(x), PropValue::DateTime(y)) => x.partial_cmp(y),
        (PropValue::String(x), PropValue::String(y)) => x.partial_cmp(y),
        _ => None,
    }
}

/// A single candidate row surviving `IndexScan` plus any in-memory hint filtering: the decoded
/// index field values, keyed by column name, plus the opaque base row key.
struct Candidate {
    fields: HashMap<String, PropValue>,
    base_key: Vec<u8>,
}

async fn scan_candidates<S: PartitionStore>(
    store: &S,
    space: SpaceId,
    part: PartId,
    ctx_plan: &ContextPlan,
    ctx: &IndexQueryContext,
) -> Result<Vec<Candidate>, PlannerError> {
    let prefix = keycodec::build_scan_prefix(&ctx_plan.index, &ctx.hints);
    let result = store
        .scan(space, part, ScanRequest::prefix(prefix.clone(), 0))
        .await
        .map_err(|report| PlannerError::Storage(report.to_string()))?;

    let mut candidates = Vec::new();
    for (key, _value) in result.entries {
        let Some((values, base_key)) = keycodec::decode_entry_key(&ctx_plan.index, &key) else {
            continue;
        };
        let fields: HashMap<String, PropValue> = ctx_plan
            .index
            .fields
            .iter()
            .map(|f| f.name.clone())
            .zip(values)
            .collect();

        let satisfies_remaining_hints = ctx.hints.iter().all(|hint| {
            fields
                .get(hint.column())
                .is_some_and(|value| hint_matches(hint, value))
        });
        if !satisfies_remaining_hints {
            continue;
        }
        candidates.push(Candidate { fields, base_key });
    }
    Ok(candidates)
}

fn reserved_values(is_edge: bool, base_key: &[u8]) -> HashMap<String, PropValue> {
    let mut out = HashMap::new();
    if is_edge {
        if let Some((lead, etype, rank, other)) = keys::decode_edge_row_key(base_key) {
            let (src, rank, dst) = keys::normalize_src_rank_dst(lead, etype, rank, other);
            out.insert("_src".to_string(), PropValue::String(String::from_utf8_lossy(&src).into_owned()));
            out.insert("_ranking".to_string(), PropValue::Int(rank));
            out.insert("_dst".to_string(), PropValue::String(String::from_utf8_lossy(&dst).into_owned()));
        }
    } else {
        out.insert(
            "_vid".to_string(),
            PropValue::String(String::from_utf8_lossy(base_key).into_owned()),
        );
    }
    out
}

async fn fetch_data<S: PartitionStore>(
    store: &S,
    space: SpaceId,
    part: PartId,
    schema: &SchemaVersion,
    base_key: &[u8],
) -> Result<Option<HashMap<String, PropValue>>, PlannerError> {
    let Some(bytes) = store
        .get(space, part, base_key.to_vec())
        .await
        .map_err(|report| PlannerError::Storage(report.to_string()))?
    else {
        return Ok(None);
    };
    let Some(values) = codec::decode_row(schema, &bytes) else {
        return Ok(None);
    };
    Ok(Some(
        schema
            .columns
            .iter()
            .map(|c| c.name.clone())
            .zip(values)
            .collect(),
    ))
}

fn project(column_names: &[String], row: &HashMap<String, PropValue>) -> ResultRow {
    ResultRow {
        columns: column_names
            .iter()
            .map(|name| row.get(name).cloned().unwrap_or(PropValue::Null))
            .collect(),
    }
}

/// Runs every context of `request`'s plan against partition `part`, returning the rows it produced
/// there. The caller (typically a fan-out primitive in `graphd-processor`) is responsible for
/// iterating partitions and merging the per-partition responses.
pub async fn execute_on_partition<S: PartitionStore>(
    request: &LookupIndexRequest,
    catalog: &dyn SchemaCatalog,
    store: &S,
    part: PartId,
) -> Result<LookupIndexResponse, PlannerError> {
    let plan = build_plan(request, catalog)?;
    let schema = if plan.context_plans.iter().any(|c| c.needs_data) {
        catalog.schema_version(request.space_id, plan.schema_id, plan.is_edge)
    } else {
        None
    };

    let mut rows = Vec::new();
    for ctx_plan in &plan.context_plans {
        let ctx = context_of(request, ctx_plan.index_id)
            .expect("every context_plan is derived from a request context");
        let candidates =
            scan_candidates(store, request.space_id, part, ctx_plan, ctx).await?;

        for candidate in candidates {
            let mut row = reserved_values(plan.is_edge, &candidate.base_key);
            row.extend(candidate.fields);

            if ctx_plan.needs_data {
                let schema = schema.as_ref().ok_or(PlannerError::SchemaNotFound)?;
                if let Some(data) =
                    fetch_data(store, request.space_id, part, schema, &candidate.base_key).await?
                {
                    row.extend(data);
                } else {
                    continue;
                }
            }

            if ctx_plan.needs_filter {
                let filter = ctx
                    .filter
                    .as_ref()
                    .expect("needs_filter implies ctx.filter is Some");
                if !eval::evaluate(filter, &row) {
                    continue;
                }
            }

            rows.push(project(&plan.column_names, &row));
        }
    }

    Ok(LookupIndexResponse {
        column_names: plan.column_names,
        rows,
        failures: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use graphd_kvstore::MemoryPartitionStore;
    use graphd_protos::ids::HostAddr;
    use graphd_protos::ids::IndexId;
    use graphd_protos::ids::SchemaId;
    use graphd_protos::property::ColumnDef;
    use graphd_protos::property::ColumnType;
    use graphd_protos::request::IndexQueryContext;
    use graphd_protos::request::IndexQuerySet;

    use super::*;
    use crate::catalog::StaticCatalog;

    fn schema() -> SchemaVersion {
        SchemaVersion {
            schema_id: SchemaId(10),
            version: 1,
            name: "t".to_string(),
            is_edge: false,
            columns: vec![
                ColumnDef::new("c1", ColumnType::Int, false),
                ColumnDef::new("c2", ColumnType::Int, false),
                ColumnDef::new("c3", ColumnType::Int, false),
            ],
        }
    }

    fn index() -> graphd_protos::schema::IndexItem {
        graphd_protos::schema::IndexItem::new(
            IndexId(100),
            SchemaId(10),
            false,
            vec![
                ColumnDef::new("c1", ColumnType::Int, false),
                ColumnDef::new("c2", ColumnType::Int, false),
            ],
        )
    }

    async fn seeded_store() -> MemoryPartitionStore {
        let store = MemoryPartitionStore::new();
        store
            .add_part(SpaceId(1), PartId(1), vec![HostAddr::new("h", 9000)])
            .await;

        let index = index();
        let schema = schema();
        for (vid, c1, c2, c3) in [("v1", 1, 2, 100), ("v2", 1, 3, 200), ("v3", 9, 9, 300)] {
            let index_key = keycodec::encode_entry_key(
                &index,
                &[PropValue::Int(c1), PropValue::Int(c2)],
                vid.as_bytes(),
            );
            let row = codec::encode_row(
                &schema,
                &[
                    ("c1".to_string(), PropValue::Int(c1)),
                    ("c2".to_string(), PropValue::Int(c2)),
                    ("c3".to_string(), PropValue::Int(c3)),
                ],
            )
            .unwrap();
            store
                .multi_put(
                    SpaceId(1),
                    PartId(1),
                    vec![(index_key, Vec::new()), (vid.as_bytes().to_vec(), row)],
                )
                .await;
        }
        store
    }

    fn base_request(return_columns: Option<Vec<String>>) -> LookupIndexRequest {
        LookupIndexRequest {
            space_id: SpaceId(1),
            indices: IndexQuerySet {
                is_edge: false,
                tag_or_edge_id: SchemaId(10),
                contexts: vec![IndexQueryContext {
                    index_id: IndexId(100),
                    hints: vec![ColumnHint::Equal {
                        column: "c1".to_string(),
                        value: PropValue::Int(1),
                    }],
                    filter: None,
                }],
            },
            return_columns,
        }
    }

    #[tokio::test]
    async fn test_indexed_only_scan_returns_matching_rows() {
        let store = seeded_store().await;
        let catalog = StaticCatalog::new(vec![schema()], vec![index()]);
        let request = base_request(Some(vec!["c1".to_string(), "c2".to_string()]));
        let response = execute_on_partition(&request, &catalog, &store, PartId(1))
            .await
            .unwrap();
        assert_eq!(response.rows.len(), 2);
        assert_eq!(response.column_names, vec!["_vid", "c1", "c2"]);
    }

    #[tokio::test]
    async fn test_needs_data_fetches_base_row() {
        let store = seeded_store().await;
        let catalog = StaticCatalog::new(vec![schema()], vec![index()]);
        let request = base_request(Some(vec!["c3".to_string()]));
        let response = execute_on_partition(&request, &catalog, &store, PartId(1))
            .await
            .unwrap();
        assert_eq!(response.rows.len(), 2);
        let c3_values: Vec<_> = response
            .rows
            .iter()
            .map(|r| r.columns.last().cloned().unwrap())
            .collect();
        assert!(c3_values.contains(&PropValue::Int(100)));
        assert!(c3_values.contains(&PropValue::Int(200)));
    }

    #[tokio::test]
    async fn test_needs_filter_drops_non_matching_rows() {
        let store = seeded_store().await;
        let catalog = StaticCatalog::new(vec![schema()], vec![index()]);
        let mut request = base_request(None);
        request.indices.contexts[0].filter = Some(graphd_protos::filter::Expr::Eq(
            Box::new(graphd_protos::filter::Expr::Column("c2".to_string())),
            Box::new(graphd_protos::filter::Expr::Literal(PropValue::Int(2))),
        ));
        let response = execute_on_partition(&request, &catalog, &store, PartId(1))
            .await
            .unwrap();
        assert_eq!(response.rows.len(), 1);
    }
}
