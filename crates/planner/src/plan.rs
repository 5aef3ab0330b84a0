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

//! Plan-shape compilation: `lookupIndex` always starts with `IndexScan`, optionally
//! fetches the base row (`IndexVertex`/`IndexEdge`), optionally filters (`IndexFilter`), and always
//! ends in `IndexOutput`. Which optional nodes appear is decided once, up front, from whether the
//! requested yield columns are covered by the index fields and whether the context carries a
//! filter — never re-decided per row.

use graphd_protos::ids::IndexId;
use graphd_protos::ids::SchemaId;
use graphd_protos::request::IndexQueryContext;
use graphd_protos::request::LookupIndexRequest;
use graphd_protos::schema::IndexItem;

use crate::catalog::SchemaCatalog;
use crate::error::PlannerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanNodeKind {
    IndexScan,
    IndexVertex,
    IndexEdge,
    IndexFilter,
    IndexOutput,
}

/// The reserved columns always available straight off an index entry, without a data fetch.
pub fn is_reserved_column(is_edge: bool, name: &str) -> bool {
    if is_edge {
        matches!(name, "_src" | "_ranking" | "_dst")
    } else {
        name == "_vid"
    }
}

/// Whether satisfying `return_columns` requires fetching the base row in addition to the index
/// entry: true as soon as one requested column is neither a reserved column nor an index field.
fn needs_data(is_edge: bool, return_columns: &Option<Vec<String>>, index: &IndexItem) -> bool {
    match return_columns {
        None => false,
        Some(cols) => cols.iter().any(|c| {
            !is_reserved_column(is_edge, c) && !index.fields.iter().any(|f| &f.name == c)
        }),
    }
}

#[derive(Debug, Clone)]
pub struct ContextPlan {
    pub index_id: IndexId,
    pub index: IndexItem,
    pub nodes: Vec<PlanNodeKind>,
    pub needs_data: bool,
    pub needs_filter: bool,
}

#[derive(Debug, Clone)]
pub struct Plan {
    pub is_edge: bool,
    pub schema_id: SchemaId,
    pub context_plans: Vec<ContextPlan>,
    pub column_names: Vec<String>,
}

fn build_column_names(is_edge: bool, return_columns: &Option<Vec<String>>) -> Vec<String> {
    let mut names = if is_edge {
        vec!["_src".to_string(), "_ranking".to_string(), "_dst".to_string()]
    } else {
        vec!["_vid".to_string()]
    };
    if let Some(cols) = return_columns {
        for col in cols {
            if !is_reserved_column(is_edge, col) {
                names.push(col.clone());
            }
        }
    }
    names
}

pub fn build_plan(
    request: &LookupIndexRequest,
    catalog: &dyn SchemaCatalog,
) -> Result<Plan, PlannerError> {
    let set = &request.indices;
    if set.contexts.is_empty() {
        return Err(PlannerError::InvalidOperation(
            "lookupIndex requires at least one index context".to_string(),
        ));
    }

    let mut context_plans = Vec::with_capacity(set.contexts.len());
    for ctx in &set.contexts {
        let index = catalog
            .find_index(request.space_id, set.is_edge, set.tag_or_edge_id, ctx.index_id)
            .ok_or(PlannerError::IndexNotFound)?;

        let needs_data = needs_data(set.is_edge, &request.return_columns, &index);
        if needs_data
            && catalog
                .schema_version(request.space_id, set.tag_or_edge_id, set.is_edge)
                .is_none()
        {
            return Err(PlannerError::SchemaNotFound);
        }
        let needs_filter = ctx.filter.is_some();

        let mut nodes = vec![PlanNodeKind::IndexScan];
        if needs_data {
            nodes.push(if set.is_edge {
                PlanNodeKind::IndexEdge
            } else {
                PlanNodeKind::IndexVertex
            });
        }
        if needs_filter {
            nodes.push(PlanNodeKind::IndexFilter);
        }
        nodes.push(PlanNodeKind::IndexOutput);

        context_plans.push(ContextPlan {
            index_id: ctx.index_id,
            index,
            nodes,
            needs_data,
            needs_filter,
        });
    }

    Ok(Plan {
        is_edge: set.is_edge,
        schema_id: set.tag_or_edge_id,
        context_plans,
        column_names: build_column_names(set.is_edge, &request.return_columns),
    })
}

pub fn context_of<'a>(request: &'a LookupIndexRequest, index_id: IndexId) -> Option<&'a IndexQueryContext> {
    request.indices.contexts.iter().find(|c| c.index_id == index_id)
}

#[cfg(test)]
mod tests {
    use graphd_protos::ids::SpaceId;
    use graphd_protos::property::ColumnDef;
    use graphd_protos::property::ColumnType;
    use graphd_protos::request::IndexQuerySet;
    use graphd_protos::schema::SchemaVersion;

    use super::*;
    use crate::catalog::StaticCatalog;

    fn tag_schema() -> SchemaVersion {
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

    fn index() -> IndexItem {
        IndexItem::new(
            IndexId(100),
            SchemaId(10),
            false,
            vec![
                ColumnDef::new("c1", ColumnType::Int, false),
                ColumnDef::new("c2", ColumnType::Int, false),
            ],
        )
    }

    fn catalog() -> StaticCatalog {
        StaticCatalog::new(vec![tag_schema()], vec![index()])
    }

    fn request(return_columns: Option<Vec<String>>, with_filter: bool) -> LookupIndexRequest {
        LookupIndexRequest {
            space_id: SpaceId(1),
            indices: IndexQuerySet {
                is_edge: false,
                tag_or_edge_id: SchemaId(10),
                contexts: vec![IndexQueryContext {
                    index_id: IndexId(100),
                    hints: vec![],
                    filter: if with_filter {
                        Some(graphd_protos::filter::Expr::Literal(
                            graphd_protos::property::PropValue::Bool(true),
                        ))
                    } else {
                        None
                    },
                }],
            },
            return_columns,
        }
    }

    #[test]
    fn test_indexed_only_shape() {
        let plan = build_plan(&request(Some(vec!["c1".to_string(), "c2".to_string()]), false), &catalog())
            .unwrap();
        assert_eq!(
            plan.context_plans[0].nodes,
            vec![PlanNodeKind::IndexScan, PlanNodeKind::IndexOutput]
        );
    }

    #[test]
    fn test_needs_data_shape() {
        let plan = build_plan(&request(Some(vec!["c3".to_string()]), false), &catalog()).unwrap();
        assert_eq!(
            plan.context_plans[0].nodes,
            vec![PlanNodeKind::IndexScan, PlanNodeKind::IndexVertex, PlanNodeKind::IndexOutput]
        );
    }

    #[test]
    fn test_needs_filter_only_shape() {
        let plan = build_plan(&request(Some(vec!["c1".to_string()]), true), &catalog()).unwrap();
        assert_eq!(
            plan.context_plans[0].nodes,
            vec![PlanNodeKind::IndexScan, PlanNodeKind::IndexFilter, PlanNodeKind::IndexOutput]
        );
    }

    #[test]
    fn test_needs_data_and_filter_shape() {
        let plan = build_plan(&request(Some(vec!["c3".to_string()]), true), &catalog()).unwrap();
        assert_eq!(
            plan.context_plans[0].nodes,
            vec![
                PlanNodeKind::IndexScan,
                PlanNodeKind::IndexVertex,
                PlanNodeKind::IndexFilter,
                PlanNodeKind::IndexOutput
            ]
        );
    }

    #[test]
    fn test_unknown_index_is_rejected() {
        let mut req = request(None, false);
        req.indices.contexts[0].index_id = IndexId(999);
        assert!(matches!(
            build_plan(&req, &catalog()),
            Err(PlannerError::IndexNotFound)
        ));
    }
}
