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

/// A property value carried in a row, an index key, or a filter literal.
///
/// Closed over the property types a column can declare (see [`ColumnType`]); the row encoder and
/// the filter evaluator both produce and consume this type exclusively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Days since the epoch.
    Date(i32),
    /// Milliseconds since the epoch, UTC.
    DateTime(i64),
    List(Vec<PropValue>),
}

impl PropValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            PropValue::Null => "null",
            PropValue::Bool(_) => "bool",
            PropValue::Int(_) => "int",
            PropValue::Float(_) => "float",
            PropValue::String(_) => "string",
            PropValue::Date(_) => "date",
            PropValue::DateTime(_) => "datetime",
            PropValue::List(_) => "list",
        }
    }

    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            PropValue::Null => None,
            PropValue::Bool(_) => Some(ColumnType::Bool),
            PropValue::Int(_) => Some(ColumnType::Int),
            PropValue::Float(_) => Some(ColumnType::Float),
            PropValue::String(_) => Some(ColumnType::String),
            PropValue::Date(_) => Some(ColumnType::Date),
            PropValue::DateTime(_) => Some(ColumnType::DateTime),
            PropValue::List(_) => Some(ColumnType::List),
        }
    }

    /// Whether this is a variable-length encoding (contributes a string-style segment to an
    /// index key), matching the planner's `vColNum` bookkeeping in `crates/planner`.
    pub fn is_variable_length(&self) -> bool {
        matches!(self, PropValue::String(_) | PropValue::List(_))
    }
}

/// The declarable type of a column, independent of any particular value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Bool,
    Int,
    Float,
    String,
    Date,
    DateTime,
    List,
}

impl ColumnType {
    /// Whether values of this type contribute a variable-length segment to an encoded index key.
    pub fn is_variable_length(&self) -> bool {
        matches!(self, ColumnType::String | ColumnType::List)
    }
}

/// A single column in a tag or edge-type schema version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub r#type: ColumnType,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<PropValue>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, r#type: ColumnType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            r#type,
            nullable,
            default: None,
        }
    }

    pub fn with_default(mut self, default: PropValue) -> Self {
        self.default = Some(default);
        self
    }
}
