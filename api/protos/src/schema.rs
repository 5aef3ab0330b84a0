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

use crate::ids::SchemaId;
use crate::property::ColumnDef;

/// A single immutable version of a tag or edge-type schema. New versions append; they never
/// mutate a previously issued version in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaVersion {
    pub schema_id: SchemaId,
    pub version: i32,
    pub name: String,
    pub is_edge: bool,
    pub columns: Vec<ColumnDef>,
}

impl SchemaVersion {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// A secondary index over a prefix of a tag's or edge type's columns.
///
/// The field list is encoded as an index-key prefix; [`Self::variable_length_count`] and
/// [`Self::has_nullable_column`] are precomputed because decoding an index key requires knowing
/// the position of each variable-length (string/list) segment and whether a null-bitmap suffix is
/// present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexItem {
    pub index_id: crate::ids::IndexId,
    pub schema_id: SchemaId,
    pub is_edge: bool,
    pub fields: Vec<ColumnDef>,
}

impl IndexItem {
    pub fn new(
        index_id: crate::ids::IndexId,
        schema_id: SchemaId,
        is_edge: bool,
        fields: Vec<ColumnDef>,
    ) -> Self {
        Self {
            index_id,
            schema_id,
            is_edge,
            fields,
        }
    }

    /// Count of variable-length (string/list) columns in the field list, `vColNum` in the
    /// planner's own bookkeeping.
    pub fn variable_length_count(&self) -> usize {
        self.fields
            .iter()
            .filter(|f| f.r#type.is_variable_length())
            .count()
    }

    pub fn has_nullable_column(&self) -> bool {
        self.fields.iter().any(|f| f.nullable)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

/// A fault raised by the row encoder (`RowWriterV2` in the distilled spec) when a property map
/// cannot be encoded against a schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteFault {
    UnknownField,
    NotNullable,
    TypeMismatch,
    FieldUnset,
    OutOfRange,
    IncorrectValue,
}
