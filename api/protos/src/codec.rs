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

//! A stand-in row encoder/decoder (`RowWriterV2` in the distilled spec).
//!
//! The real binary key/row codec is explicitly out of scope: this module exists only so
//! the lookup planner's data-fetch nodes and the atomic edge writer have something concrete to
//! call, with the same fault taxonomy (`WriteFault`) the spec's encoder contract names. It encodes
//! a row as the schema's column values in declaration order; unset nullable columns encode as
//! `PropValue::Null`, unset non-nullable columns without a default are a [`WriteFault::FieldUnset`].

use serde::Deserialize;
use serde::Serialize;

use crate::property::PropValue;
use crate::schema::SchemaVersion;
use crate::schema::WriteFault;

/// Encodes `props` (an unordered set of column-name/value pairs) against `schema`, in column
/// declaration order, returning a [`WriteFault`] on mismatch.
pub fn encode_row(
    schema: &SchemaVersion,
    props: &[(String, PropValue)],
) -> Result<Vec<u8>, WriteFault> {
    for (name, _) in props {
        if schema.column(name).is_none() {
            return Err(WriteFault::UnknownField);
        }
    }

    let mut ordered = Vec::with_capacity(schema.columns.len());
    for column in &schema.columns {
        let supplied = props.iter().find(|(name, _)| name == &column.name);
        let value = match supplied {
            Some((_, value)) => {
                match value {
                    PropValue::Null if !column.nullable => return Err(WriteFault::NotNullable),
                    PropValue::Null => {}
                    other => {
                        let Some(value_type) = other.column_type() else {
                            unreachable!("non-null PropValue always has a column_type")
                        };
                        if value_type != column.r#type {
                            return Err(WriteFault::TypeMismatch);
                        }
                    }
                }
                value.clone()
            }
            None => match &column.default {
                Some(default) => default.clone(),
                None if column.nullable => PropValue::Null,
                None => return Err(WriteFault::FieldUnset),
            },
        };
        ordered.push(value);
    }

    RowEnvelope { values: ordered }
        .to_bytes()
        .map_err(|_| WriteFault::IncorrectValue)
}

/// Decodes a row previously produced by [`encode_row`] against the same schema version, returning
/// the column values in declaration order.
pub fn decode_row(schema: &SchemaVersion, bytes: &[u8]) -> Option<Vec<PropValue>> {
    let envelope = RowEnvelope::from_bytes(bytes).ok()?;
    if envelope.values.len() != schema.columns.len() {
        return None;
    }
    Some(envelope.values)
}

#[derive(Debug, Serialize, Deserialize)]
struct RowEnvelope {
    values: Vec<PropValue>,
}

impl RowEnvelope {
    fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::ColumnType;
    use crate::property::ColumnDef;

    fn schema() -> SchemaVersion {
        SchemaVersion {
            schema_id: crate::ids::SchemaId(1),
            version: 1,
            name: "person".to_string(),
            is_edge: false,
            columns: vec![
                ColumnDef::new("name", ColumnType::String, false),
                ColumnDef::new("age", ColumnType::Int, true),
            ],
        }
    }

    #[test]
    fn test_roundtrip() {
        let schema = schema();
        let props = vec![
            ("name".to_string(), PropValue::String("ann".to_string())),
            ("age".to_string(), PropValue::Int(30)),
        ];
        let bytes = encode_row(&schema, &props).unwrap();
        let decoded = decode_row(&schema, &bytes).unwrap();
        assert_eq!(
            decoded,
            vec![PropValue::String("ann".to_string()), PropValue::Int(30)]
        );
    }

    #[test]
    fn test_unset_nullable_defaults_to_null() {
        let schema = schema();
        let props = vec![("name".to_string(), PropValue::String("ann".to_string()))];
        let bytes = encode_row(&schema, &props).unwrap();
        let decoded = decode_row(&schema, &bytes).unwrap();
        assert_eq!(decoded[1], PropValue::Null);
    }

    #[test]
    fn test_unset_non_nullable_is_field_unset() {
        let schema = schema();
        let props = vec![("age".to_string(), PropValue::Int(1))];
        assert_eq!(encode_row(&schema, &props), Err(WriteFault::FieldUnset));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let schema = schema();
        let props = vec![
            ("name".to_string(), PropValue::String("ann".to_string())),
            ("nickname".to_string(), PropValue::String("a".to_string())),
        ];
        assert_eq!(encode_row(&schema, &props), Err(WriteFault::UnknownField));
    }

    #[test]
    fn test_type_mismatch_is_rejected() {
        let schema = schema();
        let props = vec![("name".to_string(), PropValue::Int(1))];
        assert_eq!(encode_row(&schema, &props), Err(WriteFault::TypeMismatch));
    }
}
