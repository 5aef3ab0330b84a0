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

//! Index-entry key encoding. A stand-in for the real binary index key format, built only so
//! `IndexScan` has something to scan and `IndexVertex`/`IndexEdge` have a base-row key to
//! resolve.
//!
//! Layout: `index_id (u32 BE)` `[null-bitmap byte, if the index has a nullable field]`
//! `field_0 .. field_n` `base_key_suffix`. Fixed-width fields (`Bool`, `Int`, `Float`, `Date`,
//! `DateTime`) encode as their big-endian bytes; `String`/`List` fields are length-prefixed. A
//! null-bitmap bit of `0` means the corresponding nullable field contributed no bytes.

use graphd_protos::ids::IndexId;
use graphd_protos::property::ColumnType;
use graphd_protos::property::PropValue;
use graphd_protos::request::ColumnHint;
use graphd_protos::schema::IndexItem;

fn encode_value(buf: &mut Vec<u8>, value: &PropValue) {
    match value {
        PropValue::Null => {}
        PropValue::Bool(b) => buf.push(*b as u8),
        PropValue::Int(i) => buf.extend_from_slice(&i.to_be_bytes()),
        PropValue::Float(f) => buf.extend_from_slice(&f.to_bits().to_be_bytes()),
        PropValue::Date(d) => buf.extend_from_slice(&d.to_be_bytes()),
        PropValue::DateTime(dt) => buf.extend_from_slice(&dt.to_be_bytes()),
        PropValue::String(s) => {
            buf.extend_from_slice(&(s.len() as u32).to_be_bytes());
            buf.extend_from_slice(s.as_bytes());
        }
        PropValue::List(items) => {
            let encoded = serde_json::to_vec(items).unwrap_or_default();
            buf.extend_from_slice(&(encoded.len() as u32).to_be_bytes());
            buf.extend_from_slice(&encoded);
        }
    }
}

fn decode_value(r#type: ColumnType, bytes: &[u8]) -> Option<(PropValue, usize)> {
    match r#type {
        ColumnType::Bool => Some((PropValue::Bool(*bytes.first()? != 0), 1)),
        ColumnType::Int => {
            let arr: [u8; 8] = bytes.get(0..8)?.try_into().ok()?;
            Some((PropValue::Int(i64::from_be_bytes(arr)), 8))
        }
        ColumnType::Float => {
            let arr: [u8; 8] = bytes.get(0..8)?.try_into().ok()?;
            Some((PropValue::Float(f64::from_bits(u64::from_be_bytes(arr))), 8))
        }
        ColumnType::Date => {
            let arr: [u8; 4] = bytes.get(0..4)?.try_into().ok()?;
            Some((PropValue::Date(i32::from_be_bytes(arr)), 4))
        }
        ColumnType::DateTime => {
            let arr: [u8; 8] = bytes.get(0..8)?.try_into().ok()?;
            Some((PropValue::DateTime(i64::from_be_bytes(arr)), 8))
        }
        ColumnType::String => {
            let len_bytes: [u8; 4] = bytes.get(0..4)?.try_into().ok()?;
            let len = u32::from_be_bytes(len_bytes) as usize;
            let s = String::from_utf8(bytes.get(4..4 + len)?.to_vec()).ok()?;
            Some((PropValue::String(s), 4 + len))
        }
        ColumnType::List => {
            let len_bytes: [u8; 4] = bytes.get(0..4)?.try_into().ok()?;
            let len = u32::from_be_bytes(len_bytes) as usize;
            let items: Vec<PropValue> = serde_json::from_slice(bytes.get(4..4 + len)?).ok()?;
            Some((PropValue::List(items), 4 + len))
        }
    }
}

fn header(index_id: IndexId) -> Vec<u8> {
    (index_id.0 as u32).to_be_bytes().to_vec()
}

/// Encodes a complete index entry key: one value per field, in declaration order, followed by the
/// base row's key (the vid for a vertex index, or the out/in-edge row key for an edge index).
pub fn encode_entry_key(index: &IndexItem, values: &[PropValue], base_key: &[u8]) -> Vec<u8> {
    let mut buf = header(index.index_id);

    if index.has_nullable_column() {
        let mut bitmap: u8 = 0;
        for (i, field) in index.fields.iter().enumerate() {
            if field.nullable && !matches!(values.get(i), Some(PropValue::Null) | None) {
                bitmap |= 1 << i;
            }
        }
        buf.push(bitmap);
    }

    for value in values {
        encode_value(&mut buf, value);
    }
    buf.extend_from_slice(base_key);
    buf
}

/// Decodes the field values and trailing base-row key out of an index entry key previously built
/// by [`encode_entry_key`] for the same index definition.
pub fn decode_entry_key(index: &IndexItem, key: &[u8]) -> Option<(Vec<PropValue>, Vec<u8>)> {
    let mut cursor = 4; // index_id
    let bitmap = if index.has_nullable_column() {
        let b = *key.get(cursor)?;
        cursor += 1;
        Some(b)
    } else {
        None
    };

    let mut values = Vec::with_capacity(index.fields.len());
    for (i, field) in index.fields.iter().enumerate() {
        let present = match bitmap {
            Some(b) if field.nullable => (b >> i) & 1 == 1,
            _ => true,
        };
        if !present {
            values.push(PropValue::Null);
            continue;
        }
        let (value, width) = decode_value(field.r#type, key.get(cursor..)?)?;
        cursor += width;
        values.push(value);
    }

    Some((values, key.get(cursor..)?.to_vec()))
}

/// Builds the longest scan prefix derivable from `hints` without risking a false negative: walks
/// the index's fields in order, extending the prefix for each leading run of `Equal` hints, and
/// stops at the first field with no hint, a non-`Equal` hint, or (conservatively) if the index has
/// any nullable field at all, since the null-bitmap byte's value cannot be known in advance.
/// Remaining hints are applied by the caller against the decoded field values.
pub fn build_scan_prefix(index: &IndexItem, hints: &[ColumnHint]) -> Vec<u8> {
    let mut buf = header(index.index_id);
    if index.has_nullable_column() {
        return buf;
    }
    for field in &index.fields {
        let Some(ColumnHint::Equal { value, .. }) =
            hints.iter().find(|h| h.column() == field.name)
        else {
            break;
        };
        encode_value(&mut buf, value);
    }
    buf
}

#[cfg(test)]
mod tests {
    use graphd_protos::ids::SchemaId;
    use graphd_protos::property::ColumnDef;

    use super::*;

    fn index() -> IndexItem {
        IndexItem::new(
            IndexId(1),
            SchemaId(1),
            false,
            vec![
                ColumnDef::new("c1", ColumnType::Int, false),
                ColumnDef::new("c2", ColumnType::String, false),
            ],
        )
    }

    #[test]
    fn test_roundtrip_with_variable_length_field() {
        let index = index();
        let values = vec![PropValue::Int(7), PropValue::String("abc".to_string())];
        let key = encode_entry_key(&index, &values, b"vid-1");
        let (decoded, base) = decode_entry_key(&index, &key).unwrap();
        assert_eq!(decoded, values);
        assert_eq!(base, b"vid-1".to_vec());
    }

    #[test]
    fn test_nullable_field_roundtrip() {
        let index = IndexItem::new(
            IndexId(2),
            SchemaId(1),
            false,
            vec![
                ColumnDef::new("c1", ColumnType::Int, false),
                ColumnDef::new("c2", ColumnType::Int, true),
            ],
        );
        let values = vec![PropValue::Int(1), PropValue::Null];
        let key = encode_entry_key(&index, &values, b"vid-2");
        let (decoded, base) = decode_entry_key(&index, &key).unwrap();
        assert_eq!(decoded, values);
        assert_eq!(base, b"vid-2".to_vec());
    }

    #[test]
    fn test_scan_prefix_extends_across_leading_equal_hints() {
        let index = index();
        let hints = vec![
            ColumnHint::Equal {
                column: "c1".to_string(),
                value: PropValue::Int(7),
            },
            ColumnHint::Equal {
                column: "c2".to_string(),
                value: PropValue::String("abc".to_string()),
            },
        ];
        let prefix = build_scan_prefix(&index, &hints);
        let key = encode_entry_key(&index, &[PropValue::Int(7), PropValue::String("abc".to_string())], b"vid-1");
        assert!(key.starts_with(&prefix));
        assert!(prefix.len() > 4);
    }

    #[test]
    fn test_scan_prefix_stops_at_first_unhinted_field() {
        let index = index();
        let hints = vec![ColumnHint::Range {
            column: "c1".to_string(),
            begin: PropValue::Int(0),
            end: PropValue::Int(10),
        }];
        let prefix = build_scan_prefix(&index, &hints);
        assert_eq!(prefix, header(IndexId(1)));
    }
}
