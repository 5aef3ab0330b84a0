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

//! Row-key construction for the composite edge key: a positive `edge_type` addresses the
//! out-edge row living in `src_vid`'s partition; its negation addresses the in-edge row living in
//! `dst_vid`'s partition. Both helpers below key off the *owning* vertex id first, so a partition
//! scan by vid finds both a vertex's out-edges and in-edges without a secondary index.
//!
//! This is a stand-in for the real binary key format: it exists so the atomic edge writer
//! (`crates/processor`) and the lookup planner's edge-fetch node (`crates/planner`) agree on one
//! scheme.

use crate::request::EdgeKey;

fn encode_raw(lead_vid: &[u8], edge_type: i32, rank: i64, other_vid: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + lead_vid.len() + 4 + 8 + 4 + other_vid.len());
    buf.extend_from_slice(&(lead_vid.len() as u32).to_be_bytes());
    buf.extend_from_slice(lead_vid);
    buf.extend_from_slice(&edge_type.to_be_bytes());
    buf.extend_from_slice(&rank.to_be_bytes());
    buf.extend_from_slice(&(other_vid.len() as u32).to_be_bytes());
    buf.extend_from_slice(other_vid);
    buf
}

/// The key under which the out-edge row is stored, in `src_vid`'s owning partition.
pub fn out_edge_row_key(key: &EdgeKey) -> Vec<u8> {
    encode_raw(&key.src_vid, key.edge_type, key.rank, &key.dst_vid)
}

/// The key under which the in-edge row is stored, in `dst_vid`'s owning partition. Same rank, same
/// two vertex ids, but the sign of `edge_type` flips and the lead vertex is the destination.
pub fn in_edge_row_key(key: &EdgeKey) -> Vec<u8> {
    encode_raw(&key.dst_vid, -key.edge_type, key.rank, &key.src_vid)
}

/// The key prefix under which all edges owned by `vid` live, regardless of edge type or rank —
/// used to scan a vertex's out-edges (`vid` as lead, positive types) or in-edges (`vid` as lead,
/// negative types).
pub fn vertex_edge_prefix(vid: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + vid.len());
    buf.extend_from_slice(&(vid.len() as u32).to_be_bytes());
    buf.extend_from_slice(vid);
    buf
}

/// The key under which a vertex's tag row is stored: the vid itself. Kept as a named function
/// (rather than inlining `vid.clone()` at call sites) so the row-key scheme reads as one system.
pub fn vertex_row_key(vid: &[u8]) -> Vec<u8> {
    vid.to_vec()
}

/// Inverse of [`encode_raw`]: splits an edge row key back into `(lead_vid, edge_type, rank,
/// other_vid)`. Used by the lookup planner's `IndexEdge` node to recover `_src`/`_ranking`/`_dst`
/// from a base row key it did not itself construct.
pub fn decode_edge_row_key(bytes: &[u8]) -> Option<(Vec<u8>, i32, i64, Vec<u8>)> {
    let lead_len = u32::from_be_bytes(bytes.get(0..4)?.try_into().ok()?) as usize;
    let mut cursor = 4;
    let lead_vid = bytes.get(cursor..cursor + lead_len)?.to_vec();
    cursor += lead_len;
    let edge_type = i32::from_be_bytes(bytes.get(cursor..cursor + 4)?.try_into().ok()?);
    cursor += 4;
    let rank = i64::from_be_bytes(bytes.get(cursor..cursor + 8)?.try_into().ok()?);
    cursor += 8;
    let other_len = u32::from_be_bytes(bytes.get(cursor..cursor + 4)?.try_into().ok()?) as usize;
    cursor += 4;
    let other_vid = bytes.get(cursor..cursor + other_len)?.to_vec();
    Some((lead_vid, edge_type, rank, other_vid))
}

/// Normalizes a decoded edge row key to `(src_vid, rank, dst_vid)` regardless of whether it was an
/// out-edge or in-edge row: a negative `edge_type` means the lead vertex was the destination.
pub fn normalize_src_rank_dst(
    lead_vid: Vec<u8>,
    edge_type: i32,
    rank: i64,
    other_vid: Vec<u8>,
) -> (Vec<u8>, i64, Vec<u8>) {
    if edge_type >= 0 {
        (lead_vid, rank, other_vid)
    } else {
        (other_vid, rank, lead_vid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge() -> EdgeKey {
        EdgeKey {
            src_vid: b"alice".to_vec(),
            edge_type: 5,
            rank: 0,
            dst_vid: b"bob".to_vec(),
        }
    }

    #[test]
    fn test_out_and_in_keys_differ_and_share_no_accidental_prefix_collision() {
        let key = edge();
        let out = out_edge_row_key(&key);
        let inn = in_edge_row_key(&key);
        assert_ne!(out, inn);
        assert!(out.starts_with(&vertex_edge_prefix(b"alice")));
        assert!(inn.starts_with(&vertex_edge_prefix(b"bob")));
    }

    #[test]
    fn test_decode_and_normalize_out_and_in_edge_keys() {
        let key = edge();
        let out = out_edge_row_key(&key);
        let (lead, etype, rank, other) = decode_edge_row_key(&out).unwrap();
        let (src, rank, dst) = normalize_src_rank_dst(lead, etype, rank, other);
        assert_eq!((src, rank, dst), (key.src_vid.clone(), key.rank, key.dst_vid.clone()));

        let inn = in_edge_row_key(&key);
        let (lead, etype, rank, other) = decode_edge_row_key(&inn).unwrap();
        let (src, rank, dst) = normalize_src_rank_dst(lead, etype, rank, other);
        assert_eq!((src, rank, dst), (key.src_vid, key.rank, key.dst_vid));
    }

    #[test]
    fn test_in_edge_key_has_negated_type() {
        let key = edge();
        let inn = in_edge_row_key(&key);
        // lead vid length(4) + "bob"(3) then the big-endian i32 edge type.
        let type_offset = 4 + 3;
        let encoded = &inn[type_offset..type_offset + 4];
        assert_eq!(i32::from_be_bytes(encoded.try_into().unwrap()), -5);
    }
}
