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

use graphd_protos::ids::PartId;

/// `hashToPart`: routes a vertex id to its owning partition. Partitions are
/// 1-indexed, so the hash lands in `[1, part_count]`.
pub fn hash_to_part(vid: &[u8], part_count: u32) -> Option<PartId> {
    if part_count == 0 {
        return None;
    }
    let hash = xxhash_rust::xxh3::xxh3_64(vid);
    Some(PartId((hash % part_count as u64) as u32 + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_to_part_is_in_range_and_deterministic() {
        let a = hash_to_part(b"alice", 16).unwrap();
        let b = hash_to_part(b"alice", 16).unwrap();
        assert_eq!(a, b);
        assert!(a.0 >= 1 && a.0 <= 16);
    }

    #[test]
    fn test_zero_partitions_is_none() {
        assert!(hash_to_part(b"alice", 0).is_none());
    }
}
