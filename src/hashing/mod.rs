//! Key hashing used to spread per-entity state across shards.

/// Computes a 64-bit hash of the input data using BLAKE3, truncated from 256 bits.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

/// Maps `key` onto one of `shard_count` shards.
///
/// `shard_count` must be non-zero.
#[inline]
pub fn shard_index(key: &str, shard_count: usize) -> usize {
    debug_assert!(shard_count > 0, "shard_count must be non-zero");
    (hash_to_u64(key.as_bytes()) % shard_count as u64) as usize
}
