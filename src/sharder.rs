//! Deterministic bucketing of identities.
//!
//! Buckets are computed with MurmurHash3 (x86, 32-bit) over `"{group}:{identity}"`, so the same
//! pair lands in the same bucket across restarts and across client implementations sharing the
//! same backend.

/// Seed used when hashing for weighted variant selection.
pub const VARIANT_HASH_SEED: u32 = 86028157;

/// Hash `"{group_id}:{identity}"` with the given seed.
pub fn hash(identity: &str, group_id: &str, seed: u32) -> u32 {
    let input = format!("{group_id}:{identity}");
    murmur3::murmur3_32(&mut input.as_bytes(), seed)
        .expect("reading from an in-memory buffer should not fail")
}

/// Bucket in `1..=100` used by percentage rollouts.
pub fn normalized_strategy_value(identity: &str, group_id: &str) -> u32 {
    hash(identity, group_id, 0) % 100 + 1
}

/// Bucket in `1..=total_weight` used by weighted variant selection.
///
/// Returns `0` when `total_weight` is zero, which never reaches a positive cumulative weight.
///
/// The total is a `u64` since the sum of `u32` variant weights may exceed `u32::MAX`.
pub fn normalized_variant_value(identity: &str, group_id: &str, total_weight: u64) -> u64 {
    if total_weight == 0 {
        return 0;
    }
    u64::from(hash(identity, group_id, VARIANT_HASH_SEED)) % total_weight + 1
}
