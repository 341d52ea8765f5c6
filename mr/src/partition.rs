const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a of the key bytes with the sign bit cleared.
///
/// The value is identical on every platform, so a map task and a reduce task
/// running on different machines agree on where a key lives.
pub fn ihash(key: &str) -> u32 {
    let hash = key.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    });
    hash & 0x7fff_ffff
}

/// Bucket in `[0, n)` that `key` is routed to.
///
/// # Panics
///
/// Panics if `n` is zero. Task descriptors are validated before any record is
/// partitioned.
pub fn partition(key: &str, n: usize) -> usize {
    assert!(n > 0, "partition count must be positive");
    ihash(key) as usize % n
}
