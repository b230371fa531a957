//! Deterministic fingerprints for names
//!
//! Fallback file names depend on these values, so the function must not
//! change between releases: a name hashed today has to resolve to the same
//! file next run.

/// Fingerprint of a string: first 8 bytes of its blake3 digest (LE).
pub fn hash_string(text: &str) -> u64 {
    hash_bytes(text.as_bytes())
}

fn hash_bytes(bytes: &[u8]) -> u64 {
    let digest = blake3::hash(bytes);
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(prefix)
}
