//! Content addressing (§10.7): hashing canonical configuration for slice
//! and scenario identity so identical inputs deterministically reuse the
//! same cache entries.

use sha2::{Digest, Sha256};

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Hashes the canonical JSON encoding of `value`. Callers are responsible
/// for pre-sorting anything order-sensitive (e.g. call-id lists) before
/// passing it in, since struct field order is fixed by the type, not by
/// insertion order of a map.
pub fn hash_json<T: serde::Serialize>(value: &T) -> anyhow::Result<String> {
    let canonical = serde_json::to_vec(value)?;
    Ok(sha256_hex(&canonical))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_input_hashes_identically() {
        let a = hash_json(&vec!["b", "a", "c"]).unwrap();
        let b = hash_json(&vec!["b", "a", "c"]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_input_hashes_differently() {
        let a = hash_json(&vec!["a"]).unwrap();
        let b = hash_json(&vec!["b"]).unwrap();
        assert_ne!(a, b);
    }
}
