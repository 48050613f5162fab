// API key generation and hashing
// Keys are stored and compared only as SHA-256 digests

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Generates a fresh API key of the form `<prefix>_<64 hex chars>`
///
/// The secret part is 32 bytes from the thread-local CSPRNG, which is
/// seeded from the operating system.
///
/// # Example
/// ```
/// use agentshield_api::auth::api_key::generate_api_key;
///
/// let key = generate_api_key("as");
/// assert!(key.starts_with("as_"));
/// assert_eq!(key.len(), 3 + 64);
/// ```
pub fn generate_api_key(prefix: &str) -> String {
    let mut secret = [0u8; 32];
    rand::rng().fill_bytes(&mut secret);

    format!("{}_{}", prefix, hex::encode(secret))
}

/// Hashes an API key for storage as lowercase SHA-256 hex
///
/// # Example
/// ```
/// use agentshield_api::auth::api_key::hash_api_key;
///
/// assert_eq!(hash_api_key("as_test").len(), 64);
/// ```
pub fn hash_api_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_are_unique() {
        let a = generate_api_key("as");
        let b = generate_api_key("as");

        assert_ne!(a, b);
        assert!(a.starts_with("as_"));
    }

    #[test]
    fn secret_has_no_fixed_bits() {
        let secrets: Vec<Vec<u8>> = (0..64)
            .map(|_| {
                let key = generate_api_key("as");
                hex::decode(&key["as_".len()..]).unwrap()
            })
            .collect();

        assert!(secrets.iter().all(|s| s.len() == 32));
        // A v4 UUID pins the version nibble of byte 6 and the variant bits of byte 8.
        for offset in [0, 16] {
            assert!(secrets.iter().any(|s| s[offset + 6] >> 4 != 0x4));
            assert!(secrets.iter().any(|s| s[offset + 8] >> 6 != 0b10));
        }
    }

    #[test]
    fn custom_prefix() {
        assert!(generate_api_key("live").starts_with("live_"));
    }

    #[test]
    fn hash_is_stable_sha256_hex() {
        assert_eq!(
            hash_api_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash_api_key("abc"), hash_api_key("abc"));
        assert_ne!(hash_api_key("abc"), hash_api_key("abd"));
    }
}
