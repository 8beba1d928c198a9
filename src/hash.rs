//! Key Hashing Module
//!
//! Maps arbitrary string keys to fixed-length hexadecimal storage identifiers.

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use xxhash_rust::{xxh3, xxh32, xxh64};

use crate::error::CacheError;

// == Hash Algorithm ==
/// Digest algorithms supported for key hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Xxh32,
    Xxh64,
    Xxh3,
    Xxh128,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// All supported algorithms.
    pub const ALL: [HashAlgorithm; 8] = [
        HashAlgorithm::Xxh32,
        HashAlgorithm::Xxh64,
        HashAlgorithm::Xxh3,
        HashAlgorithm::Xxh128,
        HashAlgorithm::Sha224,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
    ];

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Xxh32 => "xxh32",
            HashAlgorithm::Xxh64 => "xxh64",
            HashAlgorithm::Xxh3 => "xxh3",
            HashAlgorithm::Xxh128 => "xxh128",
            HashAlgorithm::Sha224 => "sha224",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    /// Length in hex characters of every identifier this algorithm produces.
    pub fn hex_len(self) -> usize {
        match self {
            HashAlgorithm::Xxh32 => 8,
            HashAlgorithm::Xxh64 | HashAlgorithm::Xxh3 => 16,
            HashAlgorithm::Xxh128 => 32,
            HashAlgorithm::Sha224 => 56,
            HashAlgorithm::Sha256 => 64,
            HashAlgorithm::Sha384 => 96,
            HashAlgorithm::Sha512 => 128,
        }
    }

    fn digest(self, data: &[u8]) -> String {
        match self {
            HashAlgorithm::Xxh32 => format!("{:08x}", xxh32::xxh32(data, 0)),
            HashAlgorithm::Xxh64 => format!("{:016x}", xxh64::xxh64(data, 0)),
            HashAlgorithm::Xxh3 => format!("{:016x}", xxh3::xxh3_64(data)),
            HashAlgorithm::Xxh128 => format!("{:032x}", xxh3::xxh3_128(data)),
            HashAlgorithm::Sha224 => hex::encode(Sha224::digest(data)),
            HashAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
            HashAlgorithm::Sha384 => hex::encode(Sha384::digest(data)),
            HashAlgorithm::Sha512 => hex::encode(Sha512::digest(data)),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        let wanted = match wanted.as_str() {
            "xxh3_64" | "xxh3-64" => "xxh3",
            "sha-224" => "sha224",
            "sha-256" => "sha256",
            "sha-384" => "sha384",
            "sha-512" => "sha512",
            other => other,
        };
        HashAlgorithm::ALL
            .into_iter()
            .find(|algo| algo.name() == wanted)
            .ok_or_else(|| CacheError::Configuration(format!("Invalid hashing algorithm \"{s}\"")))
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// == Key Hasher ==
/// Deterministic key to identifier mapping, fixed per cache instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyHasher {
    algorithm: HashAlgorithm,
}

impl KeyHasher {
    /// Creates a hasher for an already parsed algorithm.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Creates a hasher from an algorithm name.
    ///
    /// Fails with `CacheError::Configuration` for unsupported names.
    pub fn from_name(name: &str) -> Result<Self, CacheError> {
        Ok(Self::new(name.parse()?))
    }

    /// Returns the configured algorithm.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hashes `key` into its lowercase hex identifier.
    pub fn hash(&self, key: &str) -> String {
        self.algorithm.digest(key.as_bytes())
    }
}

impl Default for KeyHasher {
    fn default() -> Self {
        Self::new(HashAlgorithm::Xxh3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let hasher = KeyHasher::default();
        assert_eq!(hasher.hash("user:42"), hasher.hash("user:42"));
    }

    #[test]
    fn test_hash_different_keys_differ() {
        let hasher = KeyHasher::default();
        assert_ne!(hasher.hash("a"), hasher.hash("b"));
    }

    #[test]
    fn test_hash_fixed_length_per_algorithm() {
        for algo in HashAlgorithm::ALL {
            let hasher = KeyHasher::new(algo);
            for key in ["", "k", "a much longer key with spaces / and slashes"] {
                let id = hasher.hash(key);
                assert_eq!(id.len(), algo.hex_len(), "{algo} on {key:?}");
                assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
            }
        }
    }

    #[test]
    fn test_sha256_known_vector() {
        let hasher = KeyHasher::from_name("sha256").unwrap();
        assert_eq!(
            hasher.hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_from_name_aliases() {
        assert_eq!("SHA-256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("xxh3_64".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Xxh3);
        assert_eq!(" xxh128 ".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Xxh128);
    }

    #[test]
    fn test_from_name_unsupported() {
        let err = KeyHasher::from_name("crc99").unwrap_err();
        assert!(matches!(err, CacheError::Configuration(_)));
        assert!(err.to_string().contains("crc99"));
    }

    #[test]
    fn test_display_roundtrips_name() {
        for algo in HashAlgorithm::ALL {
            assert_eq!(algo.to_string().parse::<HashAlgorithm>().unwrap(), algo);
        }
    }
}
