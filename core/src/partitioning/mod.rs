//! Client-side partition routing.
//!
//! Maps application-level partition keys to backend collection endpoints
//! with approximately even load and minimal remapping when the collection
//! set changes. The default strategy is consistent hashing: each
//! collection gets a number of virtual nodes on a ring ([`ring`]), keys
//! hash onto the ring with 32-bit MurmurHash3 ([`murmur`]), and
//! [`hash_resolver`] routes whole documents. [`range_resolver`] offers
//! ordered key-range routing as an alternative.

pub mod hash_resolver;
pub mod murmur;
pub mod range_resolver;
pub mod ring;

pub use hash_resolver::{
    DEFAULT_VIRTUAL_NODES_PER_COLLECTION, HashPartitionResolver, PartitionKeyExtractor,
    field_extractor,
};
pub use murmur::{Murmur3, RingHash, murmur3_32};
pub use range_resolver::{KeyRange, RangePartitionResolver};
pub use ring::ConsistentHashRing;

use thiserror::Error;

/// Errors raised while building or querying partition resolvers.
#[derive(Debug, Error)]
pub enum PartitionError {
    /// No collections were supplied; routing has nowhere to go.
    #[error("cannot build a partition resolver with no collections")]
    EmptyRing,

    /// Each collection needs at least one virtual node on the ring.
    #[error("virtual node count must be greater than zero")]
    NoVirtualNodes,

    /// The extractor found no partition key in the document.
    #[error("document has no partition key")]
    MissingPartitionKey,

    /// The key's type is not supported by the chosen resolver.
    #[error("partition key type is not supported by this resolver")]
    UnsupportedKeyType,

    /// No configured range contains the key.
    #[error("no partition range contains key '{key}'")]
    NoMatchingRange { key: String },

    /// More than one configured range contains the key.
    #[error("key '{key}' is contained by {count} overlapping ranges")]
    AmbiguousRange { key: String, count: usize },

    /// A range was declared with its bounds inverted.
    #[error("range low bound '{low}' is greater than high bound '{high}'")]
    InvalidRange { low: String, high: String },
}

/// A partition key value extracted from a document.
///
/// Keys are hashed by their byte form: UTF-8 for strings, IEEE-754
/// little-endian for numbers.
#[derive(Debug, Clone, PartialEq)]
pub enum PartitionKey {
    String(String),
    Number(f64),
}

impl PartitionKey {
    /// The raw bytes fed to the ring hash.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            PartitionKey::String(s) => s.as_bytes().to_vec(),
            PartitionKey::Number(n) => n.to_le_bytes().to_vec(),
        }
    }
}

impl From<&str> for PartitionKey {
    fn from(value: &str) -> Self {
        PartitionKey::String(value.to_string())
    }
}

impl From<String> for PartitionKey {
    fn from(value: String) -> Self {
        PartitionKey::String(value)
    }
}

impl From<f64> for PartitionKey {
    fn from(value: f64) -> Self {
        PartitionKey::Number(value)
    }
}

impl From<i64> for PartitionKey {
    fn from(value: i64) -> Self {
        PartitionKey::Number(value as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_key_bytes_are_utf8() {
        let key = PartitionKey::from("documentdb");
        assert_eq!(key.to_bytes(), b"documentdb".to_vec());

        let key = PartitionKey::from("azure");
        assert_eq!(key.to_bytes(), b"azure".to_vec());
    }

    #[test]
    fn test_number_key_bytes_are_le_doubles() {
        let key = PartitionKey::from(374.0);
        assert_eq!(key.to_bytes(), 374.0_f64.to_le_bytes().to_vec());

        // Integer keys take the same byte form as the equivalent double.
        let key = PartitionKey::from(374_i64);
        assert_eq!(key.to_bytes(), 374.0_f64.to_le_bytes().to_vec());
    }
}
