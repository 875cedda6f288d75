//! Hash-based partition resolver routing documents across collections.

use super::ring::ConsistentHashRing;
use super::{PartitionError, PartitionKey};
use serde_json::Value;

/// Number of virtual nodes assigned to each collection by default.
pub const DEFAULT_VIRTUAL_NODES_PER_COLLECTION: usize = 128;

/// Extracts the partition key from an application document.
pub type PartitionKeyExtractor = Box<dyn Fn(&Value) -> Option<PartitionKey> + Send + Sync>;

/// Routes documents to collections by consistent-hashing their partition
/// key.
///
/// The ring is built once at construction; resolution afterwards is
/// read-only and deterministic.
pub struct HashPartitionResolver {
    extractor: PartitionKeyExtractor,
    ring: ConsistentHashRing,
}

impl HashPartitionResolver {
    /// Create a resolver with the default virtual node count.
    pub fn new(
        extractor: PartitionKeyExtractor,
        collection_links: Vec<String>,
    ) -> Result<Self, PartitionError> {
        Self::with_virtual_nodes(
            extractor,
            collection_links,
            DEFAULT_VIRTUAL_NODES_PER_COLLECTION,
        )
    }

    /// Create a resolver with an explicit per-collection virtual node
    /// count.
    pub fn with_virtual_nodes(
        extractor: PartitionKeyExtractor,
        collection_links: Vec<String>,
        virtual_nodes_per_collection: usize,
    ) -> Result<Self, PartitionError> {
        Ok(Self {
            extractor,
            ring: ConsistentHashRing::new(collection_links, virtual_nodes_per_collection)?,
        })
    }

    /// Resolve the collection a new document should be written to.
    ///
    /// Fails when the extractor finds no partition key in the document.
    pub fn resolve_for_create(&self, document: &Value) -> Result<&str, PartitionError> {
        let key = (self.extractor)(document).ok_or(PartitionError::MissingPartitionKey)?;
        Ok(self.ring.resolve(&key))
    }

    /// Resolve the collections a read with the given key must consult.
    ///
    /// Without a key the read fans out to every collection; with one it
    /// targets the single owning collection.
    pub fn resolve_for_read(&self, key: Option<&PartitionKey>) -> Vec<&str> {
        match key {
            None => self
                .ring
                .collections()
                .iter()
                .map(String::as_str)
                .collect(),
            Some(key) => vec![self.ring.resolve(key)],
        }
    }
}

impl std::fmt::Debug for HashPartitionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashPartitionResolver")
            .field("ring", &self.ring)
            .finish()
    }
}

/// Extractor reading a top-level document field as the partition key.
///
/// String fields become string keys; numeric fields become number keys.
pub fn field_extractor(field: &'static str) -> PartitionKeyExtractor {
    Box::new(move |document| match document.get(field) {
        Some(Value::String(s)) => Some(PartitionKey::from(s.as_str())),
        Some(Value::Number(n)) => n.as_f64().map(PartitionKey::from),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn links() -> Vec<String> {
        vec![
            "dbs/db/colls/coll0".to_string(),
            "dbs/db/colls/coll1".to_string(),
            "dbs/db/colls/coll2".to_string(),
        ]
    }

    #[test]
    fn test_create_and_read_agree() {
        let resolver = HashPartitionResolver::new(field_extractor("id"), links()).unwrap();
        let document = json!({"id": "doc-42", "body": "payload"});

        let create_target = resolver.resolve_for_create(&document).unwrap();
        let read_targets = resolver.resolve_for_read(Some(&PartitionKey::from("doc-42")));
        assert_eq!(read_targets, vec![create_target]);
    }

    #[test]
    fn test_read_without_key_fans_out() {
        let resolver = HashPartitionResolver::new(field_extractor("id"), links()).unwrap();
        let targets = resolver.resolve_for_read(None);
        assert_eq!(
            targets,
            vec!["dbs/db/colls/coll0", "dbs/db/colls/coll1", "dbs/db/colls/coll2"]
        );
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let resolver = HashPartitionResolver::new(field_extractor("id"), links()).unwrap();
        let document = json!({"name": "no id here"});
        let err = resolver.resolve_for_create(&document).unwrap_err();
        assert!(matches!(err, PartitionError::MissingPartitionKey));
    }

    #[test]
    fn test_numeric_field_keys() {
        let resolver = HashPartitionResolver::new(field_extractor("shard"), links()).unwrap();
        let document = json!({"shard": 374.0});
        let target = resolver.resolve_for_create(&document).unwrap();
        let direct = resolver.resolve_for_read(Some(&PartitionKey::from(374.0)));
        assert_eq!(direct, vec![target]);
    }
}
