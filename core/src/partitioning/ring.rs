//! Consistent hash ring mapping partition keys to collection endpoints.

use super::murmur::{Murmur3, RingHash};
use super::{PartitionError, PartitionKey};

/// A position on the ring owned by one collection.
#[derive(Debug, Clone)]
struct VirtualNode {
    hash: u32,
    /// Index into the collection link list.
    collection: u32,
}

/// Consistent hash ring with a fixed set of collections.
///
/// Each collection is assigned a number of virtual nodes; a virtual
/// node's position is the hash of the collection link followed by the
/// replica index (little-endian). Keys resolve to the first virtual node
/// at or after the key's hash, wrapping around the ring. The ring is
/// built once at construction and read-only afterwards, so it is safe
/// for concurrent reads.
pub struct ConsistentHashRing<H = Murmur3> {
    links: Vec<String>,
    ring: Vec<VirtualNode>,
    hasher: H,
}

impl ConsistentHashRing<Murmur3> {
    /// Build a ring over `collection_links` with the default hash.
    pub fn new(
        collection_links: Vec<String>,
        virtual_nodes_per_collection: usize,
    ) -> Result<Self, PartitionError> {
        Self::with_hasher(collection_links, virtual_nodes_per_collection, Murmur3)
    }
}

impl<H: RingHash> ConsistentHashRing<H> {
    /// Build a ring with an explicit hash function.
    pub fn with_hasher(
        collection_links: Vec<String>,
        virtual_nodes_per_collection: usize,
        hasher: H,
    ) -> Result<Self, PartitionError> {
        if collection_links.is_empty() {
            return Err(PartitionError::EmptyRing);
        }
        if virtual_nodes_per_collection == 0 {
            return Err(PartitionError::NoVirtualNodes);
        }

        let mut ring = Vec::with_capacity(collection_links.len() * virtual_nodes_per_collection);
        for (index, link) in collection_links.iter().enumerate() {
            for replica in 0..virtual_nodes_per_collection {
                let mut position = link.as_bytes().to_vec();
                position.extend_from_slice(&(replica as u32).to_le_bytes());
                ring.push(VirtualNode {
                    hash: hasher.hash(&position),
                    collection: index as u32,
                });
            }
        }
        // Stable sort: equal hashes keep collection insertion order, so
        // collisions are broken by ring order.
        ring.sort_by_key(|node| node.hash);

        Ok(Self {
            links: collection_links,
            ring,
            hasher,
        })
    }

    /// Resolve a partition key to its owning collection link.
    pub fn resolve(&self, key: &PartitionKey) -> &str {
        self.resolve_bytes(&key.to_bytes())
    }

    /// Resolve a raw key byte sequence to its owning collection link.
    pub fn resolve_bytes(&self, key: &[u8]) -> &str {
        let hash = self.hasher.hash(key);
        // First virtual node at or after the key's position, wrapping to
        // the start of the ring. The ring is non-empty by construction.
        let index = self.ring.partition_point(|node| node.hash < hash);
        let node = if index == self.ring.len() {
            &self.ring[0]
        } else {
            &self.ring[index]
        };
        &self.links[node.collection as usize]
    }

    /// The collection links this ring routes to, in construction order.
    pub fn collections(&self) -> &[String] {
        &self.links
    }

    /// Total number of virtual nodes on the ring.
    pub fn virtual_node_count(&self) -> usize {
        self.ring.len()
    }
}

impl<H> std::fmt::Debug for ConsistentHashRing<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsistentHashRing")
            .field("collections", &self.links.len())
            .field("virtual_nodes", &self.ring.len())
            .finish()
    }
}
