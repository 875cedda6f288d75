//! Range-based partition resolver.
//!
//! An alternative to hash routing for workloads with ordered keys: each
//! collection owns an inclusive key range, and documents route to the
//! collection whose range contains their key.

use super::{PartitionError, PartitionKey};
use serde_json::Value;

/// An inclusive range of string partition keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    low: String,
    high: String,
}

impl KeyRange {
    /// Create a range; the low bound must not exceed the high bound.
    pub fn new(low: impl Into<String>, high: impl Into<String>) -> Result<Self, PartitionError> {
        let low = low.into();
        let high = high.into();
        if low > high {
            return Err(PartitionError::InvalidRange { low, high });
        }
        Ok(Self { low, high })
    }

    /// A degenerate single-key range, for point reads.
    pub fn point(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            low: key.clone(),
            high: key,
        }
    }

    pub fn low(&self) -> &str {
        &self.low
    }

    pub fn high(&self) -> &str {
        &self.high
    }

    /// Whether a single key falls inside this range.
    pub fn contains_key(&self, key: &str) -> bool {
        self.low.as_str() <= key && key <= self.high.as_str()
    }

    /// Whether two ranges share any key.
    pub fn intersects(&self, other: &KeyRange) -> bool {
        self.low <= other.high && other.low <= self.high
    }
}

/// Routes documents to collections by ordered key ranges.
pub struct RangePartitionResolver {
    extractor: super::hash_resolver::PartitionKeyExtractor,
    partition_map: Vec<(KeyRange, String)>,
}

impl RangePartitionResolver {
    /// Create a resolver over a range-to-collection map.
    pub fn new(
        extractor: super::hash_resolver::PartitionKeyExtractor,
        partition_map: Vec<(KeyRange, String)>,
    ) -> Result<Self, PartitionError> {
        if partition_map.is_empty() {
            return Err(PartitionError::EmptyRing);
        }
        Ok(Self {
            extractor,
            partition_map,
        })
    }

    /// Resolve the collection a new document should be written to.
    ///
    /// The document's key must be a string and must fall inside exactly
    /// one range.
    pub fn resolve_for_create(&self, document: &Value) -> Result<&str, PartitionError> {
        let key = match (self.extractor)(document) {
            Some(PartitionKey::String(s)) => s,
            Some(PartitionKey::Number(_)) => return Err(PartitionError::UnsupportedKeyType),
            None => return Err(PartitionError::MissingPartitionKey),
        };

        let mut matches = self
            .partition_map
            .iter()
            .filter(|(range, _)| range.contains_key(&key));

        match (matches.next(), matches.count()) {
            (None, _) => Err(PartitionError::NoMatchingRange { key }),
            (Some((_, link)), 0) => Ok(link.as_str()),
            (Some(_), extra) => Err(PartitionError::AmbiguousRange {
                key,
                count: extra + 1,
            }),
        }
    }

    /// Resolve the collections a read over the given range must consult.
    ///
    /// `None` fans out to every collection; point reads use
    /// [`KeyRange::point`].
    pub fn resolve_for_read(&self, range: Option<&KeyRange>) -> Vec<&str> {
        match range {
            None => self
                .partition_map
                .iter()
                .map(|(_, link)| link.as_str())
                .collect(),
            Some(range) => self
                .partition_map
                .iter()
                .filter(|(owned, _)| owned.intersects(range))
                .map(|(_, link)| link.as_str())
                .collect(),
        }
    }
}

impl std::fmt::Debug for RangePartitionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangePartitionResolver")
            .field("partitions", &self.partition_map.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::super::hash_resolver::field_extractor;
    use super::*;
    use serde_json::json;

    fn resolver() -> RangePartitionResolver {
        RangePartitionResolver::new(
            field_extractor("id"),
            vec![
                (KeyRange::new("a", "m").unwrap(), "colls/low".to_string()),
                (KeyRange::new("n", "z").unwrap(), "colls/high".to_string()),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let err = KeyRange::new("z", "a").unwrap_err();
        assert!(matches!(err, PartitionError::InvalidRange { .. }));
    }

    #[test]
    fn test_create_routes_by_containing_range() {
        let r = resolver();
        assert_eq!(
            r.resolve_for_create(&json!({"id": "apple"})).unwrap(),
            "colls/low"
        );
        assert_eq!(
            r.resolve_for_create(&json!({"id": "pear"})).unwrap(),
            "colls/high"
        );
    }

    #[test]
    fn test_create_outside_every_range_fails() {
        let r = resolver();
        let err = r.resolve_for_create(&json!({"id": "0-numeric-prefix"})).unwrap_err();
        assert!(matches!(err, PartitionError::NoMatchingRange { .. }));
    }

    #[test]
    fn test_create_with_overlapping_ranges_fails() {
        let r = RangePartitionResolver::new(
            field_extractor("id"),
            vec![
                (KeyRange::new("a", "m").unwrap(), "colls/one".to_string()),
                (KeyRange::new("k", "z").unwrap(), "colls/two".to_string()),
            ],
        )
        .unwrap();
        let err = r.resolve_for_create(&json!({"id": "life"})).unwrap_err();
        assert!(matches!(err, PartitionError::AmbiguousRange { count: 2, .. }));
    }

    #[test]
    fn test_numeric_key_unsupported() {
        let r = resolver();
        let err = r.resolve_for_create(&json!({"id": 42})).unwrap_err();
        assert!(matches!(err, PartitionError::UnsupportedKeyType));
    }

    #[test]
    fn test_read_intersecting_ranges() {
        let r = resolver();
        assert_eq!(
            r.resolve_for_read(Some(&KeyRange::new("j", "p").unwrap())),
            vec!["colls/low", "colls/high"]
        );
        assert_eq!(
            r.resolve_for_read(Some(&KeyRange::point("b"))),
            vec!["colls/low"]
        );
        assert_eq!(
            r.resolve_for_read(None),
            vec!["colls/low", "colls/high"]
        );
    }
}
