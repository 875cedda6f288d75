use claims::{assert_err, assert_ok};
use serde_json::json;
use stratus::partitioning::{
    ConsistentHashRing, HashPartitionResolver, KeyRange, PartitionError, PartitionKey,
    RangePartitionResolver, field_extractor, murmur3_32,
};

mod murmur_conformance {
    use super::*;

    #[test]
    fn test_reference_string_hash() {
        assert_eq!(murmur3_32(b"afdgdd", 0), 1099701186);
    }

    #[test]
    fn test_reference_double_hash() {
        let bytes = 374.0_f64.to_le_bytes();
        assert_eq!(murmur3_32(&bytes, 0), 3717946798);
        assert_eq!(
            PartitionKey::from(374.0).to_bytes(),
            bytes.to_vec(),
            "number keys hash their IEEE-754 little-endian form"
        );
    }

    #[test]
    fn test_key_bytes_are_raw_utf8() {
        for (text, expected) in [
            ("documentdb", b"documentdb".to_vec()),
            ("azure", b"azure".to_vec()),
            ("json", b"json".to_vec()),
            ("nosql", b"nosql".to_vec()),
        ] {
            assert_eq!(PartitionKey::from(text).to_bytes(), expected);
        }
    }
}

mod hash_routing {
    use super::*;

    fn collections() -> Vec<String> {
        (0..4).map(|i| format!("dbs/test/colls/coll{i}")).collect()
    }

    #[test]
    fn test_resolver_round_trip() {
        let resolver = assert_ok!(HashPartitionResolver::new(
            field_extractor("id"),
            collections(),
        ));

        // Every document routes somewhere, and reads agree with creates.
        for i in 0..50 {
            let document = json!({"id": format!("doc-{i}")});
            let created = assert_ok!(resolver.resolve_for_create(&document));
            let read = resolver.resolve_for_read(Some(&PartitionKey::from(format!("doc-{i}"))));
            assert_eq!(read, vec![created]);
        }
    }

    #[test]
    fn test_empty_collections_fail_fast() {
        let err = assert_err!(HashPartitionResolver::new(
            field_extractor("id"),
            Vec::new(),
        ));
        assert!(matches!(err, PartitionError::EmptyRing));
    }

    #[test]
    fn test_every_collection_receives_traffic() {
        let resolver = assert_ok!(HashPartitionResolver::new(
            field_extractor("id"),
            collections(),
        ));

        let mut hit = std::collections::HashSet::new();
        for i in 0..2_000 {
            let key = PartitionKey::from(format!("key-{i}"));
            hit.insert(resolver.resolve_for_read(Some(&key))[0].to_string());
        }
        assert_eq!(hit.len(), 4, "all four collections should own some keys");
    }

    #[test]
    fn test_ring_survives_collection_growth() {
        let before = assert_ok!(ConsistentHashRing::new(collections(), 128));
        let mut grown = collections();
        grown.push("dbs/test/colls/coll4".to_string());
        let after = assert_ok!(ConsistentHashRing::new(grown, 128));

        let total = 5_000;
        let moved = (0..total)
            .filter(|i| {
                let key = PartitionKey::from(format!("doc-{i}"));
                before.resolve(&key) != after.resolve(&key)
            })
            .count();

        // Going from 4 to 5 collections should remap roughly 1/5 of keys.
        let ratio = moved as f64 / total as f64;
        assert!(
            (0.05..=0.45).contains(&ratio),
            "remapped fraction out of bounds: {moved}/{total} ({ratio:.2})"
        );
    }
}

mod range_routing {
    use super::*;

    #[test]
    fn test_ordered_key_spread() {
        let resolver = assert_ok!(RangePartitionResolver::new(
            field_extractor("name"),
            vec![
                (KeyRange::new("a", "f").unwrap(), "colls/a-f".to_string()),
                (KeyRange::new("g", "p").unwrap(), "colls/g-p".to_string()),
                (KeyRange::new("q", "z").unwrap(), "colls/q-z".to_string()),
            ],
        ));

        assert_eq!(
            assert_ok!(resolver.resolve_for_create(&json!({"name": "carol"}))),
            "colls/a-f"
        );
        assert_eq!(
            assert_ok!(resolver.resolve_for_create(&json!({"name": "mallory"}))),
            "colls/g-p"
        );
        assert_eq!(
            assert_ok!(resolver.resolve_for_create(&json!({"name": "trent"}))),
            "colls/q-z"
        );

        // A scan across two ranges consults exactly those collections.
        let scanned = resolver.resolve_for_read(Some(&KeyRange::new("e", "h").unwrap()));
        assert_eq!(scanned, vec!["colls/a-f", "colls/g-p"]);
    }
}
