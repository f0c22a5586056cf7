#![cfg(test)]
use super::decode::{decode, decode_with_source_map};
use super::limits::DecodeOptions;
use super::source_map::SourceMapEntry;
use super::value::Value;
use hex_literal::hex;
use std::time::Duration;

fn entries(data: &[u8]) -> Vec<SourceMapEntry> {
    decode_with_source_map(data, &DecodeOptions::default())
        .unwrap()
        .source_map
}

fn entry<'a>(map: &'a [SourceMapEntry], path: &str) -> &'a SourceMapEntry {
    map.iter()
        .find(|e| e.path == path)
        .unwrap_or_else(|| panic!("no entry at {path:?}"))
}

#[test]
fn flat_array() {
    let map = entries(&hex!("83010203"));
    let paths: Vec<_> = map.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, ["", "[0]", "[1]", "[2]"]);

    let root = entry(&map, "");
    assert_eq!((root.start, root.end), (0, 4));
    assert_eq!(root.major_type, 4);
    assert_eq!(root.type_label, "array");
    assert_eq!(root.value_repr, "[1, 2, 3]");
    assert_eq!(root.parent, None);
    assert_eq!(root.children, ["[0]", "[1]", "[2]"]);

    let first = entry(&map, "[0]");
    assert_eq!((first.start, first.end), (1, 2));
    assert_eq!(first.major_type, 0);
    assert_eq!(first.type_label, "unsigned integer");
    assert_eq!(first.value_repr, "1");
    assert_eq!(first.parent.as_deref(), Some(""));
    assert!(first.children.is_empty());
}

#[test]
fn nested_array_spans_nest() {
    let map = entries(&hex!("8301820203820405"));
    let paths: Vec<_> = map.iter().map(|e| e.path.as_str()).collect();
    // Pre-order: every parent precedes its children.
    assert_eq!(
        paths,
        ["", "[0]", "[1]", "[1][0]", "[1][1]", "[2]", "[2][0]", "[2][1]"]
    );

    assert_eq!(
        (entry(&map, "").start, entry(&map, "").end),
        (0, 8)
    );
    assert_eq!((entry(&map, "[0]").start, entry(&map, "[0]").end), (1, 2));
    assert_eq!((entry(&map, "[1]").start, entry(&map, "[1]").end), (2, 5));
    assert_eq!(
        (entry(&map, "[1][0]").start, entry(&map, "[1][0]").end),
        (3, 4)
    );
    assert_eq!(
        (entry(&map, "[1][1]").start, entry(&map, "[1][1]").end),
        (4, 5)
    );
    assert_eq!((entry(&map, "[2]").start, entry(&map, "[2]").end), (5, 8));
    assert_eq!(entry(&map, "[1]").parent.as_deref(), Some(""));
    assert_eq!(entry(&map, "[1][0]").parent.as_deref(), Some("[1]"));
}

#[test]
fn parent_ranges_strictly_contain_children() {
    let map = entries(&hex!("8301820203820405"));
    for e in &map {
        if let Some(parent_path) = &e.parent {
            let p = entry(&map, parent_path);
            assert!(p.start <= e.start && e.end <= p.end);
            assert!((p.start, p.end) != (e.start, e.end));
        }
    }
    // Sibling ranges are disjoint and in input order.
    for e in &map {
        let mut last_end = e.start;
        for child_path in &e.children {
            let c = entry(&map, child_path);
            assert!(c.start >= last_end);
            last_end = c.end;
        }
    }
}

#[test]
fn map_keys_shape_the_path() {
    let map = entries(&hex!("a26161016162820203"));
    let paths: Vec<_> = map.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, ["", ".a", ".b", ".b[0]", ".b[1]"]);

    // The pair's entry covers the value bytes; the key is part of the map.
    let a = entry(&map, ".a");
    assert_eq!((a.start, a.end), (3, 4));
    let b = entry(&map, ".b");
    assert_eq!((b.start, b.end), (6, 9));
    assert_eq!(entry(&map, "").children, [".a", ".b"]);

    // Non-text keys use their diagnostic notation.
    let map = entries(&hex!("a10102"));
    let paths: Vec<_> = map.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, ["", "[1]"]);
    assert_eq!((entry(&map, "[1]").start, entry(&map, "[1]").end), (2, 3));
}

#[test]
fn indefinite_map_paths() {
    let map = entries(&hex!("bf6346756ef563416d7421ff"));
    let paths: Vec<_> = map.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, ["", ".Fun", ".Amt"]);
    let root = entry(&map, "");
    assert_eq!((root.start, root.end), (0, 12));
    assert_eq!(
        (entry(&map, ".Fun").start, entry(&map, ".Fun").end),
        (5, 6)
    );
    assert_eq!(
        (entry(&map, ".Amt").start, entry(&map, ".Amt").end),
        (10, 11)
    );
}

#[test]
fn tags_fold_into_one_node() {
    // A tagged scalar is a single node spanning tag header and content.
    let map = entries(&hex!("c11a514b67b0"));
    assert_eq!(map.len(), 1);
    assert_eq!((map[0].start, map[0].end), (0, 6));
    assert_eq!(map[0].major_type, 6);
    assert_eq!(map[0].type_label, "tagged value");

    // Bignums likewise: the node is the decoded bignum.
    let map = entries(&hex!("c249010000000000000000"));
    assert_eq!(map.len(), 1);
    assert_eq!((map[0].start, map[0].end), (0, 11));
    assert_eq!(map[0].type_label, "bignum");
    assert_eq!(map[0].value_repr, "18446744073709551616");

    // Children of a tagged collection hang off the tag's node.
    let map = entries(&hex!("d87a81d87980"));
    let paths: Vec<_> = map.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, ["", "[0]"]);
    let root = entry(&map, "");
    assert_eq!((root.start, root.end), (0, 6));
    assert_eq!(root.type_label, "plutus data");
    assert_eq!(root.children, ["[0]"]);
    assert_eq!((entry(&map, "[0]").start, entry(&map, "[0]").end), (3, 6));
}

#[test]
fn value_repr_is_bounded() {
    let big = vec![0xAB; 200];
    let mut input = vec![0x58, 200];
    input.extend_from_slice(&big);
    let map = entries(&input);
    assert!(map[0].value_repr.ends_with('…'));
    assert!(map[0].value_repr.len() < 80);
}

#[test]
fn entry_ranges_redecode_to_the_subtree() {
    let input = hex!("8301820203820405");
    let o = DecodeOptions::default();
    let mapped = decode_with_source_map(&input, &o).unwrap();
    let Value::Array { items, .. } = &mapped.value else {
        panic!("not an array");
    };
    let expect: &[(&str, &Value)] = &[
        ("", &mapped.value),
        ("[0]", &items[0]),
        ("[1]", &items[1]),
        ("[2]", &items[2]),
    ];
    for (path, subtree) in expect {
        let e = entry(&mapped.source_map, path);
        let slice = &input[e.start as usize..e.end as usize];
        assert_eq!(&decode(slice, &o).unwrap().value, *subtree);
    }
}

/// Both entry points run the same machine, so any input must either succeed
/// with the same value in both or fail with the same error in both.
#[test]
fn plain_and_source_map_decodes_agree() {
    let inputs: &[&[u8]] = &[
        &hex!("00"),
        &hex!("1864"),
        &hex!("3bffffffffffffffff"),
        &hex!("6449455446"),
        &hex!("83010203"),
        &hex!("8301820203820405"),
        &hex!("a26161016162820203"),
        &hex!("bf6346756ef563416d7421ff"),
        &hex!("9f018202039f0405ffff"),
        &hex!("5f42010243030405ff"),
        &hex!("7f657374726561646d696e67ff"),
        &hex!("c249010000000000000000"),
        &hex!("d87980"),
        &hex!("d87a81d87980"),
        &hex!("d86682028101"),
        &hex!("d9d9f700"),
        &hex!("f97e00"),
        &hex!("f98000"),
        &hex!("f8ff"),
        // Error cases, one per class.
        &[],
        &hex!("18"),
        &hex!("1c"),
        &hex!("ff"),
        &hex!("9f01"),
        &hex!("bf01ff"),
        &hex!("5f5f4101ffff"),
        &hex!("5f6161ff"),
        &hex!("f818"),
        &hex!("61ff"),
        &hex!("a201020103"),
        &hex!("8181818101"),
        &hex!("83010203"),
        &hex!("a201020304"),
        &hex!("4401020304"),
        &hex!("c243010203"),
        &hex!("1817"),
        &hex!("a2026161016162"),
        &hex!("fa7fc00000"),
        &hex!("fb3ff0000000000000"),
        &hex!("d87901"),
        &hex!("d87981f5"),
        &hex!("d9d9f700"),
        &hex!("c06161"),
        &hex!("9fff"),
    ];
    let option_sets = [
        DecodeOptions::default(),
        DecodeOptions::canonical(),
        DecodeOptions {
            strict_tags: true,
            allow_indefinite: false,
            ..Default::default()
        },
        DecodeOptions {
            max_depth: 2,
            max_array_length: 2,
            max_map_size: 1,
            max_byte_string_length: 3,
            max_text_string_length: 3,
            max_bignum_bytes: 2,
            max_output_size: 48,
            ..Default::default()
        },
        DecodeOptions {
            timeout: Some(Duration::ZERO),
            ..Default::default()
        },
    ];
    for options in &option_sets {
        for input in inputs {
            let plain = decode(input, options);
            let mapped = decode_with_source_map(input, options);
            match (plain, mapped) {
                (Ok(a), Ok(b)) => {
                    assert_eq!(a.value, b.value, "{input:02x?}");
                    assert_eq!(a.bytes_read, b.bytes_read, "{input:02x?}");
                }
                (Err(a), Err(b)) => assert_eq!(a, b, "{input:02x?}"),
                (a, b) => panic!("outcomes diverge for {input:02x?}: {a:?} vs {b:?}"),
            }
        }
    }
}
