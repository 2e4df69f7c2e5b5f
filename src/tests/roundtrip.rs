//! End-to-end round-trip tests over the public API

use std::sync::Arc;

use num_bigint::BigInt;

use crate::node::{DecimalBits, NodeData, Value};
use crate::{read_nodes, write_nodes, write_nodes_with, Node, WriterOptions};

fn roundtrip(forest: &[Node]) -> Vec<Node> {
    let mut buf = Vec::new();
    write_nodes(&mut buf, forest).unwrap();
    read_nodes(&mut buf.as_slice(), "roundtrip").unwrap()
}

fn assert_forest_eq(a: &[Node], b: &[Node]) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        assert_eq!(**x, **y);
    }
}

#[test]
fn test_empty_forest() {
    assert!(roundtrip(&[]).is_empty());
}

#[test]
fn test_every_literal_kind() {
    let forest: Vec<Node> = [
        Value::Null,
        Value::Void,
        Value::bool(true),
        Value::bool(false),
        Value::i8(-1),
        Value::i16(-300),
        Value::i32(i32::MIN),
        Value::i64(i64::MAX),
        Value::u8(200),
        Value::u16(60_000),
        Value::u32(u32::MAX),
        Value::u64(u64::MAX),
        Value::f32(1.5),
        Value::f64(-0.0),
        Value::char_unit(0x20AC),
        Value::string("hello world"),
        Value::decimal(DecimalBits::from_parts(314, 0, 0, false, 2)),
        Value::big_int(BigInt::from(u64::MAX) * BigInt::from(u64::MAX)),
        Value::big_int(BigInt::from(-1)),
    ]
    .into_iter()
    .map(NodeData::literal)
    .collect();

    assert_forest_eq(&roundtrip(&forest), &forest);
}

#[test]
fn test_float_bits_survive() {
    // Negative zero and a non-canonical NaN payload must round-trip
    // bit-exactly.
    let forest = vec![
        NodeData::literal(Value::f64(-0.0)),
        NodeData::literal(Value::Float64(crate::FloatBits64(0x7FF8_0000_0000_BEEF))),
        NodeData::literal(Value::Float32(crate::FloatBits32(0xFFC0_0001))),
    ];
    let back = roundtrip(&forest);
    assert_forest_eq(&back, &forest);
}

#[test]
fn test_nested_calls() {
    // f(g(x), h(1, "two"), y)
    let forest = vec![NodeData::call_id(
        "f",
        vec![
            NodeData::call_id("g", vec![NodeData::id("x")]),
            NodeData::call_id(
                "h",
                vec![
                    NodeData::literal(Value::i32(1)),
                    NodeData::literal(Value::string("two")),
                ],
            ),
            NodeData::id("y"),
        ],
    )];
    assert_forest_eq(&roundtrip(&forest), &forest);
}

#[test]
fn test_computed_target_call() {
    // (f(x))(y): the target is itself a call, so it is a node reference
    // rather than a template symbol.
    let target = NodeData::call_id("f", vec![NodeData::id("x")]);
    let forest = vec![NodeData::call(target, vec![NodeData::id("y")])];
    assert_forest_eq(&roundtrip(&forest), &forest);
}

#[test]
fn test_attributes_roundtrip() {
    let forest = vec![
        NodeData::id("foo").with_attrs(vec![NodeData::id("a")]),
        NodeData::call_id("bar", vec![NodeData::id("z")]).with_attrs(vec![
            NodeData::id("inline"),
            NodeData::literal(Value::i32(3)),
        ]),
        // A decorated call target disqualifies the fixed-symbol template.
        NodeData::call(
            NodeData::id("t").with_attrs(vec![NodeData::id("pure")]),
            vec![],
        ),
    ];
    assert_forest_eq(&roundtrip(&forest), &forest);
}

#[test]
fn test_attribute_order_preserved() {
    let make = |first: &str, second: &str| {
        NodeData::id("x").with_attrs(vec![NodeData::id(first), NodeData::id(second)])
    };
    let back = roundtrip(&[make("a", "b"), make("b", "a")]);
    assert_eq!(*back[0], *make("a", "b"));
    assert_eq!(*back[1], *make("b", "a"));
    assert_ne!(*back[0], *back[1]);
}

#[test]
fn test_shared_subtree_decodes_shared() {
    // [bar(x, x), bar(x, x)] with x = baz(): one table entry for x, one
    // for bar(x, x); the decoder hands back the same allocation for every
    // reference to an entry.
    let x = NodeData::call_id("baz", vec![]);
    let bar = NodeData::call_id("bar", vec![x.clone(), x.clone()]);
    let forest = vec![bar.clone(), bar.clone()];

    let back = roundtrip(&forest);
    assert_forest_eq(&back, &forest);
    assert!(Arc::ptr_eq(&back[0], &back[1]));

    let args = back[0].args().unwrap();
    assert!(Arc::ptr_eq(&args[0], &args[1]));
}

#[test]
fn test_duplicates_shrink_the_stream() {
    let leaf = NodeData::call_id("leaf", vec![NodeData::literal(Value::i32(7))]);
    let repeated: Vec<Node> = (0..64).map(|_| leaf.clone()).collect();

    let mut once = Vec::new();
    write_nodes(&mut once, &[leaf.clone()]).unwrap();
    let mut many = Vec::new();
    write_nodes(&mut many, &repeated).unwrap();

    // 63 extra top-level references, not 63 extra subtrees.
    assert!(many.len() < once.len() + 2 * 64);
}

#[test]
fn test_structurally_equal_but_distinct_objects_dedup() {
    let a = NodeData::call_id("f", vec![NodeData::literal(Value::i32(1))]);
    let b = NodeData::call_id("f", vec![NodeData::literal(Value::i32(1))]);
    assert!(!Arc::ptr_eq(&a, &b));

    let back = roundtrip(&[a, b]);
    assert!(Arc::ptr_eq(&back[0], &back[1]));
}

#[test]
fn test_deep_nesting() {
    let mut node = NodeData::id("leaf");
    for _ in 0..10_000 {
        node = NodeData::call_id("wrap", vec![node]);
    }
    let forest = vec![node];

    let mut buf = Vec::new();
    write_nodes(&mut buf, &forest).unwrap();
    let back = read_nodes(&mut buf.as_slice(), "deep").unwrap();

    // Walk back down iteratively; structural == on a 10k-deep tree would
    // recurse, so compare level by level.
    let mut expect = &forest[0];
    let mut got = &back[0];
    loop {
        match (expect.args(), got.args()) {
            (Some([e]), Some([g])) => {
                assert_eq!(
                    expect.target().unwrap().name(),
                    got.target().unwrap().name()
                );
                expect = e;
                got = g;
            }
            (None, None) => {
                assert_eq!(expect.name(), got.name());
                break;
            }
            _ => panic!("shape mismatch"),
        }
    }
}

#[test]
fn test_variable_templates_roundtrip() {
    let one = NodeData::literal(Value::i32(1));
    let forest = vec![
        NodeData::call_id("f", vec![one.clone()]),
        NodeData::call_id("g", vec![one.clone()]),
        NodeData::call_id("f", vec![NodeData::literal(Value::i32(2))]),
    ];

    let mut fixed = Vec::new();
    write_nodes(&mut fixed, &forest).unwrap();
    let mut variable = Vec::new();
    write_nodes_with(
        &mut variable,
        &forest,
        WriterOptions {
            variable_templates: true,
        },
    )
    .unwrap();

    // Different byte streams, identical forests.
    assert_ne!(fixed, variable);
    let a = read_nodes(&mut fixed.as_slice(), "fixed").unwrap();
    let b = read_nodes(&mut variable.as_slice(), "variable").unwrap();
    assert_forest_eq(&a, &forest);
    assert_forest_eq(&b, &forest);
}

#[test]
fn test_encode_is_deterministic() {
    let forest = vec![
        NodeData::call_id(
            "f",
            vec![NodeData::id("x"), NodeData::literal(Value::string("s"))],
        ),
        NodeData::literal(Value::Null),
    ];

    let mut a = Vec::new();
    write_nodes(&mut a, &forest).unwrap();
    let mut b = Vec::new();
    write_nodes(&mut b, &forest).unwrap();
    assert_eq!(a, b);

    // Re-encoding a decoded forest reproduces the stream byte for byte.
    let decoded = read_nodes(&mut a.as_slice(), "again").unwrap();
    let mut c = Vec::new();
    write_nodes(&mut c, &decoded).unwrap();
    assert_eq!(a, c);
}

#[test]
fn test_truncated_stream_rejected() {
    let forest = vec![NodeData::call_id("f", vec![NodeData::id("x")])];
    let mut buf = Vec::new();
    write_nodes(&mut buf, &forest).unwrap();

    for cut in 1..buf.len() {
        assert!(
            read_nodes(&mut &buf[..cut], "cut").is_err(),
            "prefix of {cut} bytes decoded successfully"
        );
    }
}

#[test]
fn test_string_literals_share_symbol_table() {
    // An identifier and a string literal with the same text intern to one
    // symbol table entry.
    let forest = vec![
        NodeData::id("shared"),
        NodeData::literal(Value::string("shared")),
    ];
    let mut buf = Vec::new();
    write_nodes(&mut buf, &forest).unwrap();

    let needle = b"shared";
    let hits = buf
        .windows(needle.len())
        .filter(|w| w == needle)
        .count();
    assert_eq!(hits, 1);

    assert_forest_eq(&roundtrip(&forest), &forest);
}
