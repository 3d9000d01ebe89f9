//! Known-document regression tests for pack/unpack.
//!
//! Each test pins the exact packed JSON for a small record graph, then
//! checks that unpacking the fixture restores identity, not just values.

use aggregraph_core::{
    PackConfig, Record, RecordArena, UnpackError, Value, pack, unpack,
};
use serde_json::json;

fn config() -> PackConfig {
    PackConfig::default()
}

// ---------------------------------------------------------------------------
// Self reference
// ---------------------------------------------------------------------------

#[test]
fn self_reference_packs_to_own_id() {
    let mut arena = RecordArena::new();
    let node = arena.insert(Record::new().with("name", "ouroboros"));
    arena.set_field(node, "self", node);

    let packed = pack(&arena, node, &config()).expect("pack");
    assert_eq!(packed["@id"], json!("10000"));
    assert_eq!(packed["&self"], json!("10000"));
    assert!(packed.get("self").is_none(), "inline self must not be emitted");
}

#[test]
fn self_reference_fixture_unpacks_to_itself() {
    let fixture = json!({"@id": "10000", "name": "ouroboros", "&self": "10000"});

    let unpacked = unpack(&fixture, &config()).expect("unpack");
    assert_eq!(unpacked.arena.len(), 1);
    assert_eq!(
        unpacked.arena.follow(unpacked.root, "self"),
        Some(unpacked.root)
    );
    let root = unpacked.arena.get(unpacked.root).expect("root record");
    assert_eq!(root.get("name"), Some(&Value::from("ouroboros")));
}

// ---------------------------------------------------------------------------
// Parent / child back reference
// ---------------------------------------------------------------------------

#[test]
fn child_back_reference_packs_to_parent_id() {
    let mut arena = RecordArena::new();
    let parent = arena.insert(Record::new().with("name", "parent"));
    let child = arena.insert(Record::new().with("name", "child").with("parent", parent));
    arena.set_field(parent, "children", vec![Value::Record(child)]);

    let packed = pack(&arena, parent, &config()).expect("pack");
    assert_eq!(
        packed,
        json!({
            "@id": "10000",
            "name": "parent",
            "children": [
                {"@id": "10001", "name": "child", "&parent": "10000"}
            ]
        })
    );
}

#[test]
fn child_back_reference_fixture_restores_parent_identity() {
    let fixture = json!({
        "@id": "10000",
        "name": "parent",
        "children": [
            {"@id": "10001", "name": "child", "&parent": "10000"}
        ]
    });

    let unpacked = unpack(&fixture, &config()).expect("unpack");
    let parent = unpacked.root;
    let children = unpacked
        .arena
        .get(parent)
        .and_then(|record| record.get("children"))
        .and_then(Value::as_array)
        .expect("children array");
    assert_eq!(children.len(), 1);
    let child = children[0].as_record().expect("child record");
    assert_eq!(unpacked.arena.follow(child, "parent"), Some(parent));
    assert_eq!(unpacked.references, 1);
}

#[test]
fn single_child_field_back_reference() {
    let mut arena = RecordArena::new();
    let parent = arena.alloc();
    let child = arena.insert(Record::new().with("parent", parent));
    arena.set_field(parent, "child", child);

    let packed = pack(&arena, parent, &config()).expect("pack");
    assert_eq!(packed["child"]["&parent"], json!("10000"));

    let unpacked = unpack(&packed, &config()).expect("unpack");
    let child = unpacked
        .arena
        .follow(unpacked.root, "child")
        .expect("child");
    assert_eq!(unpacked.arena.follow(child, "parent"), Some(unpacked.root));
}

// ---------------------------------------------------------------------------
// Shared references and deeper cycles
// ---------------------------------------------------------------------------

#[test]
fn diamond_shares_one_record() {
    let mut arena = RecordArena::new();
    let address = arena.insert(Record::new().with("city", "Oslo"));
    let billing = arena.insert(Record::new().with("address", address));
    let shipping = arena.insert(Record::new().with("address", address));
    let order = arena.insert(
        Record::new()
            .with("billing", billing)
            .with("shipping", shipping),
    );

    let packed = pack(&arena, order, &config()).expect("pack");
    assert_eq!(packed["shipping"]["&address"], json!("10002"));

    let unpacked = unpack(&packed, &config()).expect("unpack");
    let billing = unpacked.arena.follow(unpacked.root, "billing").expect("billing");
    let shipping = unpacked
        .arena
        .follow(unpacked.root, "shipping")
        .expect("shipping");
    assert_ne!(billing, shipping);
    assert_eq!(
        unpacked.arena.follow(billing, "address"),
        unpacked.arena.follow(shipping, "address")
    );
    assert_eq!(unpacked.arena.len(), 4);
}

#[test]
fn three_record_ring_round_trips() {
    let mut arena = RecordArena::new();
    let a = arena.alloc();
    let b = arena.alloc();
    let c = arena.alloc();
    arena.set_field(a, "next", b);
    arena.set_field(b, "next", c);
    arena.set_field(c, "next", a);

    let packed = pack(&arena, a, &config()).expect("pack");
    assert_eq!(packed["next"]["next"]["&next"], json!("10000"));

    let unpacked = unpack(&packed, &config()).expect("unpack");
    let root = unpacked.root;
    let hop = |from| unpacked.arena.follow(from, "next").expect("next");
    assert_eq!(hop(hop(hop(root))), root);
}

#[test]
fn field_order_survives_round_trip() {
    let mut arena = RecordArena::new();
    let root = arena.insert(
        Record::new()
            .with("zeta", 1i64)
            .with("alpha", true)
            .with("mid", Value::Null),
    );
    arena.set_field(root, "me", root);

    let packed = pack(&arena, root, &config()).expect("pack");
    let keys: Vec<&str> = packed
        .as_object()
        .expect("object")
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, ["@id", "zeta", "alpha", "mid", "&me"]);

    let unpacked = unpack(&packed, &config()).expect("unpack");
    let names: Vec<&str> = unpacked
        .arena
        .get(unpacked.root)
        .expect("root")
        .fields()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(names, ["zeta", "alpha", "mid", "me"]);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn dangling_reference_is_an_error() {
    let fixture = json!({"@id": "10000", "&owner": "10042"});
    let err = unpack(&fixture, &config()).expect_err("must not resolve");
    assert_eq!(
        err,
        UnpackError::DanglingReference {
            id: 10042,
            field: "owner".to_string()
        }
    );
    assert_eq!(err.code().code(), "E4001");
}

#[test]
fn dangling_array_reference_is_an_error() {
    let fixture = json!({"@id": "1", "items": [{"&": "99"}]});
    assert!(matches!(
        unpack(&fixture, &config()),
        Err(UnpackError::DanglingReference { id: 99, .. })
    ));
}

#[test]
fn forward_references_resolve() {
    // References are resolved after the whole document is read, so a
    // reference may precede the stamp it points at.
    let fixture = json!({
        "@id": "1",
        "&favourite": "2",
        "items": [{"@id": "2", "name": "later"}]
    });
    let unpacked = unpack(&fixture, &config()).expect("unpack");
    let favourite = unpacked
        .arena
        .follow(unpacked.root, "favourite")
        .expect("favourite");
    let record = unpacked.arena.get(favourite).expect("record");
    assert_eq!(record.get("name"), Some(&Value::from("later")));
}

// ---------------------------------------------------------------------------
// Scale
// ---------------------------------------------------------------------------

/// `serde_json::Value` drops and compares recursively, so very deep
/// documents are handled on a thread with room for that.
fn with_deep_stack(f: impl FnOnce() + Send + 'static) {
    std::thread::Builder::new()
        .stack_size(256 * 1024 * 1024)
        .spawn(f)
        .expect("spawn worker")
        .join()
        .expect("worker finished");
}

#[test]
fn ten_thousand_record_list_round_trips() {
    with_deep_stack(|| {
        const LEN: u64 = 10_000;
        let mut arena = RecordArena::new();
        let head = arena.insert(Record::new().with("step", 0u64));
        let mut tail = head;
        for step in 1..LEN {
            let next = arena.insert(Record::new().with("step", step));
            arena.set_field(tail, "next", next);
            tail = next;
        }
        arena.set_field(tail, "head", head);

        let packed = pack(&arena, head, &config()).expect("pack");
        let unpacked = unpack(&packed, &config()).expect("unpack");
        assert_eq!(unpacked.arena.len(), 10_000);
        assert_eq!(unpacked.references, 1);

        let mut cursor = unpacked.root;
        for step in 0..LEN {
            let record = unpacked.arena.get(cursor).expect("record");
            assert_eq!(record.get("step"), Some(&Value::from(step)));
            match unpacked.arena.follow(cursor, "next") {
                Some(next) => cursor = next,
                None => assert_eq!(step, LEN - 1),
            }
        }
        assert_eq!(unpacked.arena.follow(cursor, "head"), Some(unpacked.root));
    });
}
