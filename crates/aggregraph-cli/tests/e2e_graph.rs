//! E2E tests for the catalog commands: `toposort`, `cycles`, `graph`.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const ORDERS: &str = r#"
[[types]]
name = "Customer"
properties = [{ name = "name", target = "string" }]

[[types]]
name = "Order"
properties = [
  { name = "customer", target = "Customer" },
  { name = "lines", target = "OrderLine", collection = true },
]

[[types]]
name = "OrderLine"
collection = true
properties = [
  { name = "order", target = "Order" },
  { name = "product", target = "Product" },
]

[[types]]
name = "Product"
properties = [{ name = "replaced_by", target = "Product" }]
"#;

const CHAIN: &str = r#"
[[types]]
name = "Z"

[[types]]
name = "Y"
properties = [{ name = "z", target = "Z" }]

[[types]]
name = "X"
properties = [{ name = "y", target = "Y" }]
"#;

fn aggr_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("aggr"));
    cmd.current_dir(dir);
    cmd.env("AGGREGRAPH_LOG", "error");
    cmd.env_remove("FORMAT");
    cmd
}

fn project_with(catalog: &str) -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("types.toml"), catalog).expect("write catalog");
    dir
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("command runs");
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON")
}

fn type_order(json: &Value) -> Vec<String> {
    json["order"]
        .as_array()
        .expect("order array")
        .iter()
        .map(|entry| entry["type"].as_str().expect("type").to_string())
        .collect()
}

#[test]
fn chain_orders_root_first() {
    let dir = project_with(CHAIN);
    let json = json_stdout(aggr_cmd(dir.path()).args(["toposort", "--catalog", "types.toml", "--json"]));
    assert_eq!(type_order(&json), ["X", "Y", "Z"]);
    assert!(json["content_hash"].as_str().expect("hash").starts_with("blake3:"));
}

#[test]
fn dependencies_first_reverses_order() {
    let dir = project_with(CHAIN);
    aggr_cmd(dir.path())
        .args(["toposort", "--catalog", "types.toml", "--dependencies-first", "--format", "text"])
        .assert()
        .success()
        .stdout("Z\nY\nX\n");
}

#[test]
fn cyclic_catalog_still_orders() {
    let dir = project_with(ORDERS);
    let json = json_stdout(aggr_cmd(dir.path()).args(["toposort", "--catalog", "types.toml", "--json"]));
    let order = type_order(&json);
    assert_eq!(order.len(), 4);
    let pos = |name: &str| order.iter().position(|n| n == name).expect("present");
    assert!(pos("Order") < pos("Customer"));
    assert!(pos("OrderLine") < pos("Product"));
    assert_eq!(json["cycles"], serde_json::json!([["Order", "OrderLine"]]));
}

#[test]
fn strict_refuses_cycles_with_error_code() {
    let dir = project_with(ORDERS);
    let output = aggr_cmd(dir.path())
        .args(["toposort", "--catalog", "types.toml", "--strict", "--json"])
        .output()
        .expect("command runs");
    assert!(!output.status.success());
    let err: Value = serde_json::from_slice(&output.stderr).expect("JSON error");
    assert_eq!(err["error"]["error_code"], "E2002");
    assert!(err["error"]["message"].as_str().expect("message").contains("Order, OrderLine"));
}

#[test]
fn strict_from_project_config() {
    let dir = project_with(ORDERS);
    fs::create_dir(dir.path().join(".aggregraph")).expect("mkdir");
    fs::write(dir.path().join(".aggregraph/config.toml"), "[graph]\nstrict = true\n").expect("write");
    aggr_cmd(dir.path())
        .args(["toposort", "--catalog", "types.toml", "--format", "text"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E2002]"));
}

#[test]
fn cycles_lists_components_and_self_references() {
    let dir = project_with(ORDERS);
    let json = json_stdout(aggr_cmd(dir.path()).args(["cycles", "--catalog", "types.toml", "--json"]));
    assert_eq!(json["cycles"], serde_json::json!([["Order", "OrderLine"]]));
    assert_eq!(json["self_references"], serde_json::json!(["Product"]));

    aggr_cmd(dir.path())
        .args(["cycles", "--catalog", "types.toml", "--format", "pretty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 cycle(s):"))
        .stdout(predicate::str::contains("Self-referencing: Product"));
}

#[test]
fn graph_exports_dot_and_edges() {
    let dir = project_with(ORDERS);
    aggr_cmd(dir.path())
        .args(["graph", "--catalog", "types.toml", "--out", "types.dot"])
        .assert()
        .success();
    let dot = fs::read_to_string(dir.path().join("types.dot")).expect("dot written");
    assert!(dot.starts_with("digraph {"));
    assert!(dot.contains("label = \"OrderLine[]\""));

    let json = json_stdout(aggr_cmd(dir.path()).args([
        "graph", "--catalog", "types.toml", "--out", "edges.txt", "--export", "edges", "--json",
    ]));
    assert_eq!(json["nodes"], 4);
    assert_eq!(json["edges"], 5);
    let edges = fs::read_to_string(dir.path().join("edges.txt")).expect("edges written");
    assert!(edges.contains("Order -> OrderLine[] [lines]\n"));
}

#[test]
fn missing_catalog_reports_catalog_error() {
    let dir = TempDir::new().expect("tempdir");
    aggr_cmd(dir.path())
        .args(["cycles", "--catalog", "nope.toml", "--format", "text"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E2003]"))
        .stderr(predicate::str::contains("nope.toml"));
}

#[test]
fn generated_acyclic_catalog_passes_strict() {
    let dir = TempDir::new().expect("tempdir");
    let output = aggr_cmd(dir.path())
        .args(["gen", "--catalog", "--types", "20", "--acyclic", "--seed", "5"])
        .output()
        .expect("gen runs");
    assert!(output.status.success());
    fs::write(dir.path().join("types.toml"), &output.stdout).expect("write catalog");

    let json = json_stdout(aggr_cmd(dir.path()).args(["toposort", "--catalog", "types.toml", "--strict", "--json"]));
    assert_eq!(type_order(&json).len(), 20);
}
