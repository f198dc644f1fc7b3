// Dependency-driven delta execution and interactive redefinition.
use strand::{BlockId, ExecutionMirror, Executive, Value};

fn slot_of(exec: &Executive, name: &str) -> usize {
    exec.executable
        .block(BlockId::TOP_LEVEL)
        .unwrap()
        .symbols
        .index_of(name)
        .unwrap()
}

#[test]
fn test_chain_propagates_through_graph() {
    let mut exec = Executive::new();
    exec.run("a = 2; b = a * 3; c = b + 1;").unwrap();
    let c = slot_of(&exec, "c");
    assert_eq!(exec.read_slot(BlockId::TOP_LEVEL, c), Value::Int(7));
}

#[test]
fn test_redefinition_updates_dependents() {
    let mut exec = Executive::new();
    exec.run("a = 1; b = a + 2;").unwrap();
    exec.run("a = 5;").unwrap();
    let b = slot_of(&exec, "b");
    assert_eq!(exec.read_slot(BlockId::TOP_LEVEL, b), Value::Int(7));
}

#[test]
fn test_redefinition_keeps_other_storage_indices() {
    let mut exec = Executive::new();
    exec.run("a = 1; b = a + 2; c = 9;").unwrap();
    let b_before = slot_of(&exec, "b");
    let c_before = slot_of(&exec, "c");

    exec.run("a = 5;").unwrap();

    assert_eq!(slot_of(&exec, "b"), b_before);
    assert_eq!(slot_of(&exec, "c"), c_before);
    // the redefined symbol moved to a fresh slot, its old slot tombstoned
    let table = &exec.executable.block(BlockId::TOP_LEVEL).unwrap().symbols;
    assert!(table.get(0).unwrap().is_tombstone());
    assert_eq!(slot_of(&exec, "a"), 3);
}

#[test]
fn test_unaffected_nodes_are_not_reevaluated() {
    let mut exec = Executive::new();
    // `s` allocates a fresh heap string each time it evaluates
    exec.run("a = 1; b = a + 1; s = \"constant\";").unwrap();
    let s = slot_of(&exec, "s");
    let handle_before = match exec.read_slot(BlockId::TOP_LEVEL, s) {
        Value::Str(h) => h,
        other => panic!("expected string, got {:?}", other),
    };

    let mut mirror = ExecutionMirror::new(&mut exec);
    mirror.set_value_and_execute("a", Value::Int(9)).unwrap();

    // same handle: the clean node was skipped by delta execution
    let handle_after = match exec.read_slot(BlockId::TOP_LEVEL, s) {
        Value::Str(h) => h,
        other => panic!("expected string, got {:?}", other),
    };
    assert_eq!(handle_before, handle_after);
}

#[test]
fn test_deep_chain_settles_in_one_delta() {
    let mut exec = Executive::new();
    exec.run("a = 1; b = a + 1; c = b + 1; d = c + 1; e = d + 1;")
        .unwrap();
    let mut mirror = ExecutionMirror::new(&mut exec);
    mirror.set_value_and_execute("a", Value::Int(100)).unwrap();
    assert_eq!(mirror.get_value("e").unwrap().as_int(), Some(104));
}

#[test]
fn test_diamond_dependencies_settle() {
    let mut exec = Executive::new();
    exec.run("a = 1; b = a + 1; c = a * 2; d = b + c;").unwrap();
    let mut mirror = ExecutionMirror::new(&mut exec);
    mirror.set_value_and_execute("a", Value::Int(10)).unwrap();
    assert_eq!(mirror.get_value("d").unwrap().as_int(), Some(31));
}
