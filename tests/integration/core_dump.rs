// Core dumps: every global's final value, one line each, hard-wrapped.
use strand::{ExecutionMirror, Executive, Options, Value};

#[test]
fn test_dump_lists_globals_with_default_bounds() {
    let mut exec = Executive::new();
    exec.run("count = 3; arr = [1,2,3,4,5,6,7,8,9,10];").unwrap();
    let mirror = ExecutionMirror::new(&mut exec);
    let dump = mirror.get_core_dump().unwrap();

    let lines: Vec<&str> = dump.lines().collect();
    assert!(lines.contains(&"count = 3"), "dump was:\n{}", dump);
    assert!(
        lines.iter().any(|l| l.starts_with("arr = { 1, 2, ..., 9, 10 }")),
        "dump was:\n{}",
        dump
    );
}

#[test]
fn test_dump_uses_watch_formatting() {
    let mut exec = Executive::new();
    exec.run("s = \"hi\"; c = 'x';").unwrap();
    let mirror = ExecutionMirror::new(&mut exec);
    let dump = mirror.get_core_dump().unwrap();
    assert!(dump.lines().any(|l| l == "s = \"hi\""));
    assert!(dump.lines().any(|l| l == "c = 'x'"));
}

#[test]
fn test_dump_wraps_long_lines_at_1020() {
    let mut exec = Executive::new();
    let long = "a".repeat(2100);
    exec.run(&format!("s = \"{}\";", long)).unwrap();
    let mirror = ExecutionMirror::new(&mut exec);
    let dump = mirror.get_core_dump().unwrap();

    let lines: Vec<&str> = dump.lines().collect();
    // `s = "aaaa..."` is 2106 characters: three physical lines
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0].len(), 1020);
    assert_eq!(lines[1].len(), 1020);
    assert_eq!(lines[2].len(), 2106 - 2040);
    assert!(lines[0].starts_with("s = \"aaa"));
}

#[test]
fn test_dump_respects_configured_bounds() {
    let mut exec = Executive::with_options(Options {
        max_array_size: 6,
        ..Options::default()
    });
    exec.run("arr = [1,2,3,4,5,6,7,8,9,10];").unwrap();
    let mirror = ExecutionMirror::new(&mut exec);
    let dump = mirror.get_core_dump().unwrap();
    assert!(
        dump.lines().any(|l| l == "arr = { 1, 2, 3, ..., 8, 9, 10 }"),
        "dump was:\n{}",
        dump
    );
}

#[test]
fn test_dump_includes_builder_globals() {
    let mut exec = Executive::new();
    exec.define_global(strand::BlockId::TOP_LEVEL, "k", Value::Int(7))
        .unwrap();
    exec.run("a = 1;").unwrap();
    let mirror = ExecutionMirror::new(&mut exec);
    let dump = mirror.get_core_dump().unwrap();
    assert!(dump.lines().any(|l| l == "k = 7"));
    assert!(dump.lines().any(|l| l == "a = 1"));
}

#[test]
fn test_dump_skips_redefined_tombstones() {
    let mut exec = Executive::new();
    exec.run("a = 1;").unwrap();
    exec.run("a = 2;").unwrap();
    let mirror = ExecutionMirror::new(&mut exec);
    let dump = mirror.get_core_dump().unwrap();
    let a_lines: Vec<&str> = dump.lines().filter(|l| l.starts_with("a = ")).collect();
    assert_eq!(a_lines, vec!["a = 2"]);
}
