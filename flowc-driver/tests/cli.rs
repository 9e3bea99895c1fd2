//! End-to-end CLI tests driving the built `flowc` binary (§4.9).

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}

fn flowc() -> Command {
    Command::cargo_bin("flowc").expect("the flowc binary builds")
}

#[test]
fn compiles_a_well_formed_program_successfully() {
    flowc().arg("--input").arg(fixture("hello.txt")).assert().success();
}

#[test]
fn reports_exit_code_one_on_a_syntax_error() {
    flowc().arg("--input").arg(fixture("syntax_error.txt")).assert().failure().code(1);
}

#[test]
fn reports_exit_code_one_on_a_semantic_error() {
    flowc().arg("--input").arg(fixture("type_error.txt")).assert().failure().code(1);
}

#[test]
fn a_missing_input_file_fails_with_a_readable_error() {
    flowc()
        .arg("--input")
        .arg("does/not/exist.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn dump_ir_writes_textual_ir_to_the_requested_path() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.ir");
    flowc()
        .arg("--input")
        .arg(fixture("loop_sum.txt"))
        .arg("--dump-ir")
        .arg(&out)
        .assert()
        .success();

    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.contains("func sum"));
    assert!(text.contains("return"));
}

#[test]
fn dump_cfg_dot_writes_a_graphviz_digraph() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.dot");
    flowc()
        .arg("--input")
        .arg(fixture("arrays.txt"))
        .arg("--dump-cfg-dot")
        .arg(&out)
        .assert()
        .success();

    let dot = std::fs::read_to_string(&out).unwrap();
    assert!(dot.trim_start().starts_with("digraph"));
}

#[test]
fn disabling_every_pass_still_compiles_successfully() {
    flowc()
        .arg("--input")
        .arg(fixture("loop_sum.txt"))
        .arg("--disable-ssa")
        .arg("--disable-licm")
        .arg("--disable-sccp")
        .arg("--disable-dce")
        .arg("--disable-idom-tree")
        .arg("--disable-df")
        .arg("--disable-block-cleanup")
        .assert()
        .success();
}

#[test]
fn verbose_flag_is_accepted_and_does_not_break_compilation() {
    flowc().arg("--input").arg(fixture("hello.txt")).arg("-vvv").assert().success();
}

#[test]
fn help_lists_the_disable_flags() {
    flowc()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--disable-ssa"));
}
