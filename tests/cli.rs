use std::path::PathBuf;
use std::process::Command;

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

#[test]
fn while_loop_prints_each_iteration() {
    let output = Command::new(env!("CARGO_BIN_EXE_gal"))
        .arg(demo("while_loop.gal"))
        .arg("--no-cache")
        .output()
        .expect("binary runs");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "0\n1\n2\n");
}

#[test]
fn returning_a_value_from_main_prints_the_exit_code_line() {
    let output = Command::new(env!("CARGO_BIN_EXE_gal"))
        .arg(demo("square.gal"))
        .arg("--no-cache")
        .output()
        .expect("binary runs");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "Program exited with code: 25\n");
}

#[test]
fn missing_file_is_reported_on_stderr_with_nonzero_exit() {
    let output = Command::new(env!("CARGO_BIN_EXE_gal"))
        .arg(demo("does_not_exist.gal"))
        .output()
        .expect("binary runs");

    assert!(!output.status.success());
    assert!(!output.stderr.is_empty());
}
