use std::path::PathBuf;

use gal_lang::interpreter::{self, RunConfig};

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

#[test]
fn multiplication_binds_before_addition() {
    let result = interpreter::run(RunConfig {
        entry_path: demo("precedence.gal"),
        args: Vec::new(),
        package_root: PathBuf::from("/nonexistent"),
        use_cache: false,
    })
    .unwrap();

    assert_eq!(result.scalar, "7");
}
