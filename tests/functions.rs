use std::path::PathBuf;

use gal_lang::interpreter::{self, RunConfig};

#[test]
fn user_function_call_returns_its_value() {
    let demo = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join("square.gal");
    let result = interpreter::run(RunConfig {
        entry_path: demo,
        args: Vec::new(),
        package_root: PathBuf::from("/nonexistent"),
        use_cache: false,
    })
    .unwrap();

    assert_eq!(result.scalar, "25");
}
