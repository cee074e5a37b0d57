use std::path::PathBuf;

use gal_lang::interpreter::{self, RunConfig};

#[test]
fn strict_equality_distinguishes_kinds() {
    let demo = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join("booleans.gal");
    let result = interpreter::run(RunConfig {
        entry_path: demo,
        args: Vec::new(),
        package_root: PathBuf::from("/nonexistent"),
        use_cache: false,
    })
    .unwrap();

    assert_eq!(result.scalar, "nay");
}
