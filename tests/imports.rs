use std::path::PathBuf;

use gal_lang::interpreter::{self, RunConfig};

/// Two successive `gyat "lib.gal"` statements must not re-declare `helper`;
/// if import dedup were broken this would fail with a NameError instead.
#[test]
fn importing_the_same_file_twice_is_harmless() {
    let demo = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join("import_idempotence.gal");
    let result = interpreter::run(RunConfig {
        entry_path: demo,
        args: Vec::new(),
        package_root: PathBuf::from("/nonexistent"),
        use_cache: false,
    })
    .unwrap();

    assert_eq!(result.scalar, "1");
}
