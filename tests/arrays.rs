use std::path::PathBuf;

use gal_lang::interpreter::{self, RunConfig};

#[test]
fn member_access_returns_the_assigned_value() {
    let demo = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join("array_round_trip.gal");
    let result = interpreter::run(RunConfig {
        entry_path: demo,
        args: Vec::new(),
        package_root: PathBuf::from("/nonexistent"),
        use_cache: false,
    })
    .unwrap();

    assert_eq!(result.scalar, "b");
}
