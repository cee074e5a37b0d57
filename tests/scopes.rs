use std::path::PathBuf;

use gal_lang::interpreter::{self, RunConfig};

#[test]
fn global_mutation_inside_a_call_is_visible_after_return() {
    let demo = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join("global_counter.gal");
    let result = interpreter::run(RunConfig {
        entry_path: demo,
        args: Vec::new(),
        package_root: PathBuf::from("/nonexistent"),
        use_cache: false,
    })
    .unwrap();

    assert_eq!(result.scalar, "2");
}
