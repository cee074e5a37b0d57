//! Import path resolution (spec §6): three rules tried in order, against the
//! importing file's directory and the user package root.

use std::path::{Path, PathBuf};

use crate::error::{GalError, GalResult};

const PACKAGE_ENTRY_FILE: &str = "__.gal";

/// Resolves the `import "X"` target `raw` relative to the file that
/// contains the import (`importer_dir`, `None` for the entry file's own
/// directory resolution) and `package_root`.
pub fn resolve(raw: &str, importer_dir: &Path, package_root: &Path) -> GalResult<PathBuf> {
    if raw.ends_with(".gal") {
        return canonical(&importer_dir.join(raw));
    }

    let local_package = importer_dir.join(raw).join(PACKAGE_ENTRY_FILE);
    if local_package.is_file() {
        return canonical(&local_package);
    }

    let global_package = package_root.join(raw).join(PACKAGE_ENTRY_FILE);
    if global_package.is_file() {
        return canonical(&global_package);
    }

    Err(GalError::import(
        format!("package '{raw}' not found in '{}' or '{}'", importer_dir.display(), package_root.display()),
        raw,
    ))
}

fn canonical(path: &Path) -> GalResult<PathBuf> {
    std::fs::canonicalize(path)
        .map_err(|e| GalError::import(format!("cannot resolve import: {e}"), path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_gal_suffix_resolves_relative_to_importer() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("helper.gal");
        std::fs::write(&target, "").unwrap();

        let resolved = resolve("helper.gal", dir.path(), dir.path()).unwrap();
        assert_eq!(resolved, std::fs::canonicalize(target).unwrap());
    }

    #[test]
    fn package_name_prefers_local_over_global_root() {
        let importer_dir = tempfile::tempdir().unwrap();
        let package_root = tempfile::tempdir().unwrap();

        let local_pkg_dir = importer_dir.path().join("mypkg");
        std::fs::create_dir(&local_pkg_dir).unwrap();
        std::fs::write(local_pkg_dir.join(PACKAGE_ENTRY_FILE), "").unwrap();

        let global_pkg_dir = package_root.path().join("mypkg");
        std::fs::create_dir(&global_pkg_dir).unwrap();
        std::fs::write(global_pkg_dir.join(PACKAGE_ENTRY_FILE), "").unwrap();

        let resolved = resolve("mypkg", importer_dir.path(), package_root.path()).unwrap();
        assert_eq!(resolved, std::fs::canonicalize(local_pkg_dir.join(PACKAGE_ENTRY_FILE)).unwrap());
    }

    #[test]
    fn falls_back_to_global_package_root() {
        let importer_dir = tempfile::tempdir().unwrap();
        let package_root = tempfile::tempdir().unwrap();

        let global_pkg_dir = package_root.path().join("mypkg");
        std::fs::create_dir(&global_pkg_dir).unwrap();
        std::fs::write(global_pkg_dir.join(PACKAGE_ENTRY_FILE), "").unwrap();

        let resolved = resolve("mypkg", importer_dir.path(), package_root.path()).unwrap();
        assert_eq!(resolved, std::fs::canonicalize(global_pkg_dir.join(PACKAGE_ENTRY_FILE)).unwrap());
    }

    #[test]
    fn missing_package_is_an_import_error() {
        let importer_dir = tempfile::tempdir().unwrap();
        let package_root = tempfile::tempdir().unwrap();
        let err = resolve("nope", importer_dir.path(), package_root.path()).unwrap_err();
        assert!(matches!(err, GalError::Import { .. }));
    }
}
