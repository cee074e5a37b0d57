//! On-disk AST cache (spec §4.4). The cache file for source `P` is `P + "+"`;
//! its first line is the hex SHA-256 of the source bytes, the remainder a
//! `serde_json`-serialized `AstNode` with embedded newlines escaped to `\n`.
//! Advisory only: any read/parse/hash failure is a cache miss, never a
//! `GalError`.

use std::path::{Path, PathBuf};

use log::warn;
use sha2::{Digest, Sha256};

use crate::ast::AstNode;

pub fn cache_path(source_path: &Path) -> PathBuf {
    let mut path = source_path.as_os_str().to_owned();
    path.push("+");
    PathBuf::from(path)
}

pub fn hex_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().iter().map(|b| format!("{b:02x}")).collect()
}

/// Returns `Some(ast)` only if a cache file exists, is well-formed, and its
/// stored hash matches `source`.
pub fn try_load(source_path: &Path, source: &str) -> Option<AstNode> {
    let path = cache_path(source_path);
    let contents = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(_) => return None,
    };

    let (hash_line, payload_line) = match contents.split_once('\n') {
        Some(parts) => parts,
        None => {
            warn!("cache file '{}' is malformed, ignoring", path.display());
            return None;
        }
    };

    if hash_line.trim() != hex_sha256(source.as_bytes()) {
        return None;
    }

    let unescaped = payload_line.replace("\\n", "\n");
    match serde_json::from_str(&unescaped) {
        Ok(ast) => Some(ast),
        Err(e) => {
            warn!("cache file '{}' failed to deserialize: {e}", path.display());
            None
        }
    }
}

/// Writes the cache file. Failures are logged and swallowed: the cache is an
/// optimization, never a requirement for correct execution.
pub fn save(source_path: &Path, source: &str, ast: &AstNode) {
    let path = cache_path(source_path);
    let payload = match serde_json::to_string(ast) {
        Ok(json) => json.replace('\n', "\\n"),
        Err(e) => {
            warn!("failed to serialize AST for '{}': {e}", path.display());
            return;
        }
    };

    let contents = format!("{}\n{}", hex_sha256(source.as_bytes()), payload);
    if let Err(e) = std::fs::write(&path, contents) {
        warn!("failed to write cache file '{}': {e}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;

    #[test]
    fn round_trips_through_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let source_path = dir.path().join("main.gal");
        let source = "lowkey main {\n} end";
        std::fs::write(&source_path, source).unwrap();

        let mut ast = AstNode::new(NodeKind::Program, 0);
        ast.push(AstNode::with_value(NodeKind::Identifier, "x", 1));
        save(&source_path, source, &ast);

        let loaded = try_load(&source_path, source).unwrap();
        assert_eq!(loaded, ast);
    }

    #[test]
    fn mismatched_hash_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let source_path = dir.path().join("main.gal");
        std::fs::write(&source_path, "lowkey main {\n} end").unwrap();
        let ast = AstNode::new(NodeKind::Program, 0);
        save(&source_path, "lowkey main {\n} end", &ast);

        assert!(try_load(&source_path, "lowkey main {\nfire std.println(1)\n} end").is_none());
    }

    #[test]
    fn missing_cache_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let source_path = dir.path().join("main.gal");
        assert!(try_load(&source_path, "anything").is_none());
    }
}
