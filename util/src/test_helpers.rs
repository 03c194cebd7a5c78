use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Creates a unique temporary directory populated with `files` (relative path, contents).
///
/// Keep the returned `TempDir` in scope for as long as you need the files.
pub fn temp_dir_with_files(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().expect("failed to create tempdir");
    for (rel, contents) in files {
        write_file(tmp.path(), rel, contents);
    }
    tmp
}

/// Writes `contents` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, contents: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create parent dir");
    }
    fs::write(&path, contents).expect("failed to write test file");
    path
}
