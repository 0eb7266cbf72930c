//! Common file system operations with unified error handling

use std::fs;
use std::path::Path;

/// Copy a directory recursively, returning the number of files copied
pub fn copy_dir_recursive<P1, P2>(src: P1, dst: P2) -> std::io::Result<u64>
where
    P1: AsRef<Path>,
    P2: AsRef<Path>,
{
    let src_ref = src.as_ref();
    let dst_ref = dst.as_ref();

    if !dst_ref.exists() {
        fs::create_dir_all(dst_ref)?;
    }

    let mut copied = 0;
    for entry in fs::read_dir(src_ref)? {
        let entry = entry?;
        let entry_path = entry.path();
        let dst_path = dst_ref.join(entry.file_name());

        if entry_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copied += copy_dir_recursive(&entry_path, &dst_path)?;
        } else {
            fs::copy(&entry_path, &dst_path)?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Whether `dir` exists and holds at least one entry
pub fn is_non_empty_dir(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}
