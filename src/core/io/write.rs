//! Output helpers for report files.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// Replace `path` with `contents`, creating missing parent directories.
pub fn write_file<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> io::Result<()> {
    let mut file = create_file(path)?;
    file.write_all(contents.as_ref())?;
    file.flush()
}

/// Open `path` for writing (truncating), creating missing parent directories.
pub fn create_file<P: AsRef<Path>>(path: P) -> io::Result<File> {
    let path = path.as_ref();
    match path.parent() {
        // a bare file name has an empty parent
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir)?,
        _ => {}
    }
    File::create(path)
}
