use std::{
    fs::{DirBuilder, File},
    io::BufWriter,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, ensure, Context, Result};
use memmap2::Mmap;

/// Opens a memory mapped file for reading.
pub fn map_file<P>(path: P) -> Result<Mmap>
where P: AsRef<Path> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open file '{}'", path.display()))?;
    let map = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to mmap file: '{}'", path.display()))?;
    Ok(map)
}

/// Creates a buffered writer around a file (not memory mapped).
pub fn buf_writer<P>(path: P) -> Result<BufWriter<File>>
where P: AsRef<Path> {
    if let Some(parent) = path.as_ref().parent() {
        DirBuilder::new().recursive(true).create(parent)?;
    }
    let file = File::create(&path)
        .with_context(|| format!("Failed to create file '{}'", path.as_ref().display()))?;
    Ok(BufWriter::new(file))
}

/// Recursively finds all `.dtb` files under `dir`, in sorted order.
pub fn find_dtbs<P>(dir: P) -> Result<Vec<PathBuf>>
where P: AsRef<Path> {
    let dir = dir.as_ref();
    ensure!(dir.is_dir(), "Input directory '{}' does not exist", dir.display());
    let dir_str =
        dir.to_str().ok_or_else(|| anyhow!("'{}' is not valid UTF-8", dir.display()))?;
    let pattern = format!("{}/**/*.dtb", glob::Pattern::escape(dir_str));
    let mut out = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = entry?;
        if path.is_file() {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}
