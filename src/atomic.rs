use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

/// A file that is replaced wholesale on write.
///
/// Writes go to a temporary file in the same directory which is synced and
/// then renamed over the destination, so readers observe either the old or
/// the new document, never a truncated one. Concurrent writers are not
/// serialized: the last rename wins.
pub struct AtomicFile {
    path: PathBuf,
}

impl AtomicFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn read(&self) -> std::io::Result<String> {
        fs::read_to_string(&self.path)
    }

    pub fn write(&self, contents: &[u8]) -> std::io::Result<()> {
        let dir = self.path.parent().unwrap_or(Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;

        tmp.write_all(contents)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;

        tmp.persist(&self.path)?;

        Ok(())
    }
}
