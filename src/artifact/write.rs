//! Artifact persistence.
//!
//! Every write goes to a temp file inside the output directory and is then
//! renamed into place, so a concurrent reader sees either no artifact or the
//! complete one. Two processes racing on the same content hash both rename
//! equivalent bytes onto the same path.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Write `content` to `path` via temp file + rename.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let mut tmp = temp_beside(path)?;
    tmp.write_all(content).map_err(|e| Error::io(tmp.path(), e))?;
    persist(tmp, path)
}

/// Path of the precompressed sibling: `<artifact>.gz`.
pub fn gzip_path(artifact: &Path) -> PathBuf {
    let mut name = artifact.as_os_str().to_owned();
    name.push(".gz");
    PathBuf::from(name)
}

/// Gzip `content` next to `artifact`, with the artifact's modification time.
pub fn write_gzip_sibling(artifact: &Path, content: &[u8]) -> Result<PathBuf> {
    let gz_path = gzip_path(artifact);

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(content)
        .map_err(|e| Error::io(&gz_path, e))?;
    let compressed = encoder.finish().map_err(|e| Error::io(&gz_path, e))?;

    let mtime = fs::metadata(artifact)
        .and_then(|m| m.modified())
        .map_err(|e| Error::io(artifact, e))?;

    let mut tmp = temp_beside(&gz_path)?;
    tmp.write_all(&compressed)
        .map_err(|e| Error::io(tmp.path(), e))?;
    // Set last: any later write would bump the mtime again
    tmp.as_file()
        .set_modified(mtime)
        .map_err(|e| Error::io(tmp.path(), e))?;
    persist(tmp, &gz_path)?;
    Ok(gz_path)
}

fn temp_beside(path: &Path) -> Result<NamedTempFile> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))
}

fn persist(tmp: NamedTempFile, path: &Path) -> Result<()> {
    // Temp files are created 0600; artifacts must be readable by the web server
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(|e| Error::io(tmp.path(), e))?;
    }
    tmp.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}
