//! JSON persistence for chunk sequences

use super::element::Chunk;
use super::error::{PipelineError, Result};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

const INDENT: &[u8] = b"    ";
#[cfg(unix)]
const OUTPUT_MODE: u32 = 0o644;

/// Render chunks as a pretty-printed JSON array (4-space indent, non-ASCII kept literal)
pub fn chunks_to_json(chunks: &[Chunk]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    chunks.serialize(&mut serializer)?;
    Ok(buf)
}

/// Write chunks to `path`, creating missing parent directories
///
/// The file is written to a temporary sibling and renamed into place, so an
/// existing file is never left half-written.
pub fn save_chunks_to_json(chunks: &[Chunk], path: &Path) -> Result<()> {
    let buf = chunks_to_json(chunks)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| PipelineError::io(dir, e))?;
    // temp files are created owner-only; outputs get regular file permissions
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(OUTPUT_MODE))
            .map_err(|e| PipelineError::io(tmp.path(), e))?;
    }
    tmp.write_all(&buf).map_err(|e| PipelineError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| PipelineError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| PipelineError::io(path, e.error))?;

    info!("Saved {} chunks to {}", chunks.len(), path.display());
    Ok(())
}

/// Read a chunk array written by [`save_chunks_to_json`]
pub fn load_chunks_from_json(path: &Path) -> Result<Vec<Chunk>> {
    let bytes = fs::read(path).map_err(|e| PipelineError::io(path, e))?;
    let chunks: Vec<Chunk> = serde_json::from_slice(&bytes)?;
    debug!("Loaded {} chunks from {}", chunks.len(), path.display());
    Ok(chunks)
}
