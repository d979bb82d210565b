use std::fs;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Serialize `value` as pretty JSON and replace `path` with it.
///
/// The document is written to a temp file next to the target and renamed over
/// it, so a crash mid-write leaves either the old file or the new one.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_string_pretty(value)?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    let fill = |file: &mut NamedTempFile| -> std::io::Result<()> {
        file.write_all(data.as_bytes())?;
        file.write_all(b"\n")?;
        file.as_file().sync_all()
    };
    fill(&mut tmp).map_err(|e| Error::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| Error::io(path, e.error))?;

    Ok(())
}
