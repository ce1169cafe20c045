//! Filesystem output for rendered artifacts.

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use attackgraph_error::{Error, Result};
use attackgraph_render::RenderedRecord;

/// Write one file per record under `out`, creating the directory if
/// absent. An unwritable directory is fatal; a single file that fails
/// to write is logged and skipped. Returns (written, failed).
pub fn write_records(out: &str, records: &[RenderedRecord]) -> Result<(usize, usize)> {
    let out_dir = Path::new(out);
    ensure_dir(out_dir)?;

    let mut written = 0usize;
    let mut failed = 0usize;
    for record in records {
        let path = out_dir.join(&record.filename);
        match fs::write(&path, &record.body) {
            Ok(()) => {
                debug!("Extracted: {} -> {}", record.attack_id, record.filename);
                written += 1;
            }
            Err(err) => {
                warn!("Failed to write {}: {err}", path.display());
                failed += 1;
            }
        }
    }
    Ok((written, failed))
}

/// Write the nested knowledge base to a single file under `out`.
pub fn write_nested(out: &str, filename: &str, kb: &str) -> Result<()> {
    let out_dir = Path::new(out);
    ensure_dir(out_dir)?;

    let path = out_dir.join(filename);
    fs::write(&path, kb).map_err(|err| {
        Error::from(err)
            .with_operation("write_nested")
            .with_context("path", path.display().to_string())
    })?;
    info!("Nested KB written to {}", path.display());
    Ok(())
}

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|err| {
        Error::from(err)
            .with_operation("ensure_dir")
            .with_context("dir", dir.display().to_string())
    })
}
