//! Bundle loading from JSON bytes and files.

use std::fs;
use std::path::Path;

use attackgraph_error::{Error, Result};
use tracing::debug;

use crate::stix::StixBundle;

/// Parse a STIX bundle from raw JSON bytes.
///
/// Malformed JSON and JSON lacking the bundle shape (a top-level
/// `objects` array) are reported as distinct kinds so callers can tell
/// "not JSON" from "not a bundle".
pub fn bundle_from_slice(bytes: &[u8]) -> Result<StixBundle> {
    let value: serde_json::Value = serde_json::from_slice(bytes).map_err(|err| {
        Error::bundle_parse_failed("input is not valid JSON")
            .with_operation("bundle_from_slice")
            .set_source(err)
    })?;
    serde_json::from_value(value).map_err(|err| {
        Error::invalid_format("JSON document is not a STIX bundle")
            .with_operation("bundle_from_slice")
            .set_source(err)
    })
}

/// Read and parse a STIX bundle from a file on disk.
pub fn bundle_from_path(path: impl AsRef<Path>) -> Result<StixBundle> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|err| {
        Error::from(err)
            .with_operation("bundle_from_path")
            .with_context("path", path.display().to_string())
    })?;
    let bundle = bundle_from_slice(&bytes).map_err(|err| {
        err.with_operation("bundle_from_path")
            .with_context("path", path.display().to_string())
    })?;
    debug!(
        path = %path.display(),
        objects = bundle.objects.len(),
        "loaded bundle"
    );
    Ok(bundle)
}
