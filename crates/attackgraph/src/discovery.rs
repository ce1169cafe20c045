//! Bundle discovery for attackgraph.

use std::collections::HashSet;
use std::time::Instant;

use ignore::WalkBuilder;
use tracing::info;

use attackgraph_error::{Error, Result};

use crate::AttackgraphOptions;

/// Collect candidate bundle paths.
///
/// Explicit `opts.bundles` come first in the order given, then every
/// `*.json` file found under `opts.dirs`. Walked paths are sorted so a
/// rerun loads bundles in the same order; the walk honors ignore files
/// and skips hidden entries.
pub fn discover_bundles(opts: &AttackgraphOptions) -> Result<Vec<String>> {
    let discovery_start = Instant::now();

    let mut seen = HashSet::new();
    let mut paths = Vec::new();
    let mut add_path = |path: &str| {
        if seen.insert(path.to_string()) {
            paths.push(path.to_string());
        }
    };

    for bundle in &opts.bundles {
        add_path(bundle);
    }

    if !opts.dirs.is_empty() {
        let mut walked = Vec::new();

        for dir in &opts.dirs {
            let mut builder = WalkBuilder::new(dir);
            builder.standard_filters(true).follow_links(false);

            for entry in builder.build() {
                let entry = entry.map_err(|err| {
                    Error::traversal_failed("directory walk failed")
                        .with_operation("discover_bundles")
                        .with_context("dir", dir.clone())
                        .set_source(err)
                })?;

                // Only process files
                if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                    continue;
                }

                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) == Some("json") {
                    walked.push(path.to_string_lossy().into_owned());
                }
            }
        }

        walked.sort();
        for path in &walked {
            add_path(path);
        }
    }

    info!(
        "Bundle discovery: {:.2}s ({} candidates)",
        discovery_start.elapsed().as_secs_f64(),
        paths.len()
    );

    if paths.is_empty() {
        return Err(Error::config_invalid(
            "no bundle files found under the configured inputs",
        )
        .with_operation("discover_bundles"));
    }

    Ok(paths)
}
