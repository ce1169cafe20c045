//! Core processing pipeline: load bundles → build graph → render output.

use std::time::Instant;

use tracing::{error, info};

use attackgraph_core::{StixBundle, build_graph, bundle_from_path};
use attackgraph_error::{Error, Result};
use attackgraph_render::{RenderOption, render_nested, render_records};

use crate::AttackgraphOptions;
use crate::output::{write_nested, write_records};
use crate::profile::profile_phase;

/// Counters reported after a run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub bundles_loaded: usize,
    pub bundles_failed: usize,
    pub entities: usize,
    pub edges: usize,
    pub records_written: usize,
    pub records_failed: usize,
    pub nested_written: bool,
}

/// Process a set of discovered bundle paths.
///
/// This is the core pipeline:
/// 1. Load bundles (failures skipped; abort only when none load)
/// 2. Build the entity graph
/// 3. Render and write per-technique records
/// 4. Render and write the nested knowledge base
pub fn process_bundles(opts: &AttackgraphOptions, paths: &[String]) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    // 1. Load
    let load_start = Instant::now();
    let bundles = profile_phase("load", || load_bundles(paths, &mut summary));
    info!(
        "Bundle loading: {:.2}s ({} loaded, {} failed)",
        load_start.elapsed().as_secs_f64(),
        summary.bundles_loaded,
        summary.bundles_failed
    );

    if bundles.is_empty() {
        return Err(Error::graph_build_failed("no bundles loaded")
            .with_operation("process_bundles")
            .with_context("attempted", paths.len().to_string()));
    }

    // 2. Build graph
    let build_start = Instant::now();
    let graph = profile_phase("build", || build_graph(&bundles));
    summary.entities = graph.entity_count();
    summary.edges = graph.relations().edge_count();
    info!(
        "Graph building: {:.2}s ({} entities, {} edges)",
        build_start.elapsed().as_secs_f64(),
        summary.entities,
        summary.edges
    );

    // 3. Records
    if !opts.skip_records {
        let records_start = Instant::now();
        let option = RenderOption::default()
            .with_sequential(opts.sequential)
            .with_remove_revoked_deprecated(!opts.keep_revoked);
        let report = profile_phase("records", || render_records(&graph, &option));
        summary.records_failed = report.failures.len();
        info!(
            "Record rendering: {:.2}s ({} records, {} failed)",
            records_start.elapsed().as_secs_f64(),
            report.records.len(),
            report.failures.len()
        );

        let write_start = Instant::now();
        let (written, write_failed) = write_records(&opts.out, &report.records)?;
        summary.records_written = written;
        summary.records_failed += write_failed;
        info!(
            "Record writing: {:.2}s ({} files)",
            write_start.elapsed().as_secs_f64(),
            written
        );
    }

    // 4. Nested KB
    if !opts.skip_nested {
        let nested_start = Instant::now();
        let kb = profile_phase("nested", || render_nested(&graph))?;
        write_nested(&opts.out, &opts.nested_file, &kb)?;
        summary.nested_written = true;
        info!(
            "Nested KB: {:.2}s ({} bytes)",
            nested_start.elapsed().as_secs_f64(),
            kb.len()
        );
    }

    Ok(summary)
}

/// Load every path that parses; a bundle that fails is logged and
/// skipped so one bad file never spoils the batch.
fn load_bundles(paths: &[String], summary: &mut RunSummary) -> Vec<StixBundle> {
    let mut bundles = Vec::new();
    for path in paths {
        match bundle_from_path(path) {
            Ok(bundle) => {
                bundles.push(bundle);
                summary.bundles_loaded += 1;
            }
            Err(err) => {
                error!("Skipping bundle {path}: {err}");
                summary.bundles_failed += 1;
            }
        }
    }
    bundles
}
