//! attackgraph command-line interface.

pub mod discovery;
pub mod output;
pub mod pipeline;
pub mod profile;

use attackgraph_error::Result;

pub use pipeline::{RunSummary, process_bundles};
pub use profile::profile_phase;

/// Options for running attackgraph.
pub struct AttackgraphOptions {
    pub bundles: Vec<String>,
    pub dirs: Vec<String>,
    pub out: String,
    pub nested_file: String,
    pub skip_records: bool,
    pub skip_nested: bool,
    pub keep_revoked: bool,
    pub sequential: bool,
}

/// Main entry point
pub fn run_main(opts: &AttackgraphOptions) -> Result<RunSummary> {
    let bundles = discovery::discover_bundles(opts)?;
    process_bundles(opts, &bundles)
}
