use anyhow::{Context, Result};
use tracing::{debug, info};
use trastformer_cli::{build_command, config_from_matches};
use trastformer_core::init_tracing;

fn main() -> Result<()> {
    // Parse command line arguments
    let matches = build_command().get_matches();
    let config = config_from_matches(&matches)?;

    // Initialize logging
    init_tracing(config.debug);
    debug!(?config, "Resolved configuration");

    let report = trastformer_core::run(&config).with_context(|| {
        format!("Failed to transform {}", config.source.display())
    })?;

    info!(
        output = %report.output.display(),
        rewrites = report.rewrites(),
        "Done"
    );
    Ok(())
}
