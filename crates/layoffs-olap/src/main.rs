mod bootstrap;

use anyhow::{Context, Result};
use clap::Parser;
use olap_core::settings::Settings;
use olap_data::pipeline::analyze_file;

fn main() -> Result<()> {
    let settings = Settings::parse();

    bootstrap::setup_logging(settings.effective_log_level())?;

    tracing::info!("layoffs-olap v{} starting", env!("CARGO_PKG_VERSION"));

    let config = settings.cube_config()?;
    tracing::info!(
        "Input: {}, View: {}, Cube year: {}, Rolling: {} x{}",
        settings.input.display(),
        settings.view,
        config.cube_year,
        config.rolling_industry,
        config.rolling_window
    );

    let result = analyze_file(&settings.input, &config)
        .with_context(|| format!("processing {}", settings.input.display()))?;

    let report = result.report(settings.wants_etl(), settings.wants_cube());
    bootstrap::write_report(&report, settings.output.as_deref())?;

    Ok(())
}
