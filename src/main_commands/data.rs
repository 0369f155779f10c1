use std::path::Path;

use battery_arb::config::AppConfig;
use battery_arb::domain::PriceSeries;
use battery_arb::error::Result;

/// Write a synthetic price series to CSV
pub(crate) fn run_generate(
    config: &AppConfig,
    steps: Option<usize>,
    seed: Option<u64>,
    output: &Path,
) -> Result<()> {
    let mut synthetic = config.synthetic.clone();
    if let Some(steps) = steps {
        synthetic.steps = steps;
    }
    if let Some(seed) = seed {
        synthetic.seed = seed;
    }

    let series = PriceSeries::synthetic(&synthetic)?;
    series.write_csv(output)?;

    println!(
        "✓ Wrote {} prices (mean {:.2}) to {}",
        series.len(),
        series.mean_price(),
        output.display()
    );
    Ok(())
}
