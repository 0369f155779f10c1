use battery_arb::config::AppConfig;
use battery_arb::error::Result;

/// Print the effective configuration
pub(crate) fn run_show(config: &AppConfig) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}

/// Validate parameters and make sure the configured price data loads
pub(crate) fn run_validate(config: &AppConfig) -> Result<()> {
    config.validate()?;
    let prices = config.load_prices(None)?;

    println!("✓ Configuration valid");
    println!(
        "  data: {} ({} prices, episode length {})",
        prices.source(),
        prices.len(),
        config.environment.max_steps.min(prices.len())
    );
    Ok(())
}
