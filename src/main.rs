use fandom_harvester_lib::{config::Cli, harvest, logger};

use std::error::Error;
use log::{info, warn};

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    let config = cli.into_config()?;
    info!("Starting fandom harvest for '{}'...", config.fandom);

    let summary = harvest(&config)?;

    if summary.records > 0 {
        info!("Successfully collected {} works into {}", summary.records, config.output.display());
    } else {
        warn!("No works found. Check the fandom tag against the site's tag URL.");
    }
    Ok(())
}
