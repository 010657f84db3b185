pub mod error;
pub mod config;
pub mod record;
pub mod client;
pub mod extractor;
pub mod delay_manager;
pub mod sink;
pub mod harvester;
pub mod logger;

use log::info;

// Exporting types for convenience
pub use client::{Fetch, ListingClient};
pub use config::HarvestConfig;
pub use delay_manager::Pacer;
pub use error::{ExtractionError, HarvestError, NetworkError, SinkError};
pub use extractor::Extractor;
pub use harvester::{Harvester, PageOutcome, RunSummary};
pub use record::{TagFormat, WorkRecord};
pub use sink::{CsvSink, OutputMode, RecordSink};

/// Wire client, extractor, pacer and CSV sink together from `config` and run
/// every page. Only an output failure makes this return an error mid-run.
pub fn harvest(config: &HarvestConfig) -> Result<RunSummary, HarvestError> {
    config.validate()?;

    let client = ListingClient::new(
        &config.base_url,
        &config.fandom,
        &config.user_agent,
        config.timeout,
    )?;
    let extractor = Extractor::new(config.base_url.clone())?;
    let pacer = Pacer::new(config.delay, config.jitter, config.delay_before_first);
    let mut sink = CsvSink::open(&config.output, config.output_mode, config.tag_format)?;

    info!(
        "Harvesting '{}' ({} pages) into {}",
        config.fandom,
        config.max_pages,
        sink.path().display()
    );

    let harvester = Harvester::new(&client, extractor, pacer, config.max_pages)?;
    Ok(harvester.run(&mut sink)?)
}
