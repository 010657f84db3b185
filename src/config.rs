use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};
use url::Url;

use crate::client::DEFAULT_USER_AGENT;
use crate::error::HarvestError;
use crate::record::TagFormat;
use crate::sink::OutputMode;

pub const DEFAULT_BASE_URL: &str = "https://archiveofourown.org";
pub const DEFAULT_OUTPUT: &str = "fandom_works.csv";
pub const DEFAULT_MAX_PAGES: u32 = 5;
pub const DEFAULT_DELAY_SECS: u64 = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything a harvest run needs, independent of how it was supplied.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestConfig {
    pub fandom: String,
    pub base_url: Url,
    pub max_pages: u32,
    pub output: PathBuf,
    pub output_mode: OutputMode,
    pub tag_format: TagFormat,
    pub delay: Duration,
    pub jitter: Duration,
    pub delay_before_first: bool,
    pub timeout: Duration,
    pub user_agent: String,
}

impl HarvestConfig {
    pub fn new(fandom: impl Into<String>) -> Result<Self, HarvestError> {
        Ok(HarvestConfig {
            fandom: fandom.into(),
            base_url: Url::parse(DEFAULT_BASE_URL)?,
            max_pages: DEFAULT_MAX_PAGES,
            output: PathBuf::from(DEFAULT_OUTPUT),
            output_mode: OutputMode::Append,
            tag_format: TagFormat::Joined,
            delay: Duration::from_secs(DEFAULT_DELAY_SECS),
            jitter: Duration::ZERO,
            delay_before_first: true,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), HarvestError> {
        if self.fandom.trim().is_empty() {
            return Err(HarvestError::Config("fandom tag is required".to_string()));
        }
        if self.max_pages == 0 {
            return Err(HarvestError::Config("max pages must be at least 1".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(HarvestError::Config("timeout must be at least 1 second".to_string()));
        }
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(HarvestError::Config(format!(
                "base url must be http or https, got {}",
                self.base_url
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TagFormatArg {
    /// Comma-space joined names
    Joined,
    /// JSON array of names
    Json,
}

impl From<TagFormatArg> for TagFormat {
    fn from(arg: TagFormatArg) -> Self {
        match arg {
            TagFormatArg::Joined => TagFormat::Joined,
            TagFormatArg::Json => TagFormat::Json,
        }
    }
}

/// Harvest a fandom's works listing into a CSV file, one page at a time.
#[derive(Debug, Parser)]
#[command(name = "fandom-harvest", version, about)]
pub struct Cli {
    /// Fandom tag, raw or URL-encoded (e.g. "Queen of Tears (TV)").
    #[arg(env = "HARVEST_FANDOM")]
    pub fandom: String,

    /// Number of listing pages to walk, starting at page 1.
    #[arg(short = 'p', long, env = "HARVEST_MAX_PAGES", default_value_t = DEFAULT_MAX_PAGES,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub max_pages: u32,

    /// CSV file the records are appended to.
    #[arg(short, long, env = "HARVEST_OUTPUT", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Truncate the output file instead of appending to it.
    #[arg(long, env = "HARVEST_OVERWRITE")]
    pub overwrite: bool,

    /// Seconds to wait before each page request.
    #[arg(long, env = "HARVEST_DELAY", default_value = "10", value_parser = parse_seconds)]
    pub delay: Duration,

    /// Up to this many extra random seconds added to each delay.
    #[arg(long, env = "HARVEST_JITTER", default_value = "0", value_parser = parse_seconds)]
    pub jitter: Duration,

    /// Fetch page 1 immediately instead of waiting first.
    #[arg(long, env = "HARVEST_NO_INITIAL_DELAY")]
    pub no_initial_delay: bool,

    /// Per-request timeout in seconds.
    #[arg(long, env = "HARVEST_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Site origin; work links are resolved against it.
    #[arg(long, env = "HARVEST_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: Url,

    /// User-Agent header sent with every request.
    #[arg(long, env = "HARVEST_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// How the tags column is written.
    #[arg(long, env = "HARVEST_TAGS_FORMAT", value_enum, default_value_t = TagFormatArg::Joined)]
    pub tags_format: TagFormatArg,

    /// Increase logging verbosity (-v, -vv).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn into_config(self) -> Result<HarvestConfig, HarvestError> {
        let config = HarvestConfig {
            fandom: self.fandom,
            base_url: self.base_url,
            max_pages: self.max_pages,
            output: self.output,
            output_mode: if self.overwrite { OutputMode::Overwrite } else { OutputMode::Append },
            tag_format: self.tags_format.into(),
            delay: self.delay,
            jitter: self.jitter,
            delay_before_first: !self.no_initial_delay,
            timeout: Duration::from_secs(self.timeout),
            user_agent: self.user_agent,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Non-negative seconds, fractions allowed, small enough for a `Duration`.
fn parse_seconds(raw: &str) -> Result<Duration, String> {
    let secs: f64 = raw.parse().map_err(|e| format!("{}: {}", raw, e))?;
    Duration::try_from_secs_f64(secs)
        .map_err(|_| format!("{} is not a usable number of seconds", raw))
}
