use scraper::Html;
use log::{info, warn};

use crate::client::Fetch;
use crate::delay_manager::Pacer;
use crate::error::{HarvestError, SinkError};
use crate::extractor::{Extractor, SelectorChain, WORK_ITEM_SELECTORS};
use crate::record::WorkRecord;
use crate::sink::RecordSink;

/// What happened to one listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Records were flushed to the sink (possibly zero of them).
    Saved(usize),
    /// The page held no work items.
    Empty,
    /// The request failed; nothing from this page was kept.
    FetchFailed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub pages_saved: u32,
    pub pages_empty: u32,
    pub pages_failed: u32,
    pub records: usize,
    pub skipped_nodes: usize,
}

impl RunSummary {
    fn count(&mut self, outcome: PageOutcome) {
        match outcome {
            PageOutcome::Saved(n) => {
                self.pages_saved += 1;
                self.records += n;
            }
            PageOutcome::Empty => self.pages_empty += 1,
            PageOutcome::FetchFailed => self.pages_failed += 1,
        }
    }
}

/// Walks pages `1..=max_pages` one at a time: wait, fetch, extract, flush.
/// Network failures and empty pages skip the page; sink failures end the run.
pub struct Harvester<'a, F: Fetch> {
    client: &'a F,
    extractor: Extractor,
    items: SelectorChain,
    pacer: Pacer,
    max_pages: u32,
}

impl<'a, F: Fetch> Harvester<'a, F> {
    pub fn new(
        client: &'a F,
        extractor: Extractor,
        pacer: Pacer,
        max_pages: u32,
    ) -> Result<Self, HarvestError> {
        Ok(Harvester {
            client,
            extractor,
            items: SelectorChain::parse(WORK_ITEM_SELECTORS)?,
            pacer,
            max_pages,
        })
    }

    pub fn run<S: RecordSink>(&self, sink: &mut S) -> Result<RunSummary, SinkError> {
        let mut summary = RunSummary::default();

        for page in 1..=self.max_pages {
            let outcome = self.harvest_page(page, sink, &mut summary.skipped_nodes)?;
            summary.count(outcome);
        }
        sink.finish()?;

        info!(
            "Finished scraping {} works in total ({} pages saved, {} empty, {} failed, {} items skipped).",
            summary.records,
            summary.pages_saved,
            summary.pages_empty,
            summary.pages_failed,
            summary.skipped_nodes
        );
        Ok(summary)
    }

    fn harvest_page<S: RecordSink>(
        &self,
        page: u32,
        sink: &mut S,
        skipped: &mut usize,
    ) -> Result<PageOutcome, SinkError> {
        self.pacer.wait(page);
        info!("Scraping page {}...", page);

        let body = match self.client.fetch_page(page) {
            Ok(body) => body,
            Err(e) => {
                warn!("Error scraping page {}: {}", page, e);
                return Ok(PageOutcome::FetchFailed);
            }
        };

        let records = match self.extract_page(page, &body, skipped) {
            Some(records) => records,
            None => {
                warn!("No works found on page {}, skipping...", page);
                return Ok(PageOutcome::Empty);
            }
        };

        sink.append(&records)?;
        info!("Saved {} works from page {}", records.len(), page);
        Ok(PageOutcome::Saved(records.len()))
    }

    /// `None` when neither item selector finds anything.
    fn extract_page(&self, page: u32, body: &str, skipped: &mut usize) -> Option<Vec<WorkRecord>> {
        let document = Html::parse_document(body);
        let nodes = self.items.all_in(&document);
        if nodes.is_empty() {
            return None;
        }
        info!("Found {} works on page {}", nodes.len(), page);

        let mut records = Vec::with_capacity(nodes.len());
        for node in nodes {
            match self.extractor.extract(node) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!("Error extracting work info: {}", e);
                    *skipped += 1;
                }
            }
        }
        Some(records)
    }
}
