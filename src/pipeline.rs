use std::thread;
use std::time::Duration;

use anyhow::Context;
use chrono::{Duration as ChronoDuration, Utc};
use tracing::{info, warn};

use crate::db::Store;
use crate::error::ScrapeError;
use crate::fetch::PageFetcher;
use crate::models::CandidateRef;
use crate::parsing::{detail_page, list_page, LIST_PAGE_URL};

/// Pause between successive detail-page fetches. Pacing to be polite to the
/// source server, not a retry/backoff mechanism.
pub const DETAIL_FETCH_DELAY: Duration = Duration::from_secs(1);

/// Records not re-seen by any run within this horizon are considered stale.
const STALE_AFTER_DAYS: i64 = 30;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// One full scrape: list page, then each candidate in order, strictly
/// sequentially. A candidate failing at any stage is logged and skipped;
/// only a failed list-page fetch aborts the run.
pub fn run(
    fetcher: &dyn PageFetcher,
    store: &Store,
    delay: Duration,
) -> anyhow::Result<RunSummary> {
    let html = fetcher
        .fetch(LIST_PAGE_URL)
        .context("unable to fetch the calendar index page")?;
    let candidates = list_page::parse_candidates(&html);
    info!("found {} candidate events", candidates.len());

    let mut summary = RunSummary::default();
    for candidate in &candidates {
        summary.processed += 1;
        thread::sleep(delay);
        match scrape_candidate(fetcher, store, candidate) {
            Ok(()) => summary.succeeded += 1,
            Err(err) => {
                warn!("skipping event {}: {err}", candidate.external_id);
                summary.failed += 1;
            }
        }
    }

    let cutoff = Utc::now() - ChronoDuration::days(STALE_AFTER_DAYS);
    match store.remove_stale(cutoff) {
        Ok(removed) if removed > 0 => info!("removed {removed} stale events"),
        Ok(_) => {}
        Err(err) => warn!("stale-record cleanup failed: {err}"),
    }

    info!(
        "run complete: processed={} succeeded={} failed={}",
        summary.processed, summary.succeeded, summary.failed
    );
    Ok(summary)
}

fn scrape_candidate(
    fetcher: &dyn PageFetcher,
    store: &Store,
    candidate: &CandidateRef,
) -> Result<(), ScrapeError> {
    let html = fetcher.fetch(&candidate.url)?;
    let record = detail_page::parse(&html, &candidate.url, &candidate.external_id)?;
    store.upsert_event(&record)?;
    Ok(())
}
