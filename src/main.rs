use anyhow::Context;

use campus_scrape::db::Store;
use campus_scrape::fetch::HttpFetcher;
use campus_scrape::{logging, pipeline};

fn main() -> anyhow::Result<()> {
    logging::init();

    // The store handle is scoped to this run; dropping it at the end of main
    // releases the connection after any in-flight upsert completes.
    let store = Store::open_default().context("unable to open the event store")?;
    let fetcher = HttpFetcher::new().context("unable to build the http client")?;

    let summary = pipeline::run(&fetcher, &store, pipeline::DETAIL_FETCH_DELAY)?;
    if summary.failed > 0 {
        tracing::warn!("{} of {} candidates failed", summary.failed, summary.processed);
    }
    Ok(())
}
