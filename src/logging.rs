use tracing_subscriber::EnvFilter;

/// Console logging with `RUST_LOG` filtering; defaults to info for this crate.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("campus_scrape=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
