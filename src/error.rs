use thiserror::Error;

/// Per-candidate failure taxonomy. None of these propagate past a single
/// candidate's boundary; the pipeline logs the error and moves on.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("fetch failed for {url}{}: {message}", status_suffix(.status))]
    Fetch {
        url: String,
        status: Option<u16>,
        message: String,
    },
    #[error("detail page has no content container: {url}")]
    MissingContainer { url: String },
    #[error("incomplete record (missing {missing}) for {url}")]
    IncompleteRecord { url: String, missing: &'static str },
    #[error("persistence failed: {0}")]
    Persistence(#[from] rusqlite::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {code})"),
        None => String::new(),
    }
}
