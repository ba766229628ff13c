use std::collections::HashSet;

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::warn;

use super::base;
use super::{CALENDAR_BASE_URL, ID_QUERY_PARAM};
use crate::models::CandidateRef;

static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table tr").expect("list row selector"));
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("list cell selector"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("list link selector"));

/// Extracts deduplicated event references from the index page. The event
/// link sits in the second cell of each table row; the first occurrence of
/// an external id wins and later duplicates are absorbed.
pub fn parse_candidates(html: &str) -> Vec<CandidateRef> {
    let document = Html::parse_document(html);
    let mut seen: HashSet<String> = HashSet::new();
    let mut candidates = Vec::new();

    for row in document.select(&ROW_SELECTOR) {
        let Some(cell) = row.select(&CELL_SELECTOR).nth(1) else {
            continue;
        };
        let Some(anchor) = cell.select(&LINK_SELECTOR).next() else {
            continue;
        };
        let href = anchor.value().attr("href").map(str::to_string);
        let Some(url) = base::absolute_url(CALENDAR_BASE_URL, href) else {
            continue;
        };
        let Some(external_id) = base::query_param(&url, ID_QUERY_PARAM) else {
            warn!("skipping list anchor without {ID_QUERY_PARAM}: {url}");
            continue;
        };
        if seen.insert(external_id.clone()) {
            candidates.push(CandidateRef { url, external_id });
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
    <table>
        <tr>
            <td>Mar 5</td>
            <td><a href="event.php?et_id=100">Graduate Writing Workshop</a></td>
        </tr>
        <tr>
            <td>Mar 6</td>
            <td><a href="event.php?et_id=101">Astronomy Open House</a></td>
        </tr>
        <tr>
            <td>Mar 5</td>
            <td><a href="event.php?et_id=100">Graduate Writing Workshop</a></td>
        </tr>
        <tr>
            <td>Mar 7</td>
            <td><a href="somewhere.php">No id here</a></td>
        </tr>
    </table>
    "#;

    #[test]
    fn dedupes_by_external_id_in_first_seen_order() {
        let candidates = parse_candidates(SAMPLE_HTML);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].external_id, "100");
        assert_eq!(candidates[1].external_id, "101");
        assert_eq!(
            candidates[0].url,
            "https://www.hawaii.edu/calendar/manoa/event.php?et_id=100"
        );
    }

    #[test]
    fn empty_page_yields_no_candidates() {
        assert!(parse_candidates("<html><body></body></html>").is_empty());
    }
}
