use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use super::base::{self, SiblingToken};
use super::{contact, datetime};
use crate::error::ScrapeError;
use crate::models::{AttendanceType, EventRecord};

static CONTAINER_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div#content").expect("container selector"));
static HEADING_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2, h3").expect("heading selector"));
static PARAGRAPH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("paragraph selector"));
static LABEL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("strong, b").expect("label selector"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("link selector"));

static VIRTUAL_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)https?://[^\s"'<>]*(?:zoom\.us|meet\.google\.com|teams\.microsoft\.com|webex\.com)[^\s"'<>]*"#)
        .expect("virtual url regex")
});
static CURRENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\s?\d+(?:\.\d{2})?").expect("currency regex"));

/// Room names can coincidentally resemble date tokens, so any line carrying
/// one of these wins the location bucket over a date-pattern match.
const LOCATION_KEYWORDS: &[&str] = &[
    "campus", "hall", "center", "library", "room", "rm.", "bldg", "building", "auditorium",
    "theatre", "theater", "lawn", "courtyard", "lounge", "online", "zoom",
];

const VIRTUAL_KEYWORDS: &[&str] = &[
    "online", "zoom", "virtual", "webinar", "webex", "livestream",
];

const MORE_INFO_LINK_KEYWORDS: &[&str] =
    &["more info", "website", "details", "event page", "register"];

const FREE_PHRASES: &[&str] = &[
    "free admission",
    "admission is free",
    "free and open",
    "free of charge",
    "free to the public",
    "no charge",
];

const COST_CONTEXT_PAD: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineBucket {
    Date,
    Location,
}

/// Seam for the location-vs-date tie break; the pipeline control flow never
/// depends on how a classifier decides.
pub trait LineClassifier {
    fn classify(&self, line: &str) -> LineBucket;
}

/// Default classifier: fixed keyword dictionary first, date/time patterns
/// second, location as the catch-all.
pub struct KeywordLineClassifier;

impl LineClassifier for KeywordLineClassifier {
    fn classify(&self, line: &str) -> LineBucket {
        let lower = line.to_lowercase();
        if LOCATION_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            return LineBucket::Location;
        }
        if datetime::has_date_signal(line) {
            return LineBucket::Date;
        }
        LineBucket::Location
    }
}

pub fn parse(html: &str, source_url: &str, external_id: &str) -> Result<EventRecord, ScrapeError> {
    parse_with(&KeywordLineClassifier, html, source_url, external_id)
}

/// Parses one detail page into a candidate record. Fails the whole candidate
/// on a missing container or an unresolved title/start date; never yields a
/// partial record.
pub fn parse_with(
    classifier: &dyn LineClassifier,
    html: &str,
    source_url: &str,
    external_id: &str,
) -> Result<EventRecord, ScrapeError> {
    let document = Html::parse_document(html);
    let container = document
        .select(&CONTAINER_SELECTOR)
        .next()
        .ok_or_else(|| ScrapeError::MissingContainer {
            url: source_url.to_string(),
        })?;

    let Some(heading) = container.select(&HEADING_SELECTOR).next() else {
        return Err(ScrapeError::IncompleteRecord {
            url: source_url.to_string(),
            missing: "title",
        });
    };
    let title = base::inner_text(heading);
    if title.is_empty() {
        return Err(ScrapeError::IncompleteRecord {
            url: source_url.to_string(),
            missing: "title",
        });
    }

    // The date/time/location blob sits between the heading and the first
    // horizontal rule or paragraph.
    let tokens: Vec<SiblingToken> = base::sibling_tokens(heading, |el| {
        matches!(el.value().name(), "hr" | "p")
    })
    .collect();
    let blob_lines = base::token_lines(tokens);

    let mut date_lines: Vec<String> = Vec::new();
    let mut location_lines: Vec<String> = Vec::new();
    for line in &blob_lines {
        match classifier.classify(line) {
            LineBucket::Date => date_lines.push(line.clone()),
            LineBucket::Location => location_lines.push(line.clone()),
        }
    }
    let all_day_hint = blob_lines
        .iter()
        .any(|line| line.to_lowercase().contains("all day"));

    let schedule = datetime::resolve(&date_lines.join(" "), all_day_hint, source_url);
    if schedule.start.is_none() {
        return Err(ScrapeError::IncompleteRecord {
            url: source_url.to_string(),
            missing: "start date",
        });
    }

    let blocks = collect_blocks(&container);

    let info_text = blocks.info.as_ref().map(|p| base::inner_text(*p));
    let info_links = blocks
        .info
        .as_ref()
        .map(|p| collect_links(p, source_url))
        .unwrap_or_default();

    let event_page_url = pick_event_page_url(&info_links);
    let mailto_email = info_links
        .iter()
        .find_map(|link| link.href.strip_prefix("mailto:"))
        .and_then(|addr| addr.split('?').next())
        .map(str::to_string);

    let contact = contact::extract(
        info_text.as_deref().unwrap_or(""),
        mailto_email.as_deref(),
        event_page_url.as_deref(),
    );

    let cost_admission = blocks
        .ticket_text
        .clone()
        .or_else(|| info_text.as_deref().and_then(scan_cost));

    let description = if blocks.description.is_empty() {
        None
    } else {
        Some(blocks.description.join("\n"))
    };

    let location_text = if location_lines.is_empty() {
        None
    } else {
        Some(location_lines.join(", "))
    };

    // Virtual link search order: location text, info links, description.
    let location_virtual_url = location_text
        .as_deref()
        .and_then(find_virtual_url)
        .or_else(|| {
            info_links
                .iter()
                .find(|link| VIRTUAL_URL_RE.is_match(&link.href))
                .map(|link| link.href.clone())
        })
        .or_else(|| description.as_deref().and_then(find_virtual_url));

    let has_virtual = location_virtual_url.is_some()
        || [
            location_text.as_deref(),
            description.as_deref(),
            info_text.as_deref(),
        ]
        .iter()
        .flatten()
        .any(|text| mentions_virtual(text));

    let physical = location_text
        .as_deref()
        .map(is_physical_location)
        .unwrap_or(false);

    let (attendance_type, location) = if physical && has_virtual {
        (AttendanceType::Hybrid, location_text)
    } else if has_virtual {
        (AttendanceType::Online, None)
    } else {
        if location_text.is_none() {
            warn!("no location found for event {external_id}; assuming in-person");
        }
        (AttendanceType::InPerson, location_text)
    };

    Ok(EventRecord {
        external_id: external_id.to_string(),
        source_url: source_url.to_string(),
        title,
        start_datetime: schedule.start,
        end_datetime: schedule.end,
        all_day: schedule.all_day,
        location,
        location_virtual_url,
        attendance_type,
        description,
        organizer_sponsor: blocks.sponsor_text,
        contact_name: contact.name,
        contact_phone: contact.phone,
        contact_email: contact.email,
        cost_admission,
        event_page_url,
        last_scraped_at: Utc::now(),
    })
}

struct LabelledBlocks<'a> {
    sponsor_text: Option<String>,
    info: Option<ElementRef<'a>>,
    ticket_text: Option<String>,
    description: Vec<String>,
}

/// Sorts the container's paragraphs by their bold lead-in label; unlabelled
/// paragraphs accumulate into the description.
fn collect_blocks<'a>(container: &ElementRef<'a>) -> LabelledBlocks<'a> {
    let mut blocks = LabelledBlocks {
        sponsor_text: None,
        info: None,
        ticket_text: None,
        description: Vec::new(),
    };

    for paragraph in container.select(&PARAGRAPH_SELECTOR) {
        let label = base::first_text(&paragraph, &LABEL_SELECTOR)
            .map(|text| text.to_lowercase())
            .unwrap_or_default();
        if label.starts_with("event sponsor") || label.starts_with("sponsor") {
            if blocks.sponsor_text.is_none() {
                blocks.sponsor_text = strip_label(&base::inner_text(paragraph));
            }
        } else if label.starts_with("more information") {
            if blocks.info.is_none() {
                blocks.info = Some(paragraph);
            }
        } else if label.starts_with("ticket information") {
            if blocks.ticket_text.is_none() {
                blocks.ticket_text = strip_label(&base::inner_text(paragraph));
            }
        } else {
            let text = base::inner_text(paragraph);
            if !text.is_empty() {
                blocks.description.push(text);
            }
        }
    }

    blocks
}

/// Drops a leading `Label:` (everything up to the first colon) from a block's
/// text.
fn strip_label(text: &str) -> Option<String> {
    let rest = match text.split_once(':') {
        Some((_, rest)) => rest,
        None => text,
    };
    let cleaned = base::clean_text(rest);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

struct InfoLink {
    text: String,
    href: String,
}

fn collect_links(paragraph: &ElementRef<'_>, source_url: &str) -> Vec<InfoLink> {
    paragraph
        .select(&LINK_SELECTOR)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?.trim().to_string();
            let href = if href.starts_with("mailto:") {
                href
            } else {
                base::absolute_url(source_url, Some(href))?
            };
            Some(InfoLink {
                text: base::inner_text(anchor),
                href,
            })
        })
        .collect()
}

/// The "more info" link is matched by link text first; when nothing reads
/// like one, the first non-mailto link stands in.
fn pick_event_page_url(links: &[InfoLink]) -> Option<String> {
    links
        .iter()
        .find(|link| {
            let text = link.text.to_lowercase();
            MORE_INFO_LINK_KEYWORDS.iter().any(|kw| text.contains(kw))
        })
        .or_else(|| links.iter().find(|link| !link.href.starts_with("mailto:")))
        .map(|link| link.href.clone())
}

/// Heuristic admission scan: a currency amount or an admission-free phrase,
/// kept with a little surrounding context.
fn scan_cost(text: &str) -> Option<String> {
    if let Some(m) = CURRENCY_RE.find(text) {
        return Some(base::context_window(text, m.start(), m.end(), COST_CONTEXT_PAD));
    }
    let lower = text.to_lowercase();
    for phrase in FREE_PHRASES {
        if let Some(start) = lower.find(phrase) {
            return Some(base::context_window(
                text,
                start,
                start + phrase.len(),
                COST_CONTEXT_PAD,
            ));
        }
    }
    None
}

fn find_virtual_url(text: &str) -> Option<String> {
    VIRTUAL_URL_RE
        .find(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ')']).to_string())
}

fn mentions_virtual(text: &str) -> bool {
    let lower = text.to_lowercase();
    VIRTUAL_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// A location line counts as physical when something is left after the
/// virtual vocabulary is removed ("Online via Zoom" is not a place).
fn is_physical_location(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .any(|word| {
            !VIRTUAL_KEYWORDS.contains(&word) && !matches!(word, "via" | "and" | "or" | "only")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SAMPLE_HTML: &str = r#"
    <html><body>
    <div id="content">
        <h2>Graduate Writing Workshop</h2>
        March 5, 2025 9:00am - 11:00am<br>
        Hamilton Library Room 301
        <hr>
        <p>Bring a draft of your thesis chapter for peer review.</p>
        <p><strong>Event Sponsor:</strong> Graduate Division</p>
        <p><strong>More Information:</strong> Jane Keawe, (808) 956-7214,
            <a href="mailto:jkeawe@hawaii.edu">jkeawe@hawaii.edu</a>,
            <a href="https://manoa.hawaii.edu/grad/workshops">https://manoa.hawaii.edu/grad/workshops</a></p>
        <p><strong>Ticket Information:</strong> Free and open to the public</p>
    </div>
    </body></html>
    "#;

    const SOURCE_URL: &str = "https://www.hawaii.edu/calendar/manoa/event.php?et_id=100";

    #[test]
    fn parses_a_complete_detail_page() {
        let record = parse(SAMPLE_HTML, SOURCE_URL, "100").expect("record parses");
        assert_eq!(record.external_id, "100");
        assert_eq!(record.title, "Graduate Writing Workshop");
        assert_eq!(
            record.start_datetime,
            NaiveDate::from_ymd_opt(2025, 3, 5).unwrap().and_hms_opt(9, 0, 0)
        );
        assert_eq!(
            record.end_datetime,
            NaiveDate::from_ymd_opt(2025, 3, 5).unwrap().and_hms_opt(11, 0, 0)
        );
        assert!(!record.all_day);
        assert_eq!(record.location.as_deref(), Some("Hamilton Library Room 301"));
        assert_eq!(record.attendance_type, AttendanceType::InPerson);
        assert_eq!(
            record.description.as_deref(),
            Some("Bring a draft of your thesis chapter for peer review.")
        );
        assert_eq!(record.organizer_sponsor.as_deref(), Some("Graduate Division"));
        assert_eq!(record.contact_name.as_deref(), Some("Jane Keawe"));
        assert_eq!(record.contact_phone.as_deref(), Some("(808) 956-7214"));
        assert_eq!(record.contact_email.as_deref(), Some("jkeawe@hawaii.edu"));
        assert_eq!(
            record.event_page_url.as_deref(),
            Some("https://manoa.hawaii.edu/grad/workshops")
        );
        assert_eq!(
            record.cost_admission.as_deref(),
            Some("Free and open to the public")
        );
    }

    #[test]
    fn location_keyword_beats_date_pattern() {
        let classifier = KeywordLineClassifier;
        assert_eq!(
            classifier.classify("Hamilton Library 3:00pm Wing"),
            LineBucket::Location
        );
        assert_eq!(
            classifier.classify("March 5, 2025 3:00pm"),
            LineBucket::Date
        );
    }

    #[test]
    fn missing_container_never_yields_a_record() {
        let html = "<html><body><h2>Orphan Event</h2></body></html>";
        let err = parse(html, SOURCE_URL, "100").expect_err("no container");
        assert!(matches!(err, ScrapeError::MissingContainer { .. }));
    }

    #[test]
    fn unresolved_start_discards_the_candidate() {
        let html = r#"
        <div id="content">
            <h2>Mystery Event</h2>
            Date to be announced<br>
            Campus Center
            <hr>
            <p>Details forthcoming.</p>
        </div>
        "#;
        let err = parse(html, SOURCE_URL, "100").expect_err("no start date");
        assert!(matches!(
            err,
            ScrapeError::IncompleteRecord { missing: "start date", .. }
        ));
    }

    #[test]
    fn virtual_only_event_is_online_with_location_cleared() {
        let html = r#"
        <div id="content">
            <h2>Remote Career Chat</h2>
            April 2, 2025 12:00pm - 1:00pm<br>
            Online via Zoom
            <hr>
            <p>Join at https://zoom.us/j/99887766 for the session.</p>
        </div>
        "#;
        let record = parse(html, SOURCE_URL, "200").expect("record parses");
        assert_eq!(record.attendance_type, AttendanceType::Online);
        assert_eq!(record.location, None);
        assert_eq!(
            record.location_virtual_url.as_deref(),
            Some("https://zoom.us/j/99887766")
        );
    }

    #[test]
    fn physical_plus_virtual_is_hybrid() {
        let html = r#"
        <div id="content">
            <h2>Sustainability Town Hall</h2>
            April 10, 2025 3:00pm<br>
            Campus Center Ballroom and Zoom
            <hr>
            <p>Community updates and open Q&amp;A.</p>
        </div>
        "#;
        let record = parse(html, SOURCE_URL, "300").expect("record parses");
        assert_eq!(record.attendance_type, AttendanceType::Hybrid);
        assert_eq!(
            record.location.as_deref(),
            Some("Campus Center Ballroom and Zoom")
        );
    }

    #[test]
    fn all_day_line_sets_the_flag() {
        let html = r#"
        <div id="content">
            <h2>Founders Day</h2>
            All day March 5<br>
            Campus Mall
            <hr>
            <p>Exhibits across the mall.</p>
        </div>
        "#;
        let record = parse(html, SOURCE_URL, "400").expect("record parses");
        assert!(record.all_day);
        assert_eq!(record.end_datetime, None);
    }
}
