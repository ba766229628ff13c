use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// How an event can be attended, derived from its location text and any
/// virtual-meeting links found on the detail page.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttendanceType {
    #[serde(rename = "IN_PERSON")]
    InPerson,
    #[serde(rename = "ONLINE")]
    Online,
    #[serde(rename = "HYBRID")]
    Hybrid,
}

impl AttendanceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceType::InPerson => "IN_PERSON",
            AttendanceType::Online => "ONLINE",
            AttendanceType::Hybrid => "HYBRID",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "IN_PERSON" => Some(AttendanceType::InPerson),
            "ONLINE" => Some(AttendanceType::Online),
            "HYBRID" => Some(AttendanceType::Hybrid),
            _ => None,
        }
    }
}

/// One fully parsed calendar event, keyed by the id embedded in the source
/// URL's query string. A record is only persisted once both `title` and
/// `start_datetime` have resolved.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EventRecord {
    pub external_id: String,
    pub source_url: String,
    pub title: String,
    pub start_datetime: Option<NaiveDateTime>,
    pub end_datetime: Option<NaiveDateTime>,
    pub all_day: bool,
    pub location: Option<String>,
    pub location_virtual_url: Option<String>,
    pub attendance_type: AttendanceType,
    pub description: Option<String>,
    pub organizer_sponsor: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub cost_admission: Option<String>,
    pub event_page_url: Option<String>,
    pub last_scraped_at: DateTime<Utc>,
}

/// A list-page reference to one event, not yet fetched in detail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateRef {
    pub url: String,
    pub external_id: String,
}
