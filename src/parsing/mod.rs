pub mod base;
pub mod contact;
pub mod datetime;
pub mod detail_page;
pub mod list_page;

/// Base against which relative hrefs on the index page are resolved.
pub const CALENDAR_BASE_URL: &str = "https://www.hawaii.edu/calendar/manoa/";

/// The no-argument entry point always starts from this index page.
pub const LIST_PAGE_URL: &str = "https://www.hawaii.edu/calendar/manoa/index.php";

/// Query parameter on detail-page URLs carrying the stable external id.
pub const ID_QUERY_PARAM: &str = "et_id";
