use once_cell::sync::Lazy;
use regex::Regex;

use super::base::clean_text;

static LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^more information:?\s*").expect("info label regex"));
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(?\d{3}\)?[\s.-]?\d{3}[\s.-]\d{4}").expect("phone regex"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactInfo {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Pulls name/phone/email out of the More Information text. The email comes
/// from the mailto link; the phone from a regex over the remaining text; the
/// leftover, minus the section label and a redundant copy of the event page
/// URL, becomes the contact name when it still says something.
pub fn extract(
    block_text: &str,
    mailto_email: Option<&str>,
    event_page_url: Option<&str>,
) -> ContactInfo {
    let mut rest = LABEL_RE.replace(block_text.trim(), "").into_owned();

    let email = mailto_email.map(|addr| addr.trim().to_string()).filter(|a| !a.is_empty());
    if let Some(ref addr) = email {
        rest = rest.replace(addr.as_str(), "");
    }

    let phone = PHONE_RE.find(&rest).map(|m| m.as_str().to_string());
    if let Some(ref number) = phone {
        rest = rest.replace(number.as_str(), "");
    }

    if let Some(url) = event_page_url {
        rest = rest.replace(url, "");
    }

    let leftover = clean_text(&rest);
    let leftover = leftover
        .trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
        .to_string();
    let name = if leftover.is_empty()
        || !leftover.chars().any(|c| c.is_alphanumeric())
        || is_bare_url(&leftover)
    {
        None
    } else {
        Some(leftover)
    };

    ContactInfo { name, phone, email }
}

fn is_bare_url(text: &str) -> bool {
    let lower = text.to_lowercase();
    !text.contains(' ')
        && (lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("www."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_name_phone_and_email() {
        let info = extract(
            "More Information: Jane Keawe, (808) 956-7214, jkeawe@hawaii.edu",
            Some("jkeawe@hawaii.edu"),
            None,
        );
        assert_eq!(info.name.as_deref(), Some("Jane Keawe"));
        assert_eq!(info.phone.as_deref(), Some("(808) 956-7214"));
        assert_eq!(info.email.as_deref(), Some("jkeawe@hawaii.edu"));
    }

    #[test]
    fn redundant_page_url_is_not_a_name() {
        let info = extract(
            "More Information: https://manoa.hawaii.edu/live/",
            None,
            Some("https://manoa.hawaii.edu/live/"),
        );
        assert_eq!(info.name, None);
        assert_eq!(info.phone, None);
        assert_eq!(info.email, None);
    }

    #[test]
    fn leftover_url_is_not_a_name() {
        let info = extract("More Information: www.hawaii.edu/calendar", None, None);
        assert_eq!(info.name, None);
    }

    #[test]
    fn punctuation_residue_is_dropped() {
        let info = extract("More Information: (808) 956-7214, ...", None, None);
        assert_eq!(info.phone.as_deref(), Some("(808) 956-7214"));
        assert_eq!(info.name, None);
    }
}
