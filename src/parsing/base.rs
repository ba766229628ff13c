use scraper::{ElementRef, Node, Selector};

pub fn clean_text(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

pub fn inner_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

pub fn first_text(element: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|node| {
            let cleaned = inner_text(node);
            if cleaned.is_empty() {
                None
            } else {
                Some(cleaned)
            }
        })
        .flatten()
}

pub fn first_attr(element: &ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    element
        .select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::to_string)
}

pub fn absolute_url(base: &str, href: Option<String>) -> Option<String> {
    let href = href?;
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href);
    }
    let base_url = reqwest::Url::parse(base).ok()?;
    base_url.join(&href).ok().map(|u| u.to_string())
}

pub fn query_param(url: &str, name: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// One token of a sibling walk: a run of text, or an explicit line break.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiblingToken {
    Text(String),
    Break,
}

/// Walks the siblings after `start`, yielding text and `<br>` tokens until
/// `is_boundary` matches an element. Boundary detection stays separate from
/// token collection so callers can reuse the walk with different stop rules.
pub fn sibling_tokens<'a, F>(
    start: ElementRef<'a>,
    is_boundary: F,
) -> impl Iterator<Item = SiblingToken> + 'a
where
    F: Fn(&ElementRef<'a>) -> bool + 'a,
{
    let mut siblings = start.next_siblings();
    let mut done = false;
    std::iter::from_fn(move || {
        if done {
            return None;
        }
        loop {
            let node = siblings.next()?;
            match node.value() {
                Node::Text(text) => return Some(SiblingToken::Text(text.to_string())),
                Node::Element(_) => {
                    let Some(el) = ElementRef::wrap(node) else {
                        continue;
                    };
                    if is_boundary(&el) {
                        done = true;
                        return None;
                    }
                    if el.value().name() == "br" {
                        return Some(SiblingToken::Break);
                    }
                    return Some(SiblingToken::Text(inner_text(el)));
                }
                _ => continue,
            }
        }
    })
}

/// Joins text tokens into lines, splitting at `Break` tokens and dropping
/// lines that collapse to nothing.
pub fn token_lines<I>(tokens: I) -> Vec<String>
where
    I: IntoIterator<Item = SiblingToken>,
{
    let mut lines = Vec::new();
    let mut current = String::new();
    for token in tokens {
        match token {
            SiblingToken::Text(text) => {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(&text);
            }
            SiblingToken::Break => {
                let line = clean_text(&current);
                if !line.is_empty() {
                    lines.push(line);
                }
                current.clear();
            }
        }
    }
    let line = clean_text(&current);
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// A short slice of `text` around the byte range `[start, end)`, widened by
/// `pad` bytes and snapped to char boundaries.
pub fn context_window(text: &str, start: usize, end: usize, pad: usize) -> String {
    let mut lo = start.saturating_sub(pad);
    while lo > 0 && !text.is_char_boundary(lo) {
        lo -= 1;
    }
    let mut hi = (end + pad).min(text.len());
    while hi < text.len() && !text.is_char_boundary(hi) {
        hi += 1;
    }
    clean_text(&text[lo..hi])
}
