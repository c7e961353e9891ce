use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

lazy_static! {
    static ref TITLE: Selector = Selector::parse("title").expect("valid selector");
}

/// Elements whose text never reaches the index.
const NON_CONTENT: &[&str] = &[
    "script", "style", "head", "title", "meta", "link", "nav", "header", "footer", "input", "button",
];

/// Additionally dropped from descriptions, which should read like body prose.
const NON_DESCRIPTION: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6", "img"];

pub const DEFAULT_DESCRIPTION_CHARS: usize = 140;
pub const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub index_text: String,
    pub title: Option<String>,
    pub description: String,
}

/// Derive indexable text, title and a short description from an HTML page.
pub fn extract(html: &str, description_chars: usize) -> ExtractedText {
    let doc = Html::parse_document(html);
    let title = doc
        .select(&TITLE)
        .next()
        .map(|t| t.text().collect::<String>());

    let mut index_text = String::new();
    collect_text(doc.root_element(), &|name| NON_CONTENT.contains(&name), &mut index_text);

    let mut desc_text = String::new();
    collect_text(
        doc.root_element(),
        &|name| NON_CONTENT.contains(&name) || NON_DESCRIPTION.contains(&name),
        &mut desc_text,
    );

    ExtractedText {
        index_text,
        title,
        description: truncate_description(&collapse_whitespace(&desc_text), description_chars),
    }
}

fn collect_text(el: ElementRef<'_>, skip: &dyn Fn(&str) -> bool, out: &mut String) {
    for child in el.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            if !skip(child_el.value().name()) {
                collect_text(child_el, skip, out);
            }
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
        }
    }
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep the first `limit` characters, marking the cut with an ellipsis.
pub fn truncate_description(s: &str, limit: usize) -> String {
    match s.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &s[..cut]),
        None => s.to_string(),
    }
}
