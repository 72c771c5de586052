//! HTML body flattening for notification emails.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use scraper::{ElementRef, Html};

/// Turkish letter entities seen in bank mail templates.
///
/// Markup entities (`&amp;`, `&lt;`, ...) are left to the HTML parser so a
/// body is never decoded twice.
const TURKISH_ENTITIES: &[(&str, &str)] = &[
    ("&ccedil;", "ç"),
    ("&Ccedil;", "Ç"),
    ("&ouml;", "ö"),
    ("&Ouml;", "Ö"),
    ("&uuml;", "ü"),
    ("&Uuml;", "Ü"),
    ("&gbreve;", "ğ"),
    ("&Gbreve;", "Ğ"),
    ("&scedil;", "ş"),
    ("&Scedil;", "Ş"),
    ("&inodot;", "ı"),
    ("&imath;", "ı"),
    ("&Idot;", "İ"),
    ("&#287;", "ğ"),
    ("&#286;", "Ğ"),
    ("&#305;", "ı"),
    ("&#304;", "İ"),
    ("&#351;", "ş"),
    ("&#350;", "Ş"),
    ("&#231;", "ç"),
    ("&#199;", "Ç"),
    ("&#246;", "ö"),
    ("&#214;", "Ö"),
    ("&#252;", "ü"),
    ("&#220;", "Ü"),
];

static TURKISH_ENTITY: Lazy<Regex> = Lazy::new(|| {
    let alternation = TURKISH_ENTITIES
        .iter()
        .map(|(entity, _)| regex::escape(entity))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&alternation).expect("invalid entity table")
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("invalid ws regex"));

/// Elements whose text never reaches the flattened body.
const SKIPPED: &[&str] = &["head", "style", "script", "title", "noscript", "template"];

/// Elements that separate words when flattened.
const BREAKING: &[&str] = &[
    "address", "article", "blockquote", "br", "dd", "div", "dl", "dt", "footer", "h1", "h2", "h3",
    "h4", "h5", "h6", "header", "hr", "li", "ol", "p", "section", "table", "tbody", "td", "th",
    "thead", "tr", "ul",
];

fn decode_turkish_entities(body: &str) -> String {
    TURKISH_ENTITY
        .replace_all(body, |caps: &Captures| {
            TURKISH_ENTITIES
                .iter()
                .find(|(entity, _)| *entity == &caps[0])
                .map(|(_, letter)| letter.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if SKIPPED.contains(&name) {
        return;
    }
    let breaks = BREAKING.contains(&name);
    if breaks {
        out.push(' ');
    }
    for child in element.children() {
        if let Some(child) = ElementRef::wrap(child) {
            collect_text(child, out);
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
        }
    }
    if breaks {
        out.push(' ');
    }
}

/// Flatten an email body to text: entities decoded once, style and script
/// content dropped, whitespace collapsed.
pub fn decode_html(body: &str) -> String {
    let doc = Html::parse_document(&decode_turkish_entities(body));
    let mut text = String::with_capacity(body.len());
    collect_text(doc.root_element(), &mut text);
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}
