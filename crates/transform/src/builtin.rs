//! Built-in transforms seeded into every [`Registry`](crate::Registry).
//!
//! Each of these is the identity on a well-formed document: they only touch
//! byte-order marks, carriage returns, HTML-only entity references and, for
//! OPF packages, metadata that the user explicitly supplied.

use epubfix_config::Metadata;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

regex!(ENTITY_REGEX, r"&([A-Za-z][A-Za-z0-9]*);");
regex!(DC_TITLE_REGEX, r"(<dc:title(?:\s[^>]*[^/>])?\s*>)([^<]*)(</dc:title>)");
regex!(DC_CREATOR_REGEX, r"(<dc:creator(?:\s[^>]*[^/>])?\s*>)([^<]*)(</dc:creator>)");
regex!(DC_LANGUAGE_REGEX, r"(<dc:language(?:\s[^>]*[^/>])?\s*>)([^<]*)(</dc:language>)");
regex!(DC_PUBLISHER_REGEX, r"(<dc:publisher(?:\s[^>]*[^/>])?\s*>)([^<]*)(</dc:publisher>)");
regex!(DC_DESCRIPTION_REGEX, r"(<dc:description(?:\s[^>]*[^/>])?\s*>)([^<]*)(</dc:description>)");
regex!(DC_DATE_REGEX, r"(<dc:date(?:\s[^>]*[^/>])?\s*>)([^<]*)(</dc:date>)");
regex!(DC_SUBJECT_REGEX, r"(<dc:subject(?:\s[^>]*[^/>])?\s*>)([^<]*)(</dc:subject>)");
regex!(DC_RIGHTS_REGEX, r"(<dc:rights(?:\s[^>]*[^/>])?\s*>)([^<]*)(</dc:rights>)");

/// HTML named entities that XHTML parsers don't know about, mapped to their
/// code points. The five XML entities are intentionally missing.
const HTML_ENTITIES: &[(&str, u32)] = &[
    ("nbsp", 160),
    ("iexcl", 161),
    ("copy", 169),
    ("laquo", 171),
    ("shy", 173),
    ("reg", 174),
    ("deg", 176),
    ("middot", 183),
    ("raquo", 187),
    ("iquest", 191),
    ("times", 215),
    ("eacute", 233),
    ("ensp", 8194),
    ("emsp", 8195),
    ("thinsp", 8201),
    ("zwnj", 8204),
    ("zwj", 8205),
    ("ndash", 8211),
    ("mdash", 8212),
    ("lsquo", 8216),
    ("rsquo", 8217),
    ("sbquo", 8218),
    ("ldquo", 8220),
    ("rdquo", 8221),
    ("bdquo", 8222),
    ("dagger", 8224),
    ("bull", 8226),
    ("hellip", 8230),
    ("prime", 8242),
    ("trade", 8482),
];

/// Keep the original allocation when nothing was replaced.
fn into_owned(replaced: Cow<'_, str>) -> Option<String> {
    match replaced {
        Cow::Owned(s) => Some(s),
        Cow::Borrowed(_) => None,
    }
}

/// Remove a leading U+FEFF byte-order mark.
pub fn strip_bom(doc: String) -> String {
    match doc.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => doc,
    }
}

/// Normalize `\r\n` and lone `\r` line endings to `\n`.
pub fn normalize_newlines(doc: String) -> String {
    if !doc.contains('\r') {
        return doc;
    }
    doc.replace("\r\n", "\n").replace('\r', "\n")
}

/// Replace HTML-only named entity references with numeric ones, e.g.
/// `&nbsp;` becomes `&#160;`. Unknown names are left alone.
pub fn numeric_entities(doc: String) -> String {
    let replaced = into_owned(ENTITY_REGEX.replace_all(&doc, |caps: &Captures| {
        let name = &caps[1];
        match HTML_ENTITIES.iter().find(|(entity, _)| *entity == name) {
            Some((_, code)) => format!("&#{code};"),
            None => caps[0].to_string(),
        }
    }));
    replaced.unwrap_or(doc)
}

fn escape_xml(value: &str) -> String {
    value.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn dublin_core_element(key: &str) -> Option<&'static Regex> {
    match key.to_lowercase().as_str() {
        "title" => Some(&*DC_TITLE_REGEX),
        "creator" | "author" => Some(&*DC_CREATOR_REGEX),
        "language" => Some(&*DC_LANGUAGE_REGEX),
        "publisher" => Some(&*DC_PUBLISHER_REGEX),
        "description" => Some(&*DC_DESCRIPTION_REGEX),
        "date" => Some(&*DC_DATE_REGEX),
        "subject" => Some(&*DC_SUBJECT_REGEX),
        "rights" => Some(&*DC_RIGHTS_REGEX),
        _ => None,
    }
}

/// Rewrites Dublin Core elements of an OPF package from book metadata.
///
/// Only keys naming a Dublin Core element are used (`author` is accepted as
/// an alias of `creator`); the first matching element in the package gets its
/// text replaced with the XML-escaped value. Self-closing elements and
/// elements with markup inside are left alone. Elements absent from the
/// package are not added.
pub struct DublinCore {
    values: Vec<(&'static Regex, String)>,
}
impl DublinCore {
    pub fn new(metadata: &Metadata) -> Self {
        let values = metadata
            .iter()
            .filter_map(|(key, value)| dublin_core_element(key).map(|regex| (regex, escape_xml(value))))
            .collect();
        Self { values }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn apply(&self, doc: String) -> String {
        self.values.iter().fold(doc, |doc, (regex, value)| {
            let replaced =
                into_owned(regex.replacen(&doc, 1, |caps: &Captures| format!("{}{}{}", &caps[1], value, &caps[3])));
            replaced.unwrap_or(doc)
        })
    }
}
