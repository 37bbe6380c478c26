//! Configuration for an epubfix run.
//!
//! A [`Config`] is loaded exactly once at startup (see [`Config::load`]) and
//! is immutable afterwards; components receive it by reference. It carries:
//!
//! - **`metadata`**: per-book key/value metadata, keyed by book identifier
//!   (the source file name without its `.epub` extension).
//! - **`regexes`**: per-file-type ordered lists of find/replace [`Rule`]s.
//! - **`staging`** and **`backup_prefix`**: where entries are staged during a
//!   run, and how the original archive is renamed before being replaced.
//!
//! Every rule is compiled during loading so that a bad pattern fails the run
//! before any archive entry is touched.

pub mod error;
mod load;
mod metadata;

pub use crate::load::{DEFAULT_CONFIG_FILE, ENV_PREFIX};
pub use crate::metadata::{Metadata, book_id, read_csv_row};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Default staging root, relative to the working directory.
pub const DEFAULT_STAGING: &str = "out";
/// Default prefix given to the backup of the original archive.
pub const DEFAULT_BACKUP_PREFIX: &str = "old-";

/// A single find/replace rule.
///
/// `find` is regex source; `replace` may reference capture groups using
/// `$1`, `$name` or `${name}`, and `$$` produces a literal dollar sign.
///
/// A reference takes the longest name it can, so `$1a` names a group called
/// `1a` rather than group 1 followed by `a`. Write `${1}a` instead. Both that
/// and `$&` are rejected by [`Config::validate`], since neither does what it
/// would in JavaScript.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Rule {
    pub find: String,
    pub replace: String,
}
impl Rule {
    pub fn new(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self { find: find.into(), replace: replace.into() }
    }

    /// Compile the `find` pattern. Every match is replaced when applied.
    pub fn compile(&self) -> std::result::Result<Regex, regex::Error> {
        Regex::new(&self.find)
    }

    /// The first group reference in `replace` that silently expands to
    /// something unintended: a numbered group running into name characters
    /// (`$1a`), or `$&`.
    pub fn ambiguous_reference(&self) -> Option<&str> {
        let bytes = self.replace.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] != b'$' {
                i += 1;
                continue;
            }
            let start = i;
            i += 1;
            match bytes.get(i) {
                Some(b'$') => i += 1,
                Some(b'&') => return Some(&self.replace[start..=i]),
                Some(b) if b.is_ascii_digit() => {
                    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
                        i += 1;
                    }
                    if bytes.get(i).is_some_and(|b| b.is_ascii_alphabetic() || *b == b'_') {
                        while bytes.get(i).is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_') {
                            i += 1;
                        }
                        return Some(&self.replace[start..i]);
                    }
                },
                _ => {},
            }
        }
        None
    }
}

/// Parsed settings for a run.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Book identifier → arbitrary key/value metadata.
    pub metadata: BTreeMap<String, Metadata>,
    /// File type (`css`, `opf`, `html`) → ordered find/replace rules.
    pub regexes: BTreeMap<String, Vec<Rule>>,
    /// Staging root; relative paths resolve against the working directory.
    pub staging: PathBuf,
    /// Prefix prepended to the original archive's file name for its backup.
    pub backup_prefix: String,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            metadata: BTreeMap::new(),
            regexes: BTreeMap::new(),
            staging: PathBuf::from(DEFAULT_STAGING),
            backup_prefix: DEFAULT_BACKUP_PREFIX.to_string(),
        }
    }
}
impl Config {
    /// Rules configured for a file type key, in application order. Absent
    /// keys yield an empty slice.
    pub fn rules(&self, file_type: &str) -> &[Rule] {
        self.regexes.get(file_type).map(Vec::as_slice).unwrap_or_default()
    }

    /// Compile every configured rule, failing on the first pattern that
    /// doesn't compile with [`ErrorKind::InvalidRule`], or the first
    /// replacement with an ambiguous group reference with
    /// [`ErrorKind::AmbiguousReplacement`].
    pub fn validate(&self) -> Result<()> {
        for (file_type, rules) in &self.regexes {
            for (index, rule) in rules.iter().enumerate() {
                rule.compile().or_raise(|| ErrorKind::InvalidRule {
                    file_type: file_type.clone(),
                    index,
                    find: rule.find.clone(),
                })?;
                if let Some(reference) = rule.ambiguous_reference() {
                    exn::bail!(ErrorKind::AmbiguousReplacement {
                        file_type: file_type.clone(),
                        index,
                        reference: reference.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Metadata for a single book: the CSV row (if any) overlaid with the
    /// values configured under `metadata.<book>`. Configured values win when
    /// both define the same key.
    pub fn book_metadata(&self, book: &str, csv_row: Option<Metadata>) -> Metadata {
        let mut merged = csv_row.unwrap_or_default();
        if let Some(configured) = self.metadata.get(book) {
            merged.extend(configured.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn config_with_rules(file_type: &str, rules: Vec<Rule>) -> Config {
        let mut config = Config::default();
        config.regexes.insert(file_type.to_string(), rules);
        config
    }

    #[test]
    fn config_default() {
        let config = Config::default();
        assert!(config.metadata.is_empty());
        assert!(config.regexes.is_empty());
        assert_eq!(config.staging, PathBuf::from("out"));
        assert_eq!(config.backup_prefix, "old-");
    }

    #[test]
    fn rules_for_missing_key_are_empty() {
        let config = config_with_rules("html", vec![Rule::new("<em>", "<i>")]);
        assert_eq!(config.rules("html").len(), 1);
        assert!(config.rules("css").is_empty());
    }

    #[rstest]
    #[case("<em>")]
    #[case(r"\s+$")]
    #[case(r"(?P<word>\w+)-(\d+)")]
    fn validate_accepts_valid_patterns(#[case] find: &str) {
        let config = config_with_rules("html", vec![Rule::new(find, "")]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_identifies_offending_rule() {
        let rules = vec![Rule::new("a", "b"), Rule::new("b", "c"), Rule::new("(unclosed", "")];
        let config = config_with_rules("css", rules);
        let err = config.validate().unwrap_err();
        assert_eq!(
            *err,
            ErrorKind::InvalidRule { file_type: "css".to_string(), index: 2, find: "(unclosed".to_string() }
        );
    }

    #[rstest]
    #[case("<i>$1</i>", None)]
    #[case("${1}a", None)]
    #[case("$word-$2", None)]
    #[case("$$1a", None)]
    #[case("$1 a", None)]
    #[case("$1a", Some("$1a"))]
    #[case("<b>$12_x</b>", Some("$12_x"))]
    #[case("[$&]", Some("$&"))]
    fn test_ambiguous_reference(#[case] replace: &str, #[case] expected: Option<&str>) {
        assert_eq!(Rule::new("x", replace).ambiguous_reference(), expected);
    }

    #[test]
    fn validate_rejects_ambiguous_reference() {
        let config = config_with_rules("html", vec![Rule::new("(a)", "${1}b"), Rule::new("(a)", "$1b")]);
        let err = config.validate().unwrap_err();
        assert_eq!(
            *err,
            ErrorKind::AmbiguousReplacement { file_type: "html".to_string(), index: 1, reference: "$1b".to_string() }
        );
    }

    #[test]
    fn book_metadata_prefers_configured_values() {
        let mut config = Config::default();
        config.metadata.insert(
            "my-book".to_string(),
            Metadata::from([("title".to_string(), "From Config".to_string())]),
        );
        let csv = Metadata::from([
            ("title".to_string(), "From CSV".to_string()),
            ("creator".to_string(), "Jane Doe".to_string()),
        ]);
        let merged = config.book_metadata("my-book", Some(csv));
        assert_eq!(merged.get("title").map(String::as_str), Some("From Config"));
        assert_eq!(merged.get("creator").map(String::as_str), Some("Jane Doe"));
    }

    #[test]
    fn book_metadata_for_unknown_book() {
        let config = Config::default();
        assert!(config.book_metadata("unknown", None).is_empty());
    }
}
