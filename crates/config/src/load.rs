use crate::Config;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Toml, Yaml};
use std::path::Path;
use tracing::instrument;

/// Configuration file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
/// Environment variables with this prefix override scalar settings, e.g.
/// `EPUBFIX_STAGING=/tmp/epubfix`.
pub const ENV_PREFIX: &str = "EPUBFIX_";
/// Only scalar settings can be overridden from the environment; rule lists
/// and metadata tables must come from the file.
const ENV_KEYS: [&str; 2] = ["staging", "backup_prefix"];

enum Source {
    Toml,
    Yaml,
    Json,
}
impl Source {
    fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "toml" => Some(Source::Toml),
                "yaml" | "yml" => Some(Source::Yaml),
                "json" => Some(Source::Json),
                _ => None,
            })
    }
}

impl Config {
    /// Load, layer and validate the configuration file at `path`.
    ///
    /// The format is chosen by extension (`.toml`, `.yaml`/`.yml`, `.json`).
    /// Environment overrides (see [`ENV_PREFIX`]) are merged on top, then
    /// every regex rule is compiled.
    ///
    /// # Errors
    /// - [`ErrorKind::NotFound`] if `path` is not an existing file.
    /// - [`ErrorKind::UnsupportedFormat`] for unknown extensions.
    /// - [`ErrorKind::Malformed`] if the contents don't parse.
    /// - [`ErrorKind::InvalidRule`] if a regex rule doesn't compile.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        // Figment happily treats a missing file as an empty one. A missing
        // configuration is fatal, so check for it up front.
        if !path.is_file() {
            exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
        }
        let figment = match Source::from_path(path) {
            Some(Source::Toml) => Figment::from(Toml::file_exact(path)),
            Some(Source::Yaml) => Figment::from(Yaml::file_exact(path)),
            Some(Source::Json) => Figment::from(Json::file_exact(path)),
            None => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
        };
        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).only(&ENV_KEYS))
            .extract()
            .or_raise(|| ErrorKind::Malformed(path.to_path_buf()))?;
        config.validate()?;
        tracing::debug!(
            books = config.metadata.len(),
            rules = config.regexes.values().map(Vec::len).sum::<usize>(),
            "Configuration loaded"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rule;
    use rstest::rstest;
    use std::fs;
    use std::path::PathBuf;

    const TOML: &str = r#"
[metadata.my-book]
title = "My Book"

[[regexes.html]]
find = "<em>"
replace = "<i>"

[[regexes.html]]
find = "</em>"
replace = "</i>"
"#;

    const YAML: &str = r#"
metadata:
  my-book:
    title: My Book
regexes:
  html:
    - find: "<em>"
      replace: "<i>"
    - find: "</em>"
      replace: "</i>"
"#;

    const JSON: &str = r#"{
  "metadata": { "my-book": { "title": "My Book" } },
  "regexes": {
    "html": [
      { "find": "<em>", "replace": "<i>" },
      { "find": "</em>", "replace": "</i>" }
    ]
  }
}"#;

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[rstest]
    #[case("config.toml", TOML)]
    #[case("config.yaml", YAML)]
    #[case("config.yml", YAML)]
    #[case("config.json", JSON)]
    fn load_every_format(#[case] name: &str, #[case] contents: &str) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(write(&dir, name, contents)).unwrap();
        assert_eq!(config.rules("html"), &[Rule::new("<em>", "<i>"), Rule::new("</em>", "</i>")]);
        assert_eq!(config.metadata["my-book"]["title"], "My Book");
        assert!(config.rules("css").is_empty());
    }

    #[test]
    fn load_empty_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(write(&dir, "config.toml", "")).unwrap();
        assert_eq!(config.staging, PathBuf::from("out"));
        assert_eq!(config.backup_prefix, "old-");
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("config.toml")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[test]
    fn load_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(write(&dir, "config.cson", "regexes: {}")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnsupportedFormat(_)));
    }

    #[rstest]
    #[case("config.toml", "regexes = [")]
    #[case("config.toml", "regexes = \"not a table\"")]
    #[case("config.json", "{ \"regexes\": { \"html\": [ { \"find\": 1 } ] } }")]
    fn load_malformed(#[case] name: &str, #[case] contents: &str) {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(write(&dir, name, contents)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Malformed(_)));
    }

    #[test]
    fn load_rejects_invalid_regex() {
        let dir = tempfile::tempdir().unwrap();
        let contents = "[[regexes.css]]\nfind = \"[a-\"\nreplace = \"\"\n";
        let err = Config::load(write(&dir, "config.toml", contents)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidRule { index: 0, .. }));
    }
}
