use crate::error::{ErrorKind, Result};
use crate::{Registry, TextType};
use epubfix_config::Config;
use exn::ResultExt;
use regex::Regex;
use std::borrow::Cow;
use tracing::instrument;

/// Name of the transform appended to every registry chain by [`inject`].
pub const REGEXES: &str = "regexes";

/// Append a `regexes` transform to every [`TextType`]'s chain, built from the
/// find/replace rules configured under that type's key.
///
/// Rules apply in order, each one replacing every match in the output of the
/// previous rule. A type without rules gets an identity transform so every
/// chain has the same shape. Rules listed under `xhtml` (or any other key that
/// isn't a [`TextType`]) are ignored with a warning: `html` rules already apply
/// to XHTML documents.
///
/// # Errors
/// Returns [`ErrorKind::InvalidRule`] if a pattern doesn't compile. A
/// [`Config`] that went through [`Config::load`] has already been validated.
#[instrument(skip_all)]
pub fn inject(registry: &mut Registry, config: &Config) -> Result<()> {
    for key in config.regexes.keys() {
        if key.parse::<TextType>().is_err() {
            tracing::warn!(key = %key, "Ignoring regexes configured for an unsupported file type");
        }
    }
    for text_type in TextType::ALL {
        let rules = config
            .rules(text_type.as_str())
            .iter()
            .enumerate()
            .map(|(index, rule)| {
                let regex = rule
                    .compile()
                    .or_raise(|| ErrorKind::InvalidRule { file_type: text_type.as_str(), index })?;
                Ok((regex, rule.replace.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        if rules.is_empty() {
            registry.register(text_type, REGEXES, |doc| doc);
        } else {
            registry.register(text_type, REGEXES, move |doc| apply_rules(&rules, doc));
        }
    }
    Ok(())
}

fn apply_rules(rules: &[(Regex, String)], doc: String) -> String {
    rules.iter().fold(doc, |doc, (regex, replace)| {
        tracing::debug!(regex = %regex, replace = %replace, "Applying rule");
        let replaced = match regex.replace_all(&doc, replace.as_str()) {
            Cow::Owned(s) => Some(s),
            Cow::Borrowed(_) => None,
        };
        replaced.unwrap_or(doc)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use epubfix_config::Rule;

    fn config(rules: &[(&str, &[(&str, &str)])]) -> Config {
        let mut config = Config::default();
        for (file_type, pairs) in rules {
            config.regexes.insert(
                file_type.to_string(),
                pairs.iter().map(|(find, replace)| Rule::new(*find, *replace)).collect(),
            );
        }
        config
    }

    fn run(registry: &Registry, text_type: TextType, doc: &str) -> String {
        (registry.get(text_type).get(REGEXES).unwrap())(doc.to_string())
    }

    #[test]
    fn rules_compose_sequentially() {
        let mut registry = Registry::empty();
        inject(&mut registry, &config(&[("html", &[("a", "b"), ("b", "c")])])).unwrap();
        assert_eq!(run(&registry, TextType::Html, "aaa"), "ccc");
    }

    #[test]
    fn every_match_is_replaced() {
        let mut registry = Registry::empty();
        inject(&mut registry, &config(&[("html", &[("<em>", "<i>"), ("</em>", "</i>")])])).unwrap();
        assert_eq!(
            run(&registry, TextType::Html, "<em>one</em> and <em>two</em>"),
            "<i>one</i> and <i>two</i>"
        );
    }

    #[test]
    fn capture_groups_in_replacement() {
        let mut registry = Registry::empty();
        inject(&mut registry, &config(&[("css", &[(r"(\d+)px", "${1}em"), (r"\$", "$$$$")])])).unwrap();
        assert_eq!(run(&registry, TextType::Css, "margin: 12px; $"), "margin: 12em; $$");
    }

    #[test]
    fn missing_or_empty_rules_are_identity() {
        let mut registry = Registry::empty();
        inject(&mut registry, &config(&[("css", &[])])).unwrap();
        for text_type in TextType::ALL {
            assert_eq!(registry.get(text_type).names().collect::<Vec<_>>(), [REGEXES]);
            assert_eq!(run(&registry, text_type, "a < b & c"), "a < b & c");
        }
    }

    #[test]
    fn rules_are_scoped_to_their_file_type() {
        let mut registry = Registry::empty();
        inject(&mut registry, &config(&[("opf", &[("x", "y")])])).unwrap();
        assert_eq!(run(&registry, TextType::Opf, "xx"), "yy");
        assert_eq!(run(&registry, TextType::Html, "xx"), "xx");
        assert_eq!(run(&registry, TextType::Css, "xx"), "xx");
    }

    #[test]
    fn xhtml_rules_are_ignored() {
        let mut registry = Registry::empty();
        inject(&mut registry, &config(&[("xhtml", &[("x", "y")])])).unwrap();
        assert_eq!(run(&registry, TextType::Html, "xx"), "xx");
    }

    #[test]
    fn injected_last() {
        let mut registry = Registry::empty();
        registry.register(TextType::Html, "upper", |doc| doc.to_uppercase());
        inject(&mut registry, &config(&[("html", &[("A", "z")])])).unwrap();
        assert_eq!(registry.get(TextType::Html).names().collect::<Vec<_>>(), ["upper", REGEXES]);
    }

    #[test]
    fn invalid_rule_is_fatal() {
        let mut registry = Registry::empty();
        let err = inject(&mut registry, &config(&[("opf", &[("ok", ""), ("(", "")])])).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidRule { file_type: "opf", index: 1 });
    }
}
