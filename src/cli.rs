use clap::{ArgAction, Parser, ValueHint};
use epubfix_config::DEFAULT_CONFIG_FILE;
use std::path::PathBuf;

/// Rewrite the text members of an EPUB through configurable transform
/// pipelines. The original archive is kept as a backup.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// EPUB to rewrite. Defaults to the first `*.epub` in the working
    /// directory that isn't a backup.
    #[arg(value_hint = ValueHint::FilePath)]
    pub source: Option<PathBuf>,

    /// Configuration file (TOML, YAML or JSON).
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, value_hint = ValueHint::FilePath)]
    pub config: PathBuf,

    /// Keep the staging directory after repackaging.
    #[arg(long)]
    pub keep_staging: bool,

    /// More logging. Repeat for even more.
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long)]
    pub quiet: bool,
}
impl Args {
    /// `-1` when quiet, otherwise the number of `-v` flags.
    pub fn verbosity(&self) -> i8 {
        match self.quiet {
            true => -1,
            false => i8::try_from(self.verbose).unwrap_or(i8::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["epubfix"]).unwrap();
        assert_eq!(args.source, None);
        assert_eq!(args.config, PathBuf::from("config.toml"));
        assert!(!args.keep_staging);
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn all_flags() {
        let args =
            Args::try_parse_from(["epubfix", "book.epub", "--config", "rules.yaml", "--keep-staging", "-vv"]).unwrap();
        assert_eq!(args.source, Some(PathBuf::from("book.epub")));
        assert_eq!(args.config, PathBuf::from("rules.yaml"));
        assert!(args.keep_staging);
        assert_eq!(args.verbosity(), 2);
    }

    #[rstest]
    #[case(&["epubfix", "-q"], -1)]
    #[case(&["epubfix", "-v"], 1)]
    #[case(&["epubfix", "-vvv"], 3)]
    fn test_verbosity(#[case] argv: &[&str], #[case] expected: i8) {
        assert_eq!(Args::try_parse_from(argv).unwrap().verbosity(), expected);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Args::try_parse_from(["epubfix", "-q", "-v"]).is_err());
    }
}
