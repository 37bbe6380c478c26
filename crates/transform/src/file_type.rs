use crate::error::{Error, ErrorKind};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// A text file type that owns a transform registry entry.
///
/// `xhtml` is deliberately absent: it is an alias of [`TextType::Html`] (see
/// [`FileType::text_type`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextType {
    Css,
    Opf,
    Html,
}
impl TextType {
    pub const ALL: [TextType; 3] = [TextType::Css, TextType::Opf, TextType::Html];

    /// The key rules for this type are listed under in the configuration.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TextType::Css => "css",
            TextType::Opf => "opf",
            TextType::Html => "html",
        }
    }
}
impl Display for TextType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}
impl FromStr for TextType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "css" => Ok(TextType::Css),
            "opf" => Ok(TextType::Opf),
            "html" => Ok(TextType::Html),
            _ => exn::bail!(ErrorKind::UnknownFileType(s.to_string())),
        }
    }
}

/// Classification of an archive member by its file ending.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileType {
    Css,
    Opf,
    Html,
    /// Alias of [`Html`](Self::Html); shares its pipeline.
    Xhtml,
    /// `png`, `jpg` and `jpeg`: copied byte for byte.
    Image,
    /// Anything else: passed through unchanged.
    Other,
}
impl FileType {
    /// Classify a member path by the lowercased substring after its final
    /// `.`. A dot that belongs to a directory name doesn't count.
    #[must_use]
    pub fn from_path(path: impl AsRef<str>) -> Self {
        let path = path.as_ref();
        let Some((_, ending)) = path.rsplit_once('.') else {
            return FileType::Other;
        };
        if ending.contains(['/', '\\']) {
            return FileType::Other;
        }
        match ending.to_lowercase().as_str() {
            "css" => FileType::Css,
            "opf" => FileType::Opf,
            "html" => FileType::Html,
            "xhtml" => FileType::Xhtml,
            "png" | "jpg" | "jpeg" => FileType::Image,
            _ => FileType::Other,
        }
    }

    /// The registry entry this type is transformed with, if any.
    #[must_use]
    pub fn text_type(&self) -> Option<TextType> {
        match self {
            FileType::Css => Some(TextType::Css),
            FileType::Opf => Some(TextType::Opf),
            FileType::Html | FileType::Xhtml => Some(TextType::Html),
            FileType::Image | FileType::Other => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Css => "css",
            FileType::Opf => "opf",
            FileType::Html => "html",
            FileType::Xhtml => "xhtml",
            FileType::Image => "image",
            FileType::Other => "other",
        }
    }
}
impl Display for FileType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}
