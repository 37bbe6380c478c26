use epubfix_transform::FileType;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// What happens to an archive member.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// Images: streamed into staging byte for byte.
    Copy,
    /// Text members: decoded, run through the pipeline for this type, and
    /// written.
    Transform(FileType),
    /// Anything unrecognised: staged unchanged. Streamed like [`Copy`](Self::Copy)
    /// so that non-text payloads such as fonts survive.
    Passthrough,
    /// Directory entries: nothing to stage.
    Skip,
}
impl Route {
    /// Classify a member by its name's lowercased ending.
    pub fn classify(name: &str, is_dir: bool) -> Self {
        if is_dir {
            return Route::Skip;
        }
        match FileType::from_path(name) {
            FileType::Image => Route::Copy,
            FileType::Other => Route::Passthrough,
            text => Route::Transform(text),
        }
    }
}
impl Display for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Route::Copy => write!(f, "copy"),
            Route::Transform(file_type) => write!(f, "transform ({file_type})"),
            Route::Passthrough => write!(f, "passthrough"),
            Route::Skip => write!(f, "skip"),
        }
    }
}
