//! Output formats produced by the sweep and the legacy extensions it replaces.

use crate::constants::LEGACY_RASTER_EXTENSIONS;
use std::fmt;
use std::path::Path;

/// Encodings written by the fetcher and the batch converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Primary web target
    WebP,
    /// Lossy fallback used when WebP encoding fails
    Jpeg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::WebP => "webp",
            OutputFormat::Jpeg => "jpg",
        }
    }

    /// The format tried when this one fails to encode, if any.
    pub fn fallback(&self) -> Option<OutputFormat> {
        match self {
            OutputFormat::WebP => Some(OutputFormat::Jpeg),
            OutputFormat::Jpeg => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::WebP => "WebP",
            OutputFormat::Jpeg => "JPEG",
        };
        write!(f, "{}", name)
    }
}

/// True when the path carries one of the legacy raster extensions (any case).
pub fn is_legacy_raster(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext_lower = ext.to_lowercase();
            LEGACY_RASTER_EXTENSIONS.contains(&ext_lower.as_str())
        })
        .unwrap_or(false)
}
