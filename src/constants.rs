pub const DEFAULT_QUALITY: u8 = 85;
pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 100;

pub const DEFAULT_TARGET_WIDTH: u32 = 600;
pub const DEFAULT_TARGET_HEIGHT: u32 = 400;

/// Largest width or height libwebp will encode.
pub const WEBP_MAX_DIMENSION: u32 = 16383;

pub const DEFAULT_FETCH_DELAY_MS: u64 = 1000;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_IMAGES_DIR: &str = "public/images";

pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

pub const CREDITS_FILENAME: &str = "PHOTO_CREDITS.txt";
pub const CREDITS_TITLE: &str = "Photo Credits";
pub const CREDITS_RULE_WIDTH: usize = 40;

pub const SUMMARY_RULE_WIDTH: usize = 45;

/// Extensions the batch converter picks up, compared case-insensitively.
pub const LEGACY_RASTER_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

pub const BACKUP_DIR_PREFIX: &str = "backup_";
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Any relative path containing one of these is never rewritten.
pub const EXCLUDED_PATH_MARKERS: &[&str] =
    &["node_modules", "backup_", ".git", "context", "dist", "build"];

pub const MAX_RESIDUAL_REPORT: usize = 10;

/// A directory (relative to the project root) scanned by the reference rewriter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRoot {
    pub label: &'static str,
    pub subdir: &'static str,
    pub extensions: &'static [&'static str],
}

pub const SCAN_ROOTS: &[ScanRoot] = &[
    ScanRoot {
        label: "HTML",
        subdir: "",
        extensions: &["html", "htm"],
    },
    ScanRoot {
        label: "CSS",
        subdir: "src/styles",
        extensions: &["css"],
    },
    ScanRoot {
        label: "JSX",
        subdir: "src",
        extensions: &["jsx", "js"],
    },
];

/// Built-in stock image table: (name, url, alt, credit).
pub const STOCK_IMAGES: &[(&str, &str, &str, &str)] = &[
    (
        "service-sprinkler-repair",
        "https://images.pexels.com/photos/4207899/pexels-photo-4207899.jpeg?auto=compress&cs=tinysrgb&w=800",
        "Professional sprinkler system repair",
        "Pexels",
    ),
    (
        "service-small-engine",
        "https://images.unsplash.com/photo-1530267981375-f0de937f5f13?w=800&q=80",
        "Small engine and lawn mower repair",
        "Unsplash",
    ),
    (
        "service-junk-hauling",
        "https://images.unsplash.com/photo-1558618666-fcd25c85cd64?w=800&q=80",
        "Professional junk hauling and removal",
        "Unsplash",
    ),
    (
        "service-landscaping",
        "https://images.unsplash.com/photo-1459156212016-c812468e2115?w=800&q=80",
        "Arizona desert landscaping and maintenance",
        "Unsplash",
    ),
];
