pub mod batch;
pub mod cli;
pub mod constants;
pub mod credits;
pub mod error;
pub mod fetch;
pub mod formats;
pub mod logger;
pub mod processing;
pub mod rewrite;
pub mod utils;

pub use batch::{batch_convert_directory, collect_legacy_files, convert_to_webp, BatchStats};
pub use error::{Result, SweepError};
pub use fetch::{fetch_all_sync, AssetDescriptor, AssetManifest, FetchOptions};
pub use processing::{crop_and_resize, flatten_to_rgb, TargetSpec};
pub use rewrite::{rewrite_project_references, RewriteSummary};
