use crate::constants::{LEGACY_RASTER_EXTENSIONS, SUMMARY_RULE_WIDTH};
use crate::error::Result;
use crate::formats::{is_legacy_raster, OutputFormat};
use crate::processing::{
    encode_image, flatten_to_rgb, load_image_with_metadata, target_path_for, validate_quality,
};
use crate::utils::{
    calculate_savings_ratio, create_progress_bar, format_file_size, require_directory, rule,
};
use glob::{glob_with, MatchOptions, Pattern};
use indicatif::ProgressStyle;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStatus {
    Converted,
    Skipped,
    Failed,
}

/// Outcome of converting a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub source: PathBuf,
    pub status: ConversionStatus,
    pub original_size: u64,
    pub output_size: u64,
    pub error: Option<String>,
}

impl ConversionResult {
    fn skipped(source: &Path) -> Self {
        Self {
            source: source.to_path_buf(),
            status: ConversionStatus::Skipped,
            original_size: 0,
            output_size: 0,
            error: None,
        }
    }

    fn failed(source: &Path, error: String) -> Self {
        Self {
            source: source.to_path_buf(),
            status: ConversionStatus::Failed,
            original_size: 0,
            output_size: 0,
            error: Some(error),
        }
    }

    /// Bytes saved by this conversion; negative if the output grew.
    pub fn bytes_saved(&self) -> i64 {
        match self.status {
            ConversionStatus::Converted => self.original_size as i64 - self.output_size as i64,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total_saved: i64,
}

impl BatchStats {
    pub fn record(&mut self, result: &ConversionResult) {
        match result.status {
            ConversionStatus::Converted => {
                self.converted += 1;
                self.total_saved += result.bytes_saved();
            }
            ConversionStatus::Skipped => self.skipped += 1,
            ConversionStatus::Failed => self.failed += 1,
        }
    }

    /// Total savings, or `None` when conversions made no net gain.
    pub fn reported_savings(&self) -> Option<u64> {
        (self.total_saved > 0).then_some(self.total_saved as u64)
    }
}

#[derive(Debug, Clone)]
pub struct BatchReport {
    pub results: Vec<ConversionResult>,
    pub stats: BatchStats,
    pub target_files: Vec<PathBuf>,
}

fn case_insensitive() -> MatchOptions {
    MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    }
}

fn glob_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/*.{}",
        Pattern::escape(&dir.to_string_lossy()),
        extension
    );
    Ok(glob_with(&pattern, case_insensitive())?
        .flatten()
        .filter(|p| p.is_file())
        .collect())
}

/// Files directly inside `dir` with a legacy raster extension, sorted.
pub fn collect_legacy_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();
    for ext in LEGACY_RASTER_EXTENSIONS {
        files.extend(glob_files(dir, ext)?.into_iter().filter(|p| is_legacy_raster(p)));
    }
    Ok(files.into_iter().collect())
}

/// Files directly inside `dir` already in the target format, sorted.
pub fn list_target_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = glob_files(dir, OutputFormat::WebP.extension())?;
    files.sort();
    Ok(files)
}

/// Converts one file to WebP next to the original.
///
/// Never returns an error: failures are captured in the result so a bad
/// file cannot stop the batch.
pub fn convert_to_webp(input_path: &Path, quality: u8) -> ConversionResult {
    let output_path = target_path_for(input_path, OutputFormat::WebP);
    if output_path.exists() {
        return ConversionResult::skipped(input_path);
    }

    let converted = load_image_with_metadata(input_path).and_then(|(img, original_size)| {
        let rgb = flatten_to_rgb(&img);
        let output_size = encode_image(&rgb, &output_path, OutputFormat::WebP, quality)?;
        Ok((original_size, output_size))
    });

    match converted {
        Ok((original_size, output_size)) => ConversionResult {
            source: input_path.to_path_buf(),
            status: ConversionStatus::Converted,
            original_size,
            output_size,
            error: None,
        },
        Err(e) => {
            // A truncated output would make the next run skip this file.
            let _ = fs::remove_file(&output_path);
            ConversionResult::failed(input_path, e.to_string())
        }
    }
}

fn report_result(result: &ConversionResult) {
    match result.status {
        ConversionStatus::Converted => {
            crate::info!("   ✅ Converted successfully");
            crate::info!(
                "   📊 Size: {} → {} ({:.1}% savings)",
                format_file_size(result.original_size),
                format_file_size(result.output_size),
                calculate_savings_ratio(result.original_size, result.output_size)
            );
        }
        ConversionStatus::Skipped => {
            crate::info!("   ⏭️  Skipped (WebP already exists)");
        }
        ConversionStatus::Failed => {
            crate::error!(
                "   Error: {}",
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}

/// Converts every legacy raster in `dir` to WebP, one file at a time.
///
/// Fails only when `dir` is missing or cannot be listed.
pub fn batch_convert_directory(dir: &Path, quality: u8) -> Result<BatchReport> {
    let quality = validate_quality(quality)?;
    require_directory(dir)?;

    crate::info!("🎨 Starting image conversion to WebP format...");
    crate::info!("{}", rule(SUMMARY_RULE_WIDTH));

    let image_files = collect_legacy_files(dir)?;
    if image_files.is_empty() {
        crate::info!("No PNG or JPEG files found in {}", dir.display());
        return Ok(BatchReport {
            results: Vec::new(),
            stats: BatchStats::default(),
            target_files: list_target_files(dir)?,
        });
    }

    crate::info!("Found {} image files to process\n", image_files.len());

    let pb = create_progress_bar(image_files.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar().template("{bar:40.cyan/blue} {pos}/{len} {msg}")
    {
        pb.set_style(style);
    }

    let mut stats = BatchStats::default();
    let mut results = Vec::with_capacity(image_files.len());

    for input_path in &image_files {
        let name = input_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        pb.set_message(name.clone());

        let result = convert_to_webp(input_path, quality);
        pb.suspend(|| {
            crate::info!("🔄 Processing: {}", name);
            report_result(&result);
            crate::info!("");
        });

        stats.record(&result);
        results.push(result);
        pb.inc(1);
    }
    pb.finish_and_clear();

    crate::info!("{}", rule(SUMMARY_RULE_WIDTH));
    crate::info!("📊 Conversion Summary:");
    crate::info!("  ✅ Converted: {} files", stats.converted);
    crate::info!("  ⏭️  Skipped: {} files", stats.skipped);
    crate::info!("  ❌ Errors: {} files", stats.failed);
    if let Some(saved) = stats.reported_savings() {
        crate::info!("  💾 Total space saved: {}", format_file_size(saved));
    }
    crate::info!("{}", rule(SUMMARY_RULE_WIDTH));

    let target_files = list_target_files(dir)?;
    if !target_files.is_empty() {
        crate::info!("\n📁 WebP files in directory:");
        for path in &target_files {
            let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
            crate::info!(
                "  {} ({})",
                path.file_name().unwrap_or_default().to_string_lossy(),
                format_file_size(size)
            );
        }
    }

    crate::info!("\n✨ Conversion complete!");

    Ok(BatchReport {
        results,
        stats,
        target_files,
    })
}
