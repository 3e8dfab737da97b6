//! Rewrites legacy `.png` / `.jpg` / `.jpeg` references in site sources to `.webp`.
//!
//! Detection is a text heuristic, not a parser: an extension only counts when
//! the very next character is a quote, backtick, whitespace or `)`. That keeps
//! `src="hero.png"` and `url(hero.jpg)` while leaving `hero.pngx` alone, and it
//! will still misfire on prose or URLs that happen to look the same. `.png` is
//! matched case-sensitively and `.jpg`/`.jpeg` in any case; the read-only
//! residual scan afterwards is case-insensitive for all three, so e.g. a
//! leftover `.PNG"` shows up for manual review.

use crate::constants::{
    ScanRoot, BACKUP_DIR_PREFIX, BACKUP_TIMESTAMP_FORMAT, EXCLUDED_PATH_MARKERS,
    MAX_RESIDUAL_REPORT, SCAN_ROOTS, SUMMARY_RULE_WIDTH,
};
use crate::error::Result;
use crate::formats::OutputFormat;
use crate::utils::{require_directory, rule};
use regex::Regex;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

fn rewrite_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(\.png|(?i:\.jpe?g))(["'`\s)])"#).expect("rewrite pattern is valid")
    })
}

fn residual_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\.(?:png|jpe?g)["'`\s)]"#).expect("residual pattern is valid")
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReferenceCount {
    pub png: usize,
    pub jpeg: usize,
}

impl ReferenceCount {
    pub fn total(&self) -> usize {
        self.png + self.jpeg
    }
}

pub fn count_legacy_references(text: &str) -> ReferenceCount {
    let mut count = ReferenceCount::default();
    for caps in rewrite_pattern().captures_iter(text) {
        if &caps[1] == ".png" {
            count.png += 1;
        } else {
            count.jpeg += 1;
        }
    }
    count
}

/// Replaces every heuristic match with the WebP extension, keeping the delimiter.
pub fn replace_legacy_references(text: &str) -> String {
    let replacement = format!(".{}${{2}}", OutputFormat::WebP.extension());
    rewrite_pattern()
        .replace_all(text, replacement.as_str())
        .into_owned()
}

pub fn has_residual_reference(line: &str) -> bool {
    residual_pattern().is_match(line)
}

/// What happened to one candidate file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Unreadable(String),
    NoMatch,
    BackupFailed(String),
    Unchanged,
    Updated(ReferenceCount),
    WriteFailed { error: String, restored: bool },
}

/// Creates `backup_<YYYYMMDD_HHMMSS>` under `project_root`.
pub fn create_backup_dir(project_root: &Path) -> Result<PathBuf> {
    let timestamp = chrono::Local::now().format(BACKUP_TIMESTAMP_FORMAT);
    let backup_dir = project_root.join(format!("{}{}", BACKUP_DIR_PREFIX, timestamp));
    fs::create_dir_all(&backup_dir)?;
    Ok(backup_dir)
}

/// True when the path, relative to `project_root`, contains an excluded marker.
pub fn is_excluded(project_root: &Path, path: &Path) -> bool {
    let relative = path.strip_prefix(project_root).unwrap_or(path);
    let relative = relative.to_string_lossy();
    EXCLUDED_PATH_MARKERS
        .iter()
        .any(|marker| relative.contains(marker))
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Every file under `scan_root` with one of its extensions, in walk order.
///
/// A missing sub-root simply yields nothing.
pub fn find_files(project_root: &Path, scan_root: &ScanRoot) -> Vec<PathBuf> {
    let base = if scan_root.subdir.is_empty() {
        project_root.to_path_buf()
    } else {
        project_root.join(scan_root.subdir)
    };
    if !base.is_dir() {
        crate::verbose!("Skipping missing directory {}", base.display());
        return Vec::new();
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(&base)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_excluded(project_root, e.path()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                crate::warn!("Cannot read {}", e);
                continue;
            }
        };
        if entry.file_type().is_file() && has_extension(entry.path(), scan_root.extensions) {
            files.push(entry.into_path());
        }
    }
    files
}

/// Rewrites one file in place using `write` to persist the new content.
///
/// Files without matches are never copied or written. Matched files are
/// copied into `backup_dir` first; if `write` fails the original bytes are
/// copied back.
pub fn update_file_references_with<W>(path: &Path, backup_dir: &Path, write: W) -> FileOutcome
where
    W: FnOnce(&Path, &str) -> io::Result<()>,
{
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => return FileOutcome::Unreadable(e.to_string()),
    };

    let count = count_legacy_references(&content);
    if count.total() == 0 {
        return FileOutcome::NoMatch;
    }

    let backup_path = backup_dir.join(path.file_name().unwrap_or(path.as_os_str()));
    if let Err(e) = fs::copy(path, &backup_path) {
        return FileOutcome::BackupFailed(e.to_string());
    }

    let updated = replace_legacy_references(&content);
    if updated == content {
        return FileOutcome::Unchanged;
    }

    match write(path, &updated) {
        Ok(()) => FileOutcome::Updated(count),
        Err(e) => {
            let restored = fs::copy(&backup_path, path).is_ok();
            FileOutcome::WriteFailed {
                error: e.to_string(),
                restored,
            }
        }
    }
}

pub fn update_file_references(path: &Path, backup_dir: &Path) -> FileOutcome {
    update_file_references_with(path, backup_dir, |p, text| fs::write(p, text))
}

/// A line still containing a legacy reference after the rewrite pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidualReference {
    pub path: PathBuf,
    pub line: usize,
}

impl fmt::Display for ResidualReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line)
    }
}

/// Read-only re-scan of `files`; paths are reported relative to `project_root`.
pub fn find_residual_references(project_root: &Path, files: &[PathBuf]) -> Vec<ResidualReference> {
    let mut remaining = Vec::new();
    for path in files {
        let Ok(content) = fs::read_to_string(path) else {
            continue;
        };
        let relative = path.strip_prefix(project_root).unwrap_or(path);
        for (index, line) in content.split('\n').enumerate() {
            if has_residual_reference(line) {
                remaining.push(ResidualReference {
                    path: relative.to_path_buf(),
                    line: index + 1,
                });
            }
        }
    }
    remaining
}

#[derive(Debug, Clone)]
pub struct RewriteSummary {
    pub backup_dir: PathBuf,
    pub files_scanned: usize,
    pub files_updated: usize,
    pub references_changed: usize,
    pub residual: Vec<ResidualReference>,
}

fn report_outcome(relative: &Path, outcome: &FileOutcome) {
    match outcome {
        FileOutcome::NoMatch => {
            crate::verbose!("No legacy references in {}", relative.display());
        }
        FileOutcome::Unreadable(e) => {
            crate::error!("   Error reading {}: {}", relative.display(), e);
        }
        FileOutcome::BackupFailed(e) => {
            crate::error!("   Error backing up {}: {}", relative.display(), e);
        }
        FileOutcome::Unchanged => {
            crate::info!("📝 Processing: {}", relative.display());
            crate::info!("   ⏭️  No changes needed");
        }
        FileOutcome::Updated(count) => {
            crate::info!("📝 Processing: {}", relative.display());
            crate::info!("   Found: {} PNG, {} JPEG references", count.png, count.jpeg);
            crate::info!("   ✅ Updated {} references", count.total());
        }
        FileOutcome::WriteFailed { error, restored } => {
            crate::info!("📝 Processing: {}", relative.display());
            crate::error!("   Error writing {}: {}", relative.display(), error);
            if *restored {
                crate::warn!("   Restored {} from backup", relative.display());
            } else {
                crate::error!("   Could not restore {} from backup", relative.display());
            }
        }
    }
}

/// Rewrites legacy image references across the fixed scan roots of a project.
///
/// Fails before touching anything if `project_root` does not exist.
pub fn rewrite_project_references(project_root: &Path) -> Result<RewriteSummary> {
    require_directory(project_root)?;

    crate::info!("🔄 Updating image references to WebP format...");
    crate::info!("{}", rule(SUMMARY_RULE_WIDTH));

    let backup_dir = create_backup_dir(project_root)?;
    crate::info!(
        "📁 Creating backup at: {}\n",
        backup_dir.file_name().unwrap_or_default().to_string_lossy()
    );

    let mut all_files = Vec::new();
    let mut files_updated = 0;
    let mut references_changed = 0;

    for scan_root in SCAN_ROOTS {
        crate::info!("\n🔍 Updating {} files...", scan_root.label);
        crate::info!("{}", "-".repeat(30));

        for path in find_files(project_root, scan_root) {
            let outcome = update_file_references(&path, &backup_dir);
            let relative = path.strip_prefix(project_root).unwrap_or(&path);
            report_outcome(relative, &outcome);

            if let FileOutcome::Updated(count) = outcome {
                files_updated += 1;
                references_changed += count.total();
            }
            all_files.push(path);
        }
    }

    crate::info!("\n🔍 Checking for remaining PNG/JPEG references...");
    crate::info!("{}", "-".repeat(SUMMARY_RULE_WIDTH));

    let residual = find_residual_references(project_root, &all_files);
    if residual.is_empty() {
        crate::info!("✅ All image references have been updated!");
    } else {
        crate::warn!(
            "Found {} lines with remaining PNG/JPEG references:",
            residual.len()
        );
        for reference in residual.iter().take(MAX_RESIDUAL_REPORT) {
            crate::info!("   {}", reference);
        }
        if residual.len() > MAX_RESIDUAL_REPORT {
            crate::info!("   ... and {} more", residual.len() - MAX_RESIDUAL_REPORT);
        }
        crate::info!("\nThese might be in comments, external URLs, or need manual review.");
    }

    let summary = RewriteSummary {
        backup_dir,
        files_scanned: all_files.len(),
        files_updated,
        references_changed,
        residual,
    };

    let backup_name = summary
        .backup_dir
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned();
    crate::info!("\n{}", rule(SUMMARY_RULE_WIDTH));
    crate::info!("📊 Update Summary:");
    crate::info!("  📝 Files updated: {}", summary.files_updated);
    crate::info!("  🔄 Total references changed: {}", summary.references_changed);
    crate::info!("  📁 Backup created at: {}", backup_name);
    crate::info!("{}", rule(SUMMARY_RULE_WIDTH));
    crate::info!("\n💡 If everything works, delete the backup: rm -rf {}", backup_name);

    Ok(summary)
}
