use crate::constants::{CREDITS_RULE_WIDTH, CREDITS_TITLE};
use crate::error::Result;
use crate::utils::rule;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditsRecord {
    pub filename: String,
    pub source: String,
    pub alt: String,
}

pub fn render_credits(records: &[CreditsRecord]) -> String {
    let mut out = format!("{}\n{}\n\n", CREDITS_TITLE, rule(CREDITS_RULE_WIDTH));

    for record in records {
        out.push_str(&format!(
            "{}\n  Source: {}\n  Alt: {}\n\n",
            record.filename, record.source, record.alt
        ));
    }

    out
}

/// Overwrites `path` with the rendered manifest.
pub fn write_credits(path: &Path, records: &[CreditsRecord]) -> Result<()> {
    fs::write(path, render_credits(records))?;
    Ok(())
}
