use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use webp_sweep::cli::{Args, Commands};
use webp_sweep::constants::{DEFAULT_IMAGES_DIR, DEFAULT_QUALITY};
use webp_sweep::fetch::{fetch_all_sync, AssetManifest, FetchOptions};
use webp_sweep::logger::{set_verbosity, Verbosity};
use webp_sweep::processing::TargetSpec;
use webp_sweep::{batch_convert_directory, rewrite_project_references};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    set_verbosity(Verbosity::from_flags(args.quiet, args.verbose));

    match args.command {
        Commands::Fetch {
            output,
            manifest,
            width,
            height,
            quality,
            delay_ms,
            timeout_secs,
        } => {
            let target = TargetSpec::new(width, height, quality)?;
            let manifest = match manifest {
                Some(path) => AssetManifest::load(&path)
                    .with_context(|| format!("loading asset manifest {}", path.display()))?,
                None => AssetManifest::builtin(),
            };
            let output_dir = output.unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGES_DIR));
            let options = FetchOptions::new(output_dir, target, delay_ms, timeout_secs);
            fetch_all_sync(&manifest, &options)?;
        }
        Commands::Convert { dir, quality } => {
            batch_convert_directory(&dir, quality.unwrap_or(DEFAULT_QUALITY))
                .with_context(|| format!("converting images in {}", dir.display()))?;
        }
        Commands::Rewrite { project_root } => {
            rewrite_project_references(&project_root).with_context(|| {
                format!("rewriting references under {}", project_root.display())
            })?;
        }
    }

    Ok(())
}
