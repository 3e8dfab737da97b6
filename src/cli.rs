use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "webp-sweep",
    about = "Fetch, convert and re-reference website images as WebP",
    long_about = "webp-sweep moves a website's raster assets to WebP. It can download stock \
                  photos and crop them to a fixed size, convert an images directory in place, \
                  and rewrite .png/.jpg references in HTML, CSS and JSX sources.",
    version = "0.1.0",
    after_help = "EXAMPLES:\n  \
    webp-sweep fetch -o ./public/images\n  \
    webp-sweep fetch -m assets.toml -w 800 -H 600\n  \
    webp-sweep convert ./public/images -q 80\n  \
    webp-sweep rewrite ."
)]
pub struct Args {
    #[arg(short = 'Q', long, global = true, help = "Only print errors")]
    pub quiet: bool,

    #[arg(short = 'v', long, global = true, help = "Print extra detail")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(
        about = "Download stock photos and save them as cropped WebP",
        long_about = "Download each image in the asset table, flatten transparency onto white, \
                      center-crop to the target aspect ratio, resize, and save as WebP \
                      (JPEG if WebP encoding fails). Writes PHOTO_CREDITS.txt alongside."
    )]
    Fetch {
        #[arg(
            short = 'o',
            long,
            help = "Output directory (default: public/images)"
        )]
        output: Option<PathBuf>,

        #[arg(
            short = 'm',
            long,
            help = "TOML asset manifest",
            long_help = "TOML file of [[asset]] tables with name, url, alt and credit keys. \
                         Replaces the built-in stock photo table."
        )]
        manifest: Option<PathBuf>,

        #[arg(short = 'w', long, help = "Target width in pixels (default: 600)")]
        width: Option<u32>,

        #[arg(short = 'H', long, help = "Target height in pixels (default: 400)")]
        height: Option<u32>,

        #[arg(
            short = 'q',
            long,
            help = "Encoding quality (1-100, default: 85)"
        )]
        quality: Option<u8>,

        #[arg(
            long,
            help = "Pause between downloads in milliseconds (default: 1000)"
        )]
        delay_ms: Option<u64>,

        #[arg(long, help = "Per-request timeout in seconds (default: 30)")]
        timeout_secs: Option<u64>,
    },

    #[command(
        about = "Convert PNG/JPEG files in a directory to WebP",
        long_about = "Convert every .png, .jpg and .jpeg file directly inside DIR to a .webp \
                      next to it. Files that already have a .webp counterpart are skipped, \
                      so reruns are cheap. Originals are never deleted."
    )]
    Convert {
        #[arg(help = "Directory containing the images")]
        dir: PathBuf,

        #[arg(
            short = 'q',
            long,
            help = "Encoding quality (1-100, default: 85)"
        )]
        quality: Option<u8>,
    },

    #[command(
        about = "Rewrite .png/.jpg references in site sources to .webp",
        long_about = "Scan HTML under the project root, CSS under src/styles and JS/JSX under \
                      src for image references followed by a quote, backtick, whitespace or ')', \
                      and rewrite them to .webp. Touched files are copied to backup_<timestamp>/ first."
    )]
    Rewrite {
        #[arg(help = "Project root directory")]
        project_root: PathBuf,
    },
}
