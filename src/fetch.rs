use crate::constants::{
    CREDITS_FILENAME, DEFAULT_FETCH_DELAY_MS, DEFAULT_FETCH_TIMEOUT_SECS, STOCK_IMAGES, USER_AGENT,
};
use crate::credits::{write_credits, CreditsRecord};
use crate::error::{Result, SweepError};
use crate::formats::OutputFormat;
use crate::processing::{
    crop_and_resize, decode_bytes, encode_with_fallback, flatten_to_rgb, EncodedOutput,
    TargetSpec,
};
use crate::utils::{create_progress_spinner, format_file_size};
use image::DynamicImage;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One remote image to download.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssetDescriptor {
    pub name: String,
    pub url: String,
    pub alt: String,
    pub credit: String,
}

/// The list of images a fetch run works through, in order.
///
/// On disk this is a TOML file of `[[asset]]` tables:
///
/// ```toml
/// [[asset]]
/// name = "service-landscaping"
/// url = "https://images.unsplash.com/photo-1459156212016-c812468e2115?w=800"
/// alt = "Arizona desert landscaping"
/// credit = "Unsplash"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssetManifest {
    #[serde(rename = "asset", default)]
    pub assets: Vec<AssetDescriptor>,
}

impl AssetManifest {
    pub fn builtin() -> Self {
        let assets = STOCK_IMAGES
            .iter()
            .map(|(name, url, alt, credit)| AssetDescriptor {
                name: name.to_string(),
                url: url.to_string(),
                alt: alt.to_string(),
                credit: credit.to_string(),
            })
            .collect();
        Self { assets }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text, path)
    }

    pub fn parse(text: &str, origin: &Path) -> Result<Self> {
        let manifest: AssetManifest = toml::from_str(text)?;
        manifest.validate(origin)?;
        Ok(manifest)
    }

    fn validate(&self, origin: &Path) -> Result<()> {
        let invalid = |reason: String| SweepError::InvalidManifest {
            path: origin.to_path_buf(),
            reason,
        };

        if self.assets.is_empty() {
            return Err(invalid("no [[asset]] entries".to_string()));
        }

        let mut seen = HashSet::new();
        for asset in &self.assets {
            if asset.name.trim().is_empty() {
                return Err(invalid("asset with empty name".to_string()));
            }
            if asset.name.contains(['/', '\\']) || asset.name == "." || asset.name == ".." {
                return Err(invalid(format!("asset name {:?} is not a plain file name", asset.name)));
            }
            if !seen.insert(asset.name.as_str()) {
                return Err(invalid(format!("duplicate asset name {:?}", asset.name)));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub output_dir: PathBuf,
    pub target: TargetSpec,
    pub delay: Duration,
    pub timeout: Duration,
}

impl FetchOptions {
    pub fn new(
        output_dir: PathBuf,
        target: TargetSpec,
        delay_ms: Option<u64>,
        timeout_secs: Option<u64>,
    ) -> Self {
        Self {
            output_dir,
            target,
            delay: Duration::from_millis(delay_ms.unwrap_or(DEFAULT_FETCH_DELAY_MS)),
            timeout: Duration::from_secs(timeout_secs.unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS)),
        }
    }

    pub fn credits_path(&self) -> PathBuf {
        self.output_dir.join(CREDITS_FILENAME)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    Saved(EncodedOutput),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub name: String,
    pub status: FetchStatus,
}

#[derive(Debug, Clone)]
pub struct FetchSummary {
    pub outcomes: Vec<FetchOutcome>,
    pub credits: Vec<CreditsRecord>,
    pub credits_path: PathBuf,
}

impl FetchSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, FetchStatus::Saved(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

pub fn build_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?)
}

/// GETs `url` and returns the body. Non-2xx responses are errors.
pub async fn download_image(client: &Client, url: &str) -> Result<Vec<u8>> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SweepError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response.bytes().await?.to_vec())
}

/// Decode, flatten, crop/resize and encode a downloaded payload into `output_dir`.
pub fn process_fetched_bytes(
    bytes: &[u8],
    descriptor: &AssetDescriptor,
    output_dir: &Path,
    target: &TargetSpec,
) -> Result<EncodedOutput> {
    let img = decode_bytes(bytes)?;
    let rgb = DynamicImage::ImageRgb8(flatten_to_rgb(&img));
    let resized = crop_and_resize(&rgb, target)?.into_rgb8();

    let output_path = output_dir.join(format!(
        "{}.{}",
        descriptor.name,
        OutputFormat::WebP.extension()
    ));
    encode_with_fallback(&resized, &output_path, target.quality)
}

async fn fetch_one(
    client: &Client,
    descriptor: &AssetDescriptor,
    options: &FetchOptions,
) -> Result<EncodedOutput> {
    let bytes = download_image(client, &descriptor.url).await?;
    crate::verbose!("Received {} for {}", format_file_size(bytes.len() as u64), descriptor.name);
    process_fetched_bytes(&bytes, descriptor, &options.output_dir, &options.target)
}

/// Downloads every asset in order, one at a time, then writes the credits manifest.
///
/// Per-asset failures are reported and recorded; only failing to create the
/// output directory, build the HTTP client, or write the manifest is fatal.
pub async fn fetch_all(manifest: &AssetManifest, options: &FetchOptions) -> Result<FetchSummary> {
    fs::create_dir_all(&options.output_dir)
        .map_err(|_| SweepError::DirectoryCreationFailed(options.output_dir.clone()))?;

    crate::info!("🖼️  Downloading {} stock photos...", manifest.len());
    crate::info!("{}", "-".repeat(50));

    let client = build_client(options.timeout)?;
    let mut outcomes = Vec::with_capacity(manifest.len());
    let mut credits = Vec::new();

    for (index, descriptor) in manifest.assets.iter().enumerate() {
        if index > 0 && !options.delay.is_zero() {
            tokio::time::sleep(options.delay).await;
        }

        let pb = create_progress_spinner(&format!("Downloading {}...", descriptor.name));
        let status = match fetch_one(&client, descriptor, options).await {
            Ok(encoded) => {
                pb.finish_and_clear();
                crate::info!(
                    "✓ Saved: {} ({})",
                    encoded.path.display(),
                    format_file_size(encoded.size)
                );
                let filename = encoded
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| descriptor.name.clone());
                credits.push(CreditsRecord {
                    filename,
                    source: descriptor.credit.clone(),
                    alt: descriptor.alt.clone(),
                });
                FetchStatus::Saved(encoded)
            }
            Err(e) => {
                pb.finish_and_clear();
                crate::error!("Error downloading {}: {}", descriptor.name, e);
                FetchStatus::Failed(e.to_string())
            }
        };

        outcomes.push(FetchOutcome {
            name: descriptor.name.clone(),
            status,
        });
    }

    let credits_path = options.credits_path();
    write_credits(&credits_path, &credits)?;

    let summary = FetchSummary {
        outcomes,
        credits,
        credits_path,
    };

    crate::info!("{}", "-".repeat(50));
    crate::info!(
        "✅ Successfully downloaded {}/{} images",
        summary.succeeded(),
        manifest.len()
    );
    if summary.failed() > 0 {
        crate::warn!("{} images failed", summary.failed());
    }
    crate::info!("📝 Photo credits saved to {}", summary.credits_path.display());

    Ok(summary)
}

pub fn fetch_all_sync(manifest: &AssetManifest, options: &FetchOptions) -> Result<FetchSummary> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| SweepError::Runtime(format!("Failed to create runtime: {}", e)))?;

    runtime.block_on(fetch_all(manifest, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};
    use std::io::{Cursor, Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use tempfile::TempDir;

    fn descriptor(name: &str, url: &str) -> AssetDescriptor {
        AssetDescriptor {
            name: name.to_string(),
            url: url.to_string(),
            alt: "alt text".to_string(),
            credit: "Test".to_string(),
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([40, 80, 120, 200]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    /// Serves a single canned HTTP response and hands back the raw request.
    fn serve_once(status_line: &'static str, body: Vec<u8>) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut chunk).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }
            let header = format!(
                "{}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status_line,
                body.len()
            );
            stream.write_all(header.as_bytes()).unwrap();
            stream.write_all(&body).unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{}/photo.png", addr), handle)
    }

    fn options(dir: &Path) -> FetchOptions {
        FetchOptions::new(dir.to_path_buf(), TargetSpec::default(), Some(0), Some(5))
    }

    #[test]
    fn test_builtin_manifest() {
        let manifest = AssetManifest::builtin();
        assert_eq!(manifest.len(), 4);
        assert_eq!(manifest.assets[0].name, "service-sprinkler-repair");
        assert_eq!(manifest.assets[0].credit, "Pexels");
    }

    #[test]
    fn test_parse_manifest() {
        let text = r#"
            [[asset]]
            name = "hero"
            url = "https://example.com/hero.jpg"
            alt = "Hero shot"
            credit = "Example"

            [[asset]]
            name = "team"
            url = "https://example.com/team.jpg"
            alt = "The team"
            credit = "Example"
        "#;
        let manifest = AssetManifest::parse(text, Path::new("assets.toml")).unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.assets[1].alt, "The team");
    }

    #[test]
    fn test_parse_manifest_rejects_empty() {
        let result = AssetManifest::parse("", Path::new("assets.toml"));
        assert!(matches!(result, Err(SweepError::InvalidManifest { .. })));
    }

    #[test]
    fn test_parse_manifest_rejects_path_names() {
        let text = r#"
            [[asset]]
            name = "../escape"
            url = "https://example.com/a.jpg"
            alt = "a"
            credit = "b"
        "#;
        let result = AssetManifest::parse(text, Path::new("assets.toml"));
        assert!(matches!(result, Err(SweepError::InvalidManifest { .. })));
    }

    #[test]
    fn test_parse_manifest_rejects_duplicates() {
        let text = r#"
            [[asset]]
            name = "a"
            url = "https://example.com/1.jpg"
            alt = "a"
            credit = "b"

            [[asset]]
            name = "a"
            url = "https://example.com/2.jpg"
            alt = "a"
            credit = "b"
        "#;
        let result = AssetManifest::parse(text, Path::new("assets.toml"));
        assert!(matches!(result, Err(SweepError::InvalidManifest { .. })));
    }

    #[test]
    fn test_parse_manifest_missing_field() {
        let text = r#"
            [[asset]]
            name = "a"
        "#;
        let result = AssetManifest::parse(text, Path::new("assets.toml"));
        assert!(matches!(result, Err(SweepError::ManifestParse(_))));
    }

    #[test]
    fn test_process_fetched_bytes_produces_target_size() {
        let temp_dir = TempDir::new().unwrap();
        let desc = descriptor("square", "unused");

        let encoded =
            process_fetched_bytes(&png_bytes(300, 300), &desc, temp_dir.path(), &TargetSpec::default())
                .unwrap();
        assert_eq!(encoded.path, temp_dir.path().join("square.webp"));
        assert_eq!(encoded.format, OutputFormat::WebP);

        let written = image::open(&encoded.path).unwrap();
        assert_eq!(written.dimensions(), (600, 400));
    }

    #[test]
    fn test_process_fetched_bytes_rejects_non_image() {
        let temp_dir = TempDir::new().unwrap();
        let desc = descriptor("broken", "unused");
        let result =
            process_fetched_bytes(b"<html>nope</html>", &desc, temp_dir.path(), &TargetSpec::default());
        assert!(matches!(result, Err(SweepError::ImageProcessing(_))));
        assert!(!temp_dir.path().join("broken.webp").exists());
    }

    #[tokio::test]
    async fn test_fetch_all_saves_and_credits() {
        let temp_dir = TempDir::new().unwrap();
        let (url, server) = serve_once("HTTP/1.1 200 OK", png_bytes(120, 40));
        let manifest = AssetManifest {
            assets: vec![descriptor("banner", &url)],
        };

        let summary = fetch_all(&manifest, &options(temp_dir.path())).await.unwrap();
        let request = server.join().unwrap();

        assert!(request.to_lowercase().contains("user-agent: mozilla/5.0"));
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.failed(), 0);
        assert!(temp_dir.path().join("banner.webp").exists());

        let credits = fs::read_to_string(temp_dir.path().join("PHOTO_CREDITS.txt")).unwrap();
        assert!(credits.contains("banner.webp\n  Source: Test\n  Alt: alt text\n"));
    }

    #[tokio::test]
    async fn test_fetch_all_records_http_failure_and_continues() {
        let temp_dir = TempDir::new().unwrap();
        let (missing_url, server) = serve_once("HTTP/1.1 404 Not Found", b"gone".to_vec());
        let (ok_url, ok_server) = serve_once("HTTP/1.1 200 OK", png_bytes(40, 40));
        let manifest = AssetManifest {
            assets: vec![descriptor("missing", &missing_url), descriptor("present", &ok_url)],
        };

        let summary = fetch_all(&manifest, &options(temp_dir.path())).await.unwrap();
        server.join().unwrap();
        ok_server.join().unwrap();

        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.failed(), 1);
        match &summary.outcomes[0].status {
            FetchStatus::Failed(reason) => assert!(reason.contains("404")),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(summary.credits.len(), 1);
        assert_eq!(summary.credits[0].filename, "present.webp");
    }

    #[tokio::test]
    async fn test_fetch_all_undecodable_body() {
        let temp_dir = TempDir::new().unwrap();
        let (url, server) = serve_once("HTTP/1.1 200 OK", b"not an image".to_vec());
        let manifest = AssetManifest {
            assets: vec![descriptor("junk", &url)],
        };

        let summary = fetch_all(&manifest, &options(temp_dir.path())).await.unwrap();
        server.join().unwrap();

        assert_eq!(summary.failed(), 1);
        assert!(summary.credits.is_empty());
        assert!(temp_dir.path().join("PHOTO_CREDITS.txt").exists());
    }

    #[test]
    fn test_fetch_all_sync_connection_refused() {
        let temp_dir = TempDir::new().unwrap();
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let manifest = AssetManifest {
            assets: vec![descriptor("offline", &format!("http://127.0.0.1:{}/x.jpg", port))],
        };

        let summary = fetch_all_sync(&manifest, &options(temp_dir.path())).unwrap();
        assert_eq!(summary.succeeded(), 0);
        assert_eq!(summary.failed(), 1);
    }
}
