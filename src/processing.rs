use crate::constants::{
    DEFAULT_QUALITY, DEFAULT_TARGET_HEIGHT, DEFAULT_TARGET_WIDTH, MAX_QUALITY, MIN_QUALITY,
    WEBP_MAX_DIMENSION,
};
use crate::error::{Result, SweepError};
use crate::formats::OutputFormat;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, GenericImageView, ImageReader, Rgb, RgbImage};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Output geometry and quality shared by every asset in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSpec {
    pub width: u32,
    pub height: u32,
    pub quality: u8,
}

impl Default for TargetSpec {
    fn default() -> Self {
        Self {
            width: DEFAULT_TARGET_WIDTH,
            height: DEFAULT_TARGET_HEIGHT,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl TargetSpec {
    pub fn new(width: Option<u32>, height: Option<u32>, quality: Option<u8>) -> Result<Self> {
        let width = width.unwrap_or(DEFAULT_TARGET_WIDTH);
        let height = height.unwrap_or(DEFAULT_TARGET_HEIGHT);
        if width == 0 || height == 0 {
            return Err(SweepError::InvalidDimensions(width, height));
        }

        Ok(Self {
            width,
            height,
            quality: validate_quality(quality.unwrap_or(DEFAULT_QUALITY))?,
        })
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

pub fn validate_quality(quality: u8) -> Result<u8> {
    if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
        return Err(SweepError::InvalidQuality(quality));
    }
    Ok(quality)
}

/// Where an encode actually landed once the fallback chain has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedOutput {
    pub path: PathBuf,
    pub format: OutputFormat,
    pub size: u64,
}

/// Loads an image file and returns it along with its size on disk.
///
/// The format is sniffed from the file contents, so a mislabelled
/// `photo.png` holding JPEG data still decodes.
pub fn load_image_with_metadata(input_path: &Path) -> Result<(DynamicImage, u64)> {
    let file_size = fs::metadata(input_path)?.len();
    let img = ImageReader::open(input_path)?
        .with_guessed_format()?
        .decode()?;
    Ok((img, file_size))
}

pub fn decode_bytes(bytes: &[u8]) -> Result<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

/// Collapses any color model to opaque 8-bit RGB.
///
/// Images with an alpha channel are composited onto white; everything else
/// (grayscale, 16-bit, float) is converted directly. Palette images arrive
/// here already expanded by the decoder.
pub fn flatten_to_rgb(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        Rgb([
            blend_onto_white(r, a),
            blend_onto_white(g, a),
            blend_onto_white(b, a),
        ])
    })
}

fn blend_onto_white(channel: u8, alpha: u8) -> u8 {
    let c = channel as u32;
    let a = alpha as u32;
    ((c * a + 255 * (255 - a) + 127) / 255) as u8
}

/// Largest centered window of `img` matching `target_width:target_height`.
///
/// Sources wider than the target lose columns on both sides; all others
/// lose rows top and bottom.
pub fn center_crop_to_aspect(
    img: &DynamicImage,
    target_width: u32,
    target_height: u32,
) -> Result<DynamicImage> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(SweepError::InvalidDimensions(width, height));
    }
    if target_width == 0 || target_height == 0 {
        return Err(SweepError::InvalidDimensions(target_width, target_height));
    }

    let target_aspect = target_width as f64 / target_height as f64;
    let img_aspect = width as f64 / height as f64;

    if img_aspect > target_aspect {
        let new_width = ((height as f64 * target_aspect) as u32).clamp(1, width);
        let left = (width - new_width) / 2;
        Ok(img.crop_imm(left, 0, new_width, height))
    } else {
        let new_height = ((width as f64 / target_aspect) as u32).clamp(1, height);
        let top = (height - new_height) / 2;
        Ok(img.crop_imm(0, top, width, new_height))
    }
}

/// Center-crop to the target aspect ratio, then resize to exactly the target size.
pub fn crop_and_resize(img: &DynamicImage, target: &TargetSpec) -> Result<DynamicImage> {
    let cropped = center_crop_to_aspect(img, target.width, target.height)?;
    Ok(cropped.resize_exact(target.width, target.height, FilterType::Lanczos3))
}

/// Writes `img` to `output` in the given format and returns the byte size written.
///
/// Both formats are lossy at `quality` (1-100).
pub fn encode_image(
    img: &RgbImage,
    output: &Path,
    format: OutputFormat,
    quality: u8,
) -> Result<u64> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|_| SweepError::DirectoryCreationFailed(parent.to_path_buf()))?;
    }

    match format {
        OutputFormat::WebP => {
            let encoded = encode_webp(img, quality)?;
            fs::write(output, &encoded)?;
        }
        OutputFormat::Jpeg => {
            let file = File::create(output)?;
            let mut writer = BufWriter::new(file);
            let (width, height) = img.dimensions();
            JpegEncoder::new_with_quality(&mut writer, quality).encode(
                img.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )?;
            writer.flush()?;
        }
    }

    Ok(fs::metadata(output)?.len())
}

fn encode_webp(img: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let (width, height) = img.dimensions();
    if width > WEBP_MAX_DIMENSION || height > WEBP_MAX_DIMENSION {
        return Err(SweepError::WebPEncode(format!(
            "{}x{} exceeds the {} px limit",
            width, height, WEBP_MAX_DIMENSION
        )));
    }

    let memory = webp::Encoder::from_rgb(img.as_raw(), width, height)
        .encode_simple(false, quality as f32)
        .map_err(|e| SweepError::WebPEncode(format!("{:?}", e)))?;
    Ok(memory.to_vec())
}

/// Encode to WebP at `output`, falling back once to JPEG next to it.
///
/// A half-written primary file is removed before the fallback runs.
pub fn encode_with_fallback(img: &RgbImage, output: &Path, quality: u8) -> Result<EncodedOutput> {
    let primary = OutputFormat::WebP;
    match encode_image(img, output, primary, quality) {
        Ok(size) => Ok(EncodedOutput {
            path: output.to_path_buf(),
            format: primary,
            size,
        }),
        Err(primary_err) => {
            let _ = fs::remove_file(output);
            let Some(fallback) = primary.fallback() else {
                return Err(primary_err);
            };
            crate::warn!("Error saving {}: {}", primary, primary_err);

            let fallback_path = output.with_extension(fallback.extension());
            let size = encode_image(img, &fallback_path, fallback, quality)?;
            crate::info!("✓ Saved as {} fallback: {}", fallback, fallback_path.display());
            Ok(EncodedOutput {
                path: fallback_path,
                format: fallback,
                size,
            })
        }
    }
}

/// Swap a path's extension for the target format's, keeping the stem.
pub fn target_path_for(input_path: &Path, format: OutputFormat) -> PathBuf {
    input_path.with_extension(format.extension())
}
