#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn create_temp_directory() -> TempDir {
    TempDir::new().unwrap()
}

pub fn write_png(path: &Path, width: u32, height: u32) {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 200])
    });
    DynamicImage::ImageRgba8(img)
        .save_with_format(path, ImageFormat::Png)
        .unwrap();
}

pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(y % 256) as u8, 90, (x % 256) as u8])
    });
    DynamicImage::ImageRgb8(img)
        .save_with_format(path, ImageFormat::Jpeg)
        .unwrap();
}

/// A raster directory with two real images and one corrupt one.
pub fn create_image_directory(root: &Path) -> PathBuf {
    let images = root.join("images");
    fs::create_dir(&images).unwrap();
    write_png(&images.join("logo.png"), 48, 32);
    write_jpeg(&images.join("hero.JPG"), 64, 40);
    fs::write(images.join("corrupt.jpeg"), b"fake jpeg data").unwrap();
    fs::write(images.join("readme.txt"), b"not an image").unwrap();
    images
}

/// A small site tree with references in every scanned file type.
pub fn create_site_fixture(root: &Path) {
    fs::create_dir_all(root.join("src/styles")).unwrap();
    fs::create_dir_all(root.join("src/components")).unwrap();
    fs::create_dir_all(root.join("node_modules/pkg")).unwrap();

    fs::write(
        root.join("index.html"),
        "<img src=\"/images/hero.jpg\" alt=\"hero\">\n<!-- legacy: hero.pngx -->\n",
    )
    .unwrap();
    fs::write(
        root.join("src/styles/main.css"),
        ".hero { background: url(/images/hero.png); }\n",
    )
    .unwrap();
    fs::write(
        root.join("src/components/Hero.jsx"),
        "export const Hero = () => <img src={`/images/team.jpeg`} />;\n",
    )
    .unwrap();
    fs::write(
        root.join("node_modules/pkg/index.js"),
        "module.exports = 'icon.png';\n",
    )
    .unwrap();
}
