use image::{Rgb, RgbImage};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Writes a small gradient image so encoders have real content to work on.
pub fn create_gradient_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x + y) % 256) as u8,
        ])
    });
    img.save(&path).unwrap();
    path
}

/// Writes garbage bytes under an image extension: a candidate that fails to
/// decode.
pub fn create_corrupt_image(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    File::create(&path)
        .unwrap()
        .write_all(b"this is not image data at all")
        .unwrap();
    path
}

pub fn create_temp_directory() -> TempDir {
    TempDir::new().unwrap()
}
