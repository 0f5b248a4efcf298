//! Raster to AVIF transcoding.
//!
//! Decodes a validated source, encodes it with rav1e at the resolved
//! quality, and lands the artifact with an atomic replace so the target
//! path never holds a partial file. An AVIF source is re-compressed in
//! place at the new quality.

use crate::constants::{
    AVIF_EXTENSION, DEFAULT_QUALITY, ENCODE_SPEED, MAX_QUALITY, MIN_QUALITY,
};
use crate::error::Result;
use crate::store::{self, TempFileGuard};
use image::codecs::avif::AvifEncoder;
use image::{DynamicImage, GenericImageView};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct TranscodeOptions {
    pub quality: u8,
}

impl TranscodeOptions {
    /// Out-of-range quality is clamped, not rejected.
    pub fn new(quality: Option<u8>) -> Self {
        Self {
            quality: clamp_quality(quality.unwrap_or(DEFAULT_QUALITY)),
        }
    }
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        Self::new(None)
    }
}

pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_QUALITY, MAX_QUALITY)
}

/// The artifact produced by one transcode attempt.
#[derive(Debug, Clone)]
pub struct ConversionTarget {
    pub path: PathBuf,
    pub quality: u8,
    pub width: u32,
    pub height: u32,
}

/// Derives the artifact path: same directory, same stem, `.avif` extension.
pub fn target_path_for(source: &Path) -> PathBuf {
    source.with_extension(AVIF_EXTENSION)
}

/// Converts a source image to an AVIF artifact next to it.
///
/// The source is decoded and validated (existence, size cap, dimension cap)
/// before any encoding work; failures leave nothing behind at the target
/// path.
pub fn transcode(source: &Path, options: &TranscodeOptions) -> Result<ConversionTarget> {
    let (img, _source_size) = store::load_source_image(source)?;
    let target = target_path_for(source);

    encode_to_target(&img, &target, options.quality)?;

    let (width, height) = img.dimensions();
    Ok(ConversionTarget {
        path: target,
        quality: options.quality,
        width,
        height,
    })
}

/// Encodes a buffer as AVIF into a sibling temp file, then atomically
/// replaces the target. On any failure the temp file is removed and the
/// target is left untouched.
pub fn encode_to_target(img: &DynamicImage, target: &Path, quality: u8) -> Result<()> {
    let temp_path = temp_path_for(target);
    let _guard = TempFileGuard(temp_path.clone());

    let file = File::create(&temp_path)?;
    let writer = BufWriter::new(file);
    let encoder = AvifEncoder::new_with_speed_quality(writer, ENCODE_SPEED, quality);
    img.write_with_encoder(encoder)?;

    store::replace_file(&temp_path, target)
}

/// Temp file in the target's directory, so the final rename stays on one
/// filesystem.
fn temp_path_for(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    target.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvertError;
    use tempfile::TempDir;

    #[test]
    fn test_transcode_options_default() {
        let options = TranscodeOptions::default();
        assert_eq!(options.quality, 80);
    }

    #[test]
    fn test_quality_clamped_not_rejected() {
        assert_eq!(TranscodeOptions::new(Some(0)).quality, 1);
        assert_eq!(TranscodeOptions::new(Some(255)).quality, 100);
        assert_eq!(TranscodeOptions::new(Some(60)).quality, 60);
    }

    #[test]
    fn test_target_path_for() {
        assert_eq!(
            target_path_for(Path::new("/uploads/photo.jpg")),
            PathBuf::from("/uploads/photo.avif")
        );
        assert_eq!(
            target_path_for(Path::new("/uploads/photo.avif")),
            PathBuf::from("/uploads/photo.avif")
        );
    }

    #[test]
    fn test_temp_path_in_same_directory() {
        let temp = temp_path_for(Path::new("/uploads/photo.avif"));
        assert_eq!(temp, PathBuf::from("/uploads/photo.avif.tmp"));
    }

    #[test]
    fn test_transcode_missing_source() {
        let result = transcode(Path::new("nonexistent.jpg"), &TranscodeOptions::default());
        assert!(matches!(result, Err(ConvertError::SourceUnreadable(_))));
    }

    #[test]
    fn test_transcode_produces_avif_artifact() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("photo.png");
        image::DynamicImage::new_rgb8(12, 10).save(&source).unwrap();

        let target = transcode(&source, &TranscodeOptions::default()).unwrap();
        assert_eq!(target.path, temp_dir.path().join("photo.avif"));
        assert_eq!((target.width, target.height), (12, 10));

        // AVIF container signature: "ftypavif" at byte offset 4
        let bytes = std::fs::read(&target.path).unwrap();
        assert!(bytes.len() > 12);
        assert_eq!(&bytes[4..12], b"ftypavif");

        // no stray temp file
        assert!(!temp_dir.path().join("photo.avif.tmp").exists());
    }

    #[test]
    fn test_failed_transcode_leaves_no_artifact() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("broken.png");
        std::fs::write(&source, b"not a png").unwrap();

        let result = transcode(&source, &TranscodeOptions::default());
        assert!(result.is_err());
        assert!(!temp_dir.path().join("broken.avif").exists());
        assert!(!temp_dir.path().join("broken.avif.tmp").exists());
    }
}
