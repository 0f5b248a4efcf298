pub const DEFAULT_QUALITY: u8 = 80;
pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 100;

/// Decode is rejected above this in either dimension.
pub const MAX_DIMENSION: u32 = 8192;

/// Maximum source/upload file size in bytes (100MiB)
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// rav1e encoder speed (0 = slowest/smallest, 10 = fastest).
pub const ENCODE_SPEED: u8 = 6;

pub const AVIF_EXTENSION: &str = "avif";
pub const AVIF_MIME: &str = "image/avif";

pub const CDN_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const MAX_BATCH_FILES: usize = 10_000;
pub const MAX_BATCH_MEMORY_MIB: u64 = 8192;
pub const LARGE_IMAGE_THRESHOLD_MIB: f64 = 50.0;
pub const MAX_CONCURRENT_LARGE_IMAGES: usize = 2;
pub const MIN_AVAILABLE_MEMORY_MIB: u64 = 512;

/// Image formats the transcoder accepts as input.
///
/// JPEG, PNG and WebP are conversion sources; AVIF is accepted for in-place
/// re-compression at a new quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Jpeg,
    Png,
    WebP,
    Avif,
}

impl SourceFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(SourceFormat::Jpeg),
            "png" => Some(SourceFormat::Png),
            "webp" => Some(SourceFormat::WebP),
            "avif" => Some(SourceFormat::Avif),
            _ => None,
        }
    }

    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|s| s.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SourceFormat::Jpeg => "jpg",
            SourceFormat::Png => "png",
            SourceFormat::WebP => "webp",
            SourceFormat::Avif => "avif",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            SourceFormat::Jpeg => "image/jpeg",
            SourceFormat::Png => "image/png",
            SourceFormat::WebP => "image/webp",
            SourceFormat::Avif => AVIF_MIME,
        }
    }

    /// Raster sources eligible for batch conversion. AVIF files are the
    /// output format, so a batch run never selects them.
    pub fn is_batch_candidate(&self) -> bool {
        !matches!(self, SourceFormat::Avif)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_source_format_from_extension() {
        assert_eq!(SourceFormat::from_extension("jpg"), Some(SourceFormat::Jpeg));
        assert_eq!(SourceFormat::from_extension("JPEG"), Some(SourceFormat::Jpeg));
        assert_eq!(SourceFormat::from_extension("png"), Some(SourceFormat::Png));
        assert_eq!(SourceFormat::from_extension("webp"), Some(SourceFormat::WebP));
        assert_eq!(SourceFormat::from_extension("avif"), Some(SourceFormat::Avif));
        assert_eq!(SourceFormat::from_extension("gif"), None);
        assert_eq!(SourceFormat::from_extension("txt"), None);
    }

    #[test]
    fn test_source_format_from_path() {
        assert_eq!(
            SourceFormat::from_path(Path::new("photo.WebP")),
            Some(SourceFormat::WebP)
        );
        assert_eq!(SourceFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_batch_candidates_exclude_avif() {
        assert!(SourceFormat::Jpeg.is_batch_candidate());
        assert!(SourceFormat::Png.is_batch_candidate());
        assert!(SourceFormat::WebP.is_batch_candidate());
        assert!(!SourceFormat::Avif.is_batch_candidate());
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(SourceFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(SourceFormat::Avif.mime_type(), "image/avif");
    }
}
