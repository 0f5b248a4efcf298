//! Filesystem access for source images and produced artifacts.
//!
//! Everything the pipeline reads or writes on disk goes through here:
//! validated decodes with size and dimension caps, header-only geometry
//! probes, and atomic artifact replacement.

use crate::constants::{SourceFormat, MAX_DIMENSION, MAX_FILE_SIZE};
use crate::decode::decode_avif;
use crate::error::{ConvertError, Result};
use image::{DynamicImage, GenericImageView, ImageReader};
use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Validates that a path references an existing regular file.
pub fn validate_source_readable(path: &Path) -> Result<()> {
    if !path.exists() || !path.is_file() {
        return Err(ConvertError::SourceUnreadable(path.to_path_buf()));
    }
    Ok(())
}

/// Loads and decodes a source image, returning it with its on-disk size.
///
/// Enforces the file size cap before decoding and the dimension cap after,
/// so an oversized source is rejected before any transform runs. AVIF
/// sources take the rav1d decode path; the `image` crate's `avif` feature
/// only provides the encoder.
pub fn load_source_image(path: &Path) -> Result<(DynamicImage, u64)> {
    validate_source_readable(path)?;

    let canonical_path = path
        .canonicalize()
        .map_err(|_| ConvertError::SourceUnreadable(path.to_path_buf()))?;

    let file_size = fs::metadata(&canonical_path)?.len();
    if file_size > MAX_FILE_SIZE {
        return Err(ConvertError::FileTooLarge(file_size, MAX_FILE_SIZE));
    }

    let format = SourceFormat::from_path(&canonical_path).ok_or_else(|| {
        ConvertError::UnsupportedFormat(
            canonical_path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("<none>")
                .to_string(),
        )
    })?;

    let img = match format {
        SourceFormat::Avif => decode_avif(&canonical_path)?,
        _ => ImageReader::open(&canonical_path)?.decode()?,
    };

    let (width, height) = img.dimensions();
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(ConvertError::DimensionExceeded(width, height, MAX_DIMENSION));
    }

    Ok((img, file_size))
}

/// Reads image geometry from file headers without a full decode.
///
/// AVIF geometry comes from the container metadata, everything else from the
/// `image` crate's header reader.
pub fn probe_dimensions(path: &Path) -> Result<(u32, u32)> {
    validate_source_readable(path)?;

    if SourceFormat::from_path(path) == Some(SourceFormat::Avif) {
        let data = fs::read(path)?;
        let avif = avif_parse::read_avif(&mut std::io::Cursor::new(&data))
            .map_err(|e| ConvertError::AvifDecode(format!("container parse failed: {e:?}")))?;
        let meta = avif
            .primary_item_metadata()
            .map_err(|e| ConvertError::AvifDecode(format!("container metadata failed: {e:?}")))?;
        return Ok((meta.max_frame_width.get(), meta.max_frame_height.get()));
    }

    let (width, height) = image::image_dimensions(path)?;
    Ok((width, height))
}

/// Moves a finished temp file into its final path.
///
/// Rename first; if that fails (cross-device), fall back to copy + delete.
/// A failed fallback is a write error and the temp file is left to the
/// caller's cleanup guard.
pub fn replace_file(temp_path: &Path, final_path: &Path) -> Result<()> {
    if fs::rename(temp_path, final_path).is_ok() {
        return Ok(());
    }
    fs::copy(temp_path, final_path)
        .map_err(|_| ConvertError::WriteFailed(final_path.to_path_buf()))?;
    let _ = fs::remove_file(temp_path);
    Ok(())
}

/// Reads a file fully into memory, subject to the size cap.
pub fn read_file_bytes(path: &Path) -> Result<Vec<u8>> {
    validate_source_readable(path)?;

    let file_size = fs::metadata(path)?.len();
    if file_size > MAX_FILE_SIZE {
        return Err(ConvertError::FileTooLarge(file_size, MAX_FILE_SIZE));
    }

    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut data = Vec::with_capacity(file_size as usize);
    reader.read_to_end(&mut data)?;
    Ok(data)
}

/// Removes a temp file when dropped. Disarmed by successful replacement,
/// where the temp path no longer exists and removal is a no-op.
pub struct TempFileGuard(pub PathBuf);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.0);
    }
}
