use crate::constants::{SourceFormat, MAX_DIMENSION};
use crate::error::{ConvertError, Result};
use crate::store;
use std::fs;
use std::path::Path;

/// Prints basic information about an image file and whether it is a
/// conversion candidate. Dimensions come from a header probe, so this works
/// for AVIF files without a full decode.
pub fn print_image_info(input_path: &Path) -> Result<()> {
    store::validate_source_readable(input_path)?;

    let format = SourceFormat::from_path(input_path).ok_or_else(|| {
        ConvertError::UnsupportedFormat(
            input_path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("<none>")
                .to_string(),
        )
    })?;

    let (width, height) = store::probe_dimensions(input_path)?;
    let file_size = fs::metadata(input_path)?.len();
    let size_kb = file_size as f64 / 1024.0;

    println!("📋 Image Information:");
    println!("  📁 File: {:?}", input_path);
    println!("  📏 Dimensions: {}x{} pixels", width, height);
    println!("  🎭 Format: {} ({})", format.extension(), format.mime_type());
    if size_kb >= 1024.0 {
        println!("  📦 File size: {:.2} MB", size_kb / 1024.0);
    } else {
        println!("  📦 File size: {:.2} KB", size_kb);
    }

    if format == SourceFormat::Avif {
        println!("\n💡 Already AVIF. Re-running convert re-compresses it in place.");
    } else if width > MAX_DIMENSION || height > MAX_DIMENSION {
        println!(
            "\n⚠️  Exceeds the {}px conversion limit; this file would be rejected.",
            MAX_DIMENSION
        );
    } else {
        println!("\n💡 Eligible for AVIF conversion.");
        if file_size > 5 * 1024 * 1024 {
            println!("  🎯 Large file (>5MB): quality 60-80 recommended");
        } else if file_size > 1024 * 1024 {
            println!("  🎯 Medium file (1-5MB): quality 70-85 recommended");
        } else {
            println!("  🎯 Small file (<1MB): quality 85-95 recommended");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_print_image_info_missing_file() {
        let result = print_image_info(Path::new("nonexistent.jpg"));
        assert!(matches!(result, Err(ConvertError::SourceUnreadable(_))));
    }

    #[test]
    fn test_print_image_info_unsupported_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.pdf");
        std::fs::write(&path, b"%PDF").unwrap();

        let result = print_image_info(&path);
        assert!(matches!(result, Err(ConvertError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_print_image_info_valid_png() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pic.png");
        image::DynamicImage::new_rgb8(6, 4).save(&path).unwrap();

        print_image_info(&path).unwrap();
    }
}
