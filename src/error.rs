use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    ImageProcessing(#[from] image::ImageError),

    #[error("AVIF decode error: {0}")]
    AvifDecode(String),

    #[error("Source file not found or unreadable: {0}")]
    SourceUnreadable(PathBuf),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Image dimensions {0}x{1} exceed the maximum of {2}x{2}")]
    DimensionExceeded(u32, u32, u32),

    #[error("File too large: {0} bytes. Maximum allowed: {1} bytes")]
    FileTooLarge(u64, u64),

    #[error("Failed to write artifact: {0}")]
    WriteFailed(PathBuf),

    #[error("Unsupported enhancement stage: {0}")]
    UnsupportedEnhancement(String),

    #[error("Invalid or missing CDN credentials")]
    InvalidCredentials,

    #[error("Invalid purge URL: {0}")]
    InvalidUrl(String),

    #[error("CDN request failed with status: {0}")]
    RemoteError(u16),

    #[error("CDN transport error: {0}")]
    TransportError(String),

    #[error("No candidate images found in input path: {0}")]
    NoCandidatesFound(String),

    #[error("Walkdir error: {0}")]
    WalkdirError(#[from] walkdir::Error),

    #[error("Batch file count limit exceeded: {0} files, maximum allowed {1}")]
    BatchFileLimitExceeded(usize, usize),

    #[error("Batch memory limit exceeded: estimated {0}MiB, maximum allowed {1}MiB")]
    BatchMemoryLimitExceeded(u64, u64),

    #[error(
        "Insufficient available memory: estimated batch requires {0}MiB, but only {1}MiB available"
    )]
    InsufficientMemory(u64, u64),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
