//! Conversion orchestration: single-item and batch pipelines.
//!
//! Per item the sequence is transcode, optional enhancement with re-encode,
//! metadata resolution, optional CDN push. A failure anywhere marks that
//! item failed and the batch moves on; one bad file never aborts a run.

use crate::cdn::{self, CdnCredentials};
use crate::constants::{
    SourceFormat, AVIF_MIME, LARGE_IMAGE_THRESHOLD_MIB, MAX_BATCH_FILES, MAX_BATCH_MEMORY_MIB,
    MAX_CONCURRENT_LARGE_IMAGES, MIN_AVAILABLE_MEMORY_MIB,
};
use crate::enhance::{self, EnhancementStage};
use crate::error::{ConvertError, Result};
use crate::metadata::{self, ArtifactMetadata};
use crate::store;
use crate::transcode::{self, TranscodeOptions};
use crate::{error, info, verbose, warn};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use sysinfo::{MemoryRefreshKind, RefreshKind, System};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub quality: u8,
    pub stages: Vec<EnhancementStage>,
    pub cdn: Option<CdnCredentials>,
    pub replace_original: bool,
}

impl ConvertOptions {
    /// Stage names are resolved up front so an unknown name is rejected
    /// before any file is opened. Quality is clamped.
    pub fn new(
        quality: Option<u8>,
        stage_names: &[String],
        cdn: Option<CdnCredentials>,
        replace_original: bool,
    ) -> Result<Self> {
        Ok(Self {
            quality: transcode::clamp_quality(quality.unwrap_or(crate::constants::DEFAULT_QUALITY)),
            stages: enhance::parse_stages(stage_names)?,
            cdn,
            replace_original,
        })
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            quality: crate::constants::DEFAULT_QUALITY,
            stages: Vec::new(),
            cdn: None,
            replace_original: false,
        }
    }
}

/// Outcome of one conversion attempt.
#[derive(Debug)]
pub struct ConversionResult {
    pub source: PathBuf,
    pub target: PathBuf,
    pub metadata: Option<ArtifactMetadata>,
    pub remote_url: Option<String>,
    pub error: Option<ConvertError>,
}

impl ConversionResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Counters for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub processed: usize,
    pub success: usize,
    pub failed: usize,
}

/// Runs the full pipeline for a single source image.
pub fn convert_one(source: &Path, options: &ConvertOptions) -> ConversionResult {
    let target = transcode::target_path_for(source);

    match convert_inner(source, options) {
        Ok((metadata, remote_url)) => {
            cleanup_original(source, &target, options);
            ConversionResult {
                source: source.to_path_buf(),
                target,
                metadata: Some(metadata),
                remote_url,
                error: None,
            }
        }
        Err(e) => ConversionResult {
            source: source.to_path_buf(),
            target,
            metadata: None,
            remote_url: None,
            error: Some(e),
        },
    }
}

fn convert_inner(
    source: &Path,
    options: &ConvertOptions,
) -> Result<(ArtifactMetadata, Option<String>)> {
    let produced = transcode::transcode(source, &TranscodeOptions::new(Some(options.quality)))?;
    verbose!(
        "Transcoded {:?} -> {:?} ({}x{}, quality {})",
        source,
        produced.path,
        produced.width,
        produced.height,
        produced.quality
    );

    // Enhancement is best-effort: a failure to reload the artifact skips the
    // stages with a warning instead of failing the conversion.
    if !options.stages.is_empty() {
        match store::load_source_image(&produced.path) {
            Ok((img, _)) => {
                let enhanced = enhance::apply_stages(&options.stages, img);
                transcode::encode_to_target(&enhanced, &produced.path, options.quality)?;
                verbose!(
                    "Applied {} enhancement stage(s) to {:?}",
                    options.stages.len(),
                    produced.path
                );
            }
            Err(e) => {
                warn!("Skipping enhancement for {:?}: {}", produced.path, e);
            }
        }
    }

    let artifact_size = fs::metadata(&produced.path)?.len();
    let resolved = metadata::resolve(&produced.path, ArtifactMetadata::new(AVIF_MIME, artifact_size));

    // A failed push is recorded, the conversion still counts as successful.
    let remote_url = match &options.cdn {
        Some(credentials) => match cdn::push_to_cdn(&produced.path, credentials) {
            Ok(url) => {
                verbose!("Pushed {:?} to CDN: {}", produced.path, url);
                Some(url)
            }
            Err(e) => {
                warn!("CDN push failed for {:?}: {}", produced.path, e);
                None
            }
        },
        None => None,
    };

    Ok((resolved, remote_url))
}

/// Deletes the replaced original after the artifact is confirmed written.
/// Best effort: a failed delete is logged and the conversion stays
/// successful.
fn cleanup_original(source: &Path, target: &Path, options: &ConvertOptions) {
    if !options.replace_original || source == target {
        return;
    }
    if let Err(e) = fs::remove_file(source) {
        warn!("Could not remove original {:?}: {}", source, e);
    }
}

/// Converts every candidate under the input path and reports aggregate
/// statistics. Individual failures are logged and counted, never fatal.
pub fn run_batch(input: &str, options: &ConvertOptions, recursive: bool) -> Result<BatchStats> {
    info!("🚀 Starting batch AVIF conversion...");
    info!("📁 Input: {}", input);

    let start_time = Instant::now();

    let candidates = collect_candidates(input, recursive)?;
    let total_files = candidates.len();

    if total_files == 0 {
        warn!("No candidate images found in the input path");
        return Ok(BatchStats::default());
    }

    info!("📊 Found {} candidate images", total_files);

    let (estimated_memory_mib, large_image_count) = validate_batch_limits(&candidates)?;
    verbose!(
        "Batch estimate: {:.1} MiB decoded, {} large image(s)",
        estimated_memory_mib,
        large_image_count
    );

    let max_parallelism = derive_parallelism(total_files, estimated_memory_mib, large_image_count);
    info!("⚙️  Using {} parallel threads", max_parallelism);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(max_parallelism)
        .build()
        .expect("Failed to build Rayon thread pool");

    let progress = ProgressBar::new(total_files as u64);
    progress.set_style(ProgressStyle::default_bar());

    let processed = AtomicUsize::new(0);
    let success = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    pool.install(|| {
        candidates.par_iter().for_each(|source| {
            processed.fetch_add(1, Ordering::Relaxed);

            let result = convert_one(source, options);
            match result.error {
                None => {
                    success.fetch_add(1, Ordering::Relaxed);
                }
                Some(e) => {
                    failed.fetch_add(1, Ordering::Relaxed);
                    error!("Failed to convert {:?}: {}", source, e);
                }
            }
            progress.inc(1);
        });
    });

    progress.finish_with_message("✅ Batch conversion complete");

    let stats = BatchStats {
        processed: processed.load(Ordering::Relaxed),
        success: success.load(Ordering::Relaxed),
        failed: failed.load(Ordering::Relaxed),
    };

    let elapsed = start_time.elapsed();
    info!("\n📊 Conversion complete: {} processed, {} successful, {} failed",
        stats.processed, stats.success, stats.failed
    );
    info!("  ⏱️  Total time: {:?}", elapsed);

    Ok(stats)
}

/// Collects batch candidates from a file, a directory (optionally
/// recursive, hidden entries skipped) or a glob pattern.
pub fn collect_candidates(input: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut candidates = Vec::new();

    let input_path = Path::new(input);
    let canonical_input = if input_path.exists() {
        input_path
            .canonicalize()
            .map_err(|_| ConvertError::NoCandidatesFound(input.to_string()))?
    } else {
        input_path.to_path_buf()
    };

    if canonical_input.exists() && canonical_input.is_file() {
        candidates.push(canonical_input);
    } else if canonical_input.exists() && canonical_input.is_dir() {
        let walker = if recursive {
            WalkDir::new(&canonical_input).into_iter()
        } else {
            WalkDir::new(&canonical_input).max_depth(1).into_iter()
        };

        for entry in walker.filter_entry(|e| !e.file_name().to_string_lossy().starts_with('.')) {
            let entry = entry?;
            let path = entry.path();

            if path.is_file() && is_candidate_file(path) {
                if let Ok(canonical_path) = path.canonicalize() {
                    candidates.push(canonical_path);
                }
            }
        }
    } else if let Ok(glob_pattern) = glob(input) {
        for entry in glob_pattern.flatten() {
            if entry.is_file() && is_candidate_file(&entry) {
                if let Ok(canonical_path) = entry.canonicalize() {
                    candidates.push(canonical_path);
                }
            }
        }
    } else {
        return Err(ConvertError::NoCandidatesFound(input.to_string()));
    }

    Ok(candidates)
}

/// A batch candidate is a raster source the transcoder accepts, excluding
/// AVIF files themselves.
pub fn is_candidate_file(path: &Path) -> bool {
    SourceFormat::from_path(path)
        .map(|f| f.is_batch_candidate())
        .unwrap_or(false)
}

/// Estimates decoded memory for a file from its size and format, without
/// loading it.
fn estimate_image_memory_usage(file_path: &Path) -> Result<f64> {
    let metadata = fs::metadata(file_path)?;
    let file_size_mib = metadata.len() as f64 / (1024.0 * 1024.0);

    let multiplier = match SourceFormat::from_path(file_path) {
        Some(SourceFormat::Jpeg) => 4.0,
        Some(SourceFormat::Png) => 3.0,
        Some(SourceFormat::WebP) => 3.5,
        Some(SourceFormat::Avif) => 4.0,
        None => 3.0,
    };

    Ok(file_size_mib * multiplier)
}

/// Checks file-count and memory ceilings before a batch starts.
fn validate_batch_limits(candidates: &[PathBuf]) -> Result<(f64, usize)> {
    if candidates.len() > MAX_BATCH_FILES {
        return Err(ConvertError::BatchFileLimitExceeded(
            candidates.len(),
            MAX_BATCH_FILES,
        ));
    }

    let mut total_memory_mib = 0.0;
    let mut large_image_count = 0;

    for file_path in candidates {
        let memory_estimate = estimate_image_memory_usage(file_path)?;
        total_memory_mib += memory_estimate;

        if memory_estimate > LARGE_IMAGE_THRESHOLD_MIB {
            large_image_count += 1;
        }
    }

    let total_memory_mib_u64 = total_memory_mib.ceil() as u64;
    if total_memory_mib_u64 > MAX_BATCH_MEMORY_MIB {
        return Err(ConvertError::BatchMemoryLimitExceeded(
            total_memory_mib_u64,
            MAX_BATCH_MEMORY_MIB,
        ));
    }

    let available_mem_mib = available_memory_mib();
    let required_with_buffer = total_memory_mib_u64 + MIN_AVAILABLE_MEMORY_MIB;
    if required_with_buffer > available_mem_mib {
        return Err(ConvertError::InsufficientMemory(
            total_memory_mib_u64,
            available_mem_mib,
        ));
    }

    Ok((total_memory_mib, large_image_count))
}

fn available_memory_mib() -> u64 {
    let mut sys =
        System::new_with_specifics(RefreshKind::new().with_memory(MemoryRefreshKind::new()));
    sys.refresh_memory();
    sys.available_memory() / (1024 * 1024)
}

/// Caps worker count by thread availability, large-image pressure, and
/// available memory per file.
fn derive_parallelism(total_files: usize, estimated_memory_mib: f64, large_images: usize) -> usize {
    let baseline = rayon::current_num_threads().min(total_files).max(1);
    let large_cap = if large_images >= MAX_CONCURRENT_LARGE_IMAGES {
        MAX_CONCURRENT_LARGE_IMAGES
    } else {
        baseline
    };

    let avg_per_file_mib = ((estimated_memory_mib / total_files as f64).ceil() as u64).max(1);
    let mem_cap = (available_memory_mib().saturating_sub(MIN_AVAILABLE_MEMORY_MIB)
        / avg_per_file_mib)
        .clamp(1, baseline as u64) as usize;

    large_cap.min(mem_cap)
}
