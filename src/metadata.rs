//! Dimension repair for produced artifacts.
//!
//! Upstream metadata sometimes arrives with missing or zero dimensions for
//! AVIF files. The resolver fills both dimensions from a container probe,
//! or leaves the record exactly as it was.

use crate::store;
use crate::warn;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArtifactMetadata {
    pub width: u32,
    pub height: u32,
    pub mime: String,
    pub size: u64,
}

impl ArtifactMetadata {
    pub fn new(mime: impl Into<String>, size: u64) -> Self {
        Self {
            width: 0,
            height: 0,
            mime: mime.into(),
            size,
        }
    }

    pub fn has_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Returns metadata with both dimensions populated from the artifact when
/// they are missing.
///
/// Already-populated metadata is returned unchanged without touching the
/// file. Dimensions are filled as a pair or not at all; a failed probe is a
/// warning and the input passes through untouched.
pub fn resolve(artifact_path: &Path, existing: ArtifactMetadata) -> ArtifactMetadata {
    if existing.has_dimensions() {
        return existing;
    }

    match store::probe_dimensions(artifact_path) {
        Ok((width, height)) if width > 0 && height > 0 => ArtifactMetadata {
            width,
            height,
            ..existing
        },
        Ok((width, height)) => {
            warn!(
                "Probe of {:?} returned degenerate dimensions {}x{}; keeping metadata as-is",
                artifact_path, width, height
            );
            existing
        }
        Err(e) => {
            warn!(
                "Could not probe dimensions of {:?}: {}; keeping metadata as-is",
                artifact_path, e
            );
            existing
        }
    }
}
