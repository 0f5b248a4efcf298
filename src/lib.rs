pub mod cdn;
pub mod cli;
pub mod constants;
pub mod convert;
pub mod decode;
pub mod enhance;
pub mod error;
pub mod info;
pub mod logger;
pub mod metadata;
pub mod store;
pub mod transcode;

pub use cdn::{push_to_cdn, purge_cache, CdnCredentials};
pub use convert::{
    collect_candidates, convert_one, is_candidate_file, run_batch, BatchStats, ConversionResult,
    ConvertOptions,
};
pub use enhance::{apply_stages, parse_stages, EnhancementStage};
pub use error::{ConvertError, Result};
pub use metadata::{resolve, ArtifactMetadata};
pub use transcode::{target_path_for, transcode, ConversionTarget, TranscodeOptions};
