use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "avif-press",
    about = "A fast AVIF conversion tool with batch processing, enhancement stages and CDN publishing",
    long_about = "avif-press converts JPEG, PNG and WebP images to AVIF, either one at a time or \
                  across a whole directory tree. It can re-compress existing AVIF files in place, \
                  apply optional enhancement stages after conversion, and push finished artifacts \
                  to a bearer-token zone CDN.",
    version = "0.1.0",
    after_help = "EXAMPLES:\n  \
    avif-press convert photo.jpg -q 75\n  \
    avif-press convert photo.jpg --enhance noise_reduction --enhance color_enhancement\n  \
    avif-press batch ./uploads -r -q 80 --replace\n  \
    avif-press push photo.avif\n  \
    avif-press purge https://cdn.example.com/zone-1/photo.avif\n  \
    avif-press info photo.png\n\nCDN credentials come from --cdn-url/--cdn-key/--cdn-zone or the \
    AVIF_CDN_URL, AVIF_CDN_API_KEY and AVIF_CDN_ZONE_ID environment variables."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Suppress informational output")]
    pub quiet: bool,

    #[arg(long, global = true, help = "Print per-stage detail")]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(
        about = "Convert a single image to AVIF",
        long_about = "Convert one JPEG, PNG or WebP image to an AVIF file next to it. \
                      An AVIF input is re-compressed in place at the requested quality."
    )]
    Convert {
        #[arg(help = "Input image file path")]
        input: PathBuf,

        #[arg(
            short = 'q',
            long,
            help = "Compression quality (1-100, default: 80)",
            long_help = "Compression quality from 1 (smallest) to 100 (best). \
                         Out-of-range values are clamped."
        )]
        quality: Option<u8>,

        #[arg(
            short = 'e',
            long = "enhance",
            help = "Enhancement stage to apply after conversion (repeatable)",
            long_help = "Apply an enhancement stage to the converted artifact. May be given \
                         multiple times; stages run in the order given. \
                         Supported: noise_reduction, super_resolution, color_enhancement."
        )]
        enhance: Vec<String>,

        #[arg(
            long,
            help = "Delete the original file after a successful conversion",
            long_help = "Remove the source file once the AVIF artifact is confirmed written. \
                         A failed delete is logged and the conversion still succeeds."
        )]
        replace: bool,

        #[arg(long, help = "Push the finished artifact to the configured CDN")]
        push: bool,

        #[arg(long, help = "CDN base URL (overrides AVIF_CDN_URL)")]
        cdn_url: Option<String>,

        #[arg(long, help = "CDN API key (overrides AVIF_CDN_API_KEY)")]
        cdn_key: Option<String>,

        #[arg(long, help = "CDN zone ID (overrides AVIF_CDN_ZONE_ID)")]
        cdn_zone: Option<String>,
    },

    #[command(
        about = "Convert all candidate images under a path",
        long_about = "Convert every JPEG, PNG and WebP image under a directory, file pattern or \
                      glob to AVIF. Failures are counted and logged without stopping the run; \
                      the final summary reports processed/successful/failed."
    )]
    Batch {
        #[arg(
            help = "Input directory, file pattern, or glob",
            long_help = "Input can be a directory path, a single file, or a glob expression. \
                         Examples: './uploads', '*.jpg', '/media/**/*.png'"
        )]
        input: String,

        #[arg(short = 'q', long, help = "Compression quality (1-100, default: 80)")]
        quality: Option<u8>,

        #[arg(
            short = 'e',
            long = "enhance",
            help = "Enhancement stage to apply to each artifact (repeatable)"
        )]
        enhance: Vec<String>,

        #[arg(long, help = "Delete each original after its successful conversion")]
        replace: bool,

        #[arg(long, help = "Push each finished artifact to the configured CDN")]
        push: bool,

        #[arg(long, help = "CDN base URL (overrides AVIF_CDN_URL)")]
        cdn_url: Option<String>,

        #[arg(long, help = "CDN API key (overrides AVIF_CDN_API_KEY)")]
        cdn_key: Option<String>,

        #[arg(long, help = "CDN zone ID (overrides AVIF_CDN_ZONE_ID)")]
        cdn_zone: Option<String>,

        #[arg(
            short = 'j',
            long,
            help = "Number of parallel threads (default: derived from batch size and memory)"
        )]
        threads: Option<usize>,

        #[arg(short = 'r', long, help = "Process subdirectories recursively")]
        recursive: bool,
    },

    #[command(
        about = "Push a file to the CDN",
        long_about = "Upload a single file to the configured CDN zone. Unlike the push step of \
                      convert/batch, a failure here is the command's failure."
    )]
    Push {
        #[arg(help = "File to upload")]
        input: PathBuf,

        #[arg(long, help = "CDN base URL (overrides AVIF_CDN_URL)")]
        cdn_url: Option<String>,

        #[arg(long, help = "CDN API key (overrides AVIF_CDN_API_KEY)")]
        cdn_key: Option<String>,

        #[arg(long, help = "CDN zone ID (overrides AVIF_CDN_ZONE_ID)")]
        cdn_zone: Option<String>,
    },

    #[command(
        about = "Purge URLs from the CDN cache",
        long_about = "Issue one batched purge request for the given URLs against the configured \
                      CDN zone."
    )]
    Purge {
        #[arg(required = true, help = "URLs to purge")]
        urls: Vec<String>,

        #[arg(long, help = "CDN base URL (overrides AVIF_CDN_URL)")]
        cdn_url: Option<String>,

        #[arg(long, help = "CDN API key (overrides AVIF_CDN_API_KEY)")]
        cdn_key: Option<String>,

        #[arg(long, help = "CDN zone ID (overrides AVIF_CDN_ZONE_ID)")]
        cdn_zone: Option<String>,
    },

    #[command(
        about = "Display image information",
        long_about = "Show dimensions, format and size for an image file, plus whether it is \
                      eligible for AVIF conversion."
    )]
    Info {
        #[arg(help = "Image file path to inspect")]
        input: PathBuf,
    },
}
