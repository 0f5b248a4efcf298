use avif_press::cdn::{self, CdnCredentials};
use avif_press::cli::{Args, Commands};
use avif_press::convert::{convert_one, run_batch, ConvertOptions};
use avif_press::error::Result;
use avif_press::{info as info_cmd, logger, transcode};
use clap::Parser;
use rayon::ThreadPoolBuilder;

fn main() -> Result<()> {
    let args = Args::parse();
    logger::set_quiet_mode(args.quiet);
    logger::set_verbose_mode(args.verbose);

    match args.command {
        Commands::Convert {
            input,
            quality,
            enhance,
            replace,
            push,
            cdn_url,
            cdn_key,
            cdn_zone,
        } => {
            let cdn = push.then(|| CdnCredentials::resolve(cdn_url, cdn_key, cdn_zone));
            let options = ConvertOptions::new(quality, &enhance, cdn, replace)?;

            avif_press::info!("🗜️  Converting image: {:?}", input);
            let result = convert_one(&input, &options);
            if let Some(e) = result.error {
                return Err(e);
            }

            avif_press::info!("✅ Wrote {:?}", result.target);
            if let Some(meta) = result.metadata {
                avif_press::info!(
                    "📊 Artifact: {}x{}, {} bytes",
                    meta.width,
                    meta.height,
                    meta.size
                );
            }
            if let Some(url) = result.remote_url {
                avif_press::info!("🌐 CDN location: {}", url);
            }
        }
        Commands::Batch {
            input,
            quality,
            enhance,
            replace,
            push,
            cdn_url,
            cdn_key,
            cdn_zone,
            threads,
            recursive,
        } => {
            setup_thread_pool(threads);
            let cdn = push.then(|| CdnCredentials::resolve(cdn_url, cdn_key, cdn_zone));
            let options = ConvertOptions::new(quality, &enhance, cdn, replace)?;
            run_batch(&input, &options, recursive)?;
        }
        Commands::Push {
            input,
            cdn_url,
            cdn_key,
            cdn_zone,
        } => {
            let credentials = CdnCredentials::resolve(cdn_url, cdn_key, cdn_zone);
            avif_press::info!("📤 Pushing to CDN: {:?}", input);
            let location = cdn::push_to_cdn(&input, &credentials)?;
            avif_press::info!("✅ Upload successful!");
            avif_press::info!("🌐 Remote location: {}", location);
        }
        Commands::Purge {
            urls,
            cdn_url,
            cdn_key,
            cdn_zone,
        } => {
            let credentials = CdnCredentials::resolve(cdn_url, cdn_key, cdn_zone);
            avif_press::info!("🧹 Purging {} URL(s) from CDN cache", urls.len());
            cdn::purge_cache(&urls, &credentials)?;
            avif_press::info!("✅ Purge request accepted");
        }
        Commands::Info { input } => {
            info_cmd::print_image_info(&input)?;
            avif_press::verbose!(
                "AVIF target would be {:?}",
                transcode::target_path_for(&input)
            );
        }
    }

    Ok(())
}

fn setup_thread_pool(threads: Option<usize>) {
    if let Some(num_threads) = threads {
        ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .unwrap_or_else(|e| {
                eprintln!("Warning: Failed to set thread pool size: {}", e);
            });
    }
}
