use avif_press::constants::{MAX_QUALITY, MIN_QUALITY};
use avif_press::convert::is_candidate_file;
use avif_press::enhance::{parse_stages, EnhancementStage};
use avif_press::transcode::{clamp_quality, target_path_for, TranscodeOptions};
use proptest::prelude::*;
use std::path::Path;

proptest! {
    #[test]
    fn quality_is_always_clamped_into_range(quality in any::<u8>()) {
        let clamped = clamp_quality(quality);
        prop_assert!((MIN_QUALITY..=MAX_QUALITY).contains(&clamped));

        let options = TranscodeOptions::new(Some(quality));
        prop_assert!((MIN_QUALITY..=MAX_QUALITY).contains(&options.quality));
    }

    #[test]
    fn in_range_quality_is_preserved(quality in 1u8..=100u8) {
        prop_assert_eq!(clamp_quality(quality), quality);
    }

    #[test]
    fn target_path_always_gets_avif_extension(
        stem in "[a-zA-Z0-9_-]{1,16}",
        ext in prop::sample::select(&["jpg", "jpeg", "png", "webp", "avif"])
    ) {
        let filename = format!("{}.{}", stem, ext);
        let target = target_path_for(Path::new(&filename));

        prop_assert_eq!(target.extension().and_then(|e| e.to_str()), Some("avif"));
        prop_assert_eq!(
            target.file_stem().and_then(|s| s.to_str()),
            Some(stem.as_str())
        );
    }

    #[test]
    fn known_stage_names_parse_and_unknown_fail(
        name in prop::sample::select(&[
            "noise_reduction",
            "super_resolution",
            "color_enhancement",
            "sharpen",
            "deblock",
            "upscale",
        ])
    ) {
        let result = parse_stages(&[name.to_string()]);
        let known = EnhancementStage::ALL.iter().any(|s| s.name() == name);
        prop_assert_eq!(result.is_ok(), known);
    }

    #[test]
    fn candidate_extensions_are_recognized(
        extension in prop::sample::select(&[
            "jpg", "jpeg", "png", "webp", "avif", "gif", "bmp", "txt", "pdf",
        ])
    ) {
        let filename = format!("test.{}", extension);
        let is_candidate = is_candidate_file(Path::new(&filename));

        let expected = matches!(extension, "jpg" | "jpeg" | "png" | "webp");
        prop_assert_eq!(is_candidate, expected);
    }
}
