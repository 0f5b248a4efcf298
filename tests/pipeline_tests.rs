mod common;

use avif_press::constants::MAX_DIMENSION;
use avif_press::convert::{convert_one, run_batch, ConvertOptions};
use avif_press::error::ConvertError;
use avif_press::store::probe_dimensions;
use avif_press::transcode::{transcode, TranscodeOptions};
use common::{create_corrupt_image, create_gradient_image, create_temp_directory};

fn assert_avif_signature(path: &std::path::Path) {
    let bytes = std::fs::read(path).unwrap();
    assert!(bytes.len() > 12, "artifact is implausibly small");
    assert_eq!(&bytes[4..12], b"ftypavif", "missing AVIF container signature");
}

#[test]
fn transcode_preserves_dimensions_for_all_source_formats() {
    let temp_dir = create_temp_directory();

    for name in ["photo.png", "photo2.jpg", "photo3.webp"] {
        let source = create_gradient_image(temp_dir.path(), name, 24, 18);
        let target = transcode(&source, &TranscodeOptions::default()).unwrap();

        assert_avif_signature(&target.path);
        assert_eq!(probe_dimensions(&target.path).unwrap(), (24, 18));
    }
}

#[test]
fn transcode_rejects_oversized_source_and_leaves_no_output() {
    let temp_dir = create_temp_directory();
    let source = create_gradient_image(temp_dir.path(), "wide.png", MAX_DIMENSION + 8, 4);

    let result = transcode(&source, &TranscodeOptions::default());
    assert!(matches!(
        result,
        Err(ConvertError::DimensionExceeded(_, _, _))
    ));
    assert!(!temp_dir.path().join("wide.avif").exists());
    assert!(!temp_dir.path().join("wide.avif.tmp").exists());
}

#[test]
fn batch_isolates_per_item_failures() {
    let temp_dir = create_temp_directory();

    // 5 candidates, items 2 and 4 corrupt. Every item must be attempted.
    create_gradient_image(temp_dir.path(), "item1.png", 8, 8);
    create_corrupt_image(temp_dir.path(), "item2.png");
    create_gradient_image(temp_dir.path(), "item3.jpg", 8, 8);
    create_corrupt_image(temp_dir.path(), "item4.jpg");
    create_gradient_image(temp_dir.path(), "item5.webp", 8, 8);

    let stats = run_batch(
        &temp_dir.path().to_string_lossy(),
        &ConvertOptions::default(),
        false,
    )
    .unwrap();

    assert_eq!(stats.processed, 5);
    assert_eq!(stats.success, 3);
    assert_eq!(stats.failed, 2);

    // The item after a corrupt one was not skipped.
    assert!(temp_dir.path().join("item3.avif").exists());
    assert!(temp_dir.path().join("item5.avif").exists());
    assert!(!temp_dir.path().join("item2.avif").exists());
}

#[test]
fn replace_deletes_original_only_on_success() {
    let temp_dir = create_temp_directory();
    let good = create_gradient_image(temp_dir.path(), "keepme.png", 8, 8);
    let bad = create_corrupt_image(temp_dir.path(), "badone.png");

    let options = ConvertOptions::new(None, &[], None, true).unwrap();

    let result = convert_one(&good, &options);
    assert!(result.is_success());
    assert!(!good.exists(), "original should be removed after success");
    assert!(result.target.exists());

    let result = convert_one(&bad, &options);
    assert!(!result.is_success());
    assert!(bad.exists(), "failed conversion must not delete the source");
}

#[test]
fn recompress_own_output_round_trips() {
    let temp_dir = create_temp_directory();
    let source = create_gradient_image(temp_dir.path(), "photo.png", 16, 16);

    let options = TranscodeOptions::new(Some(80));
    let first = transcode(&source, &options).unwrap();
    let first_size = std::fs::metadata(&first.path).unwrap().len();

    // Re-compressing the artifact in place at the same quality must succeed
    // and stay within a 3x size tolerance either way (synthetic gradients
    // re-encode with large variance).
    let second = transcode(&first.path, &options).unwrap();
    assert_eq!(second.path, first.path);
    assert_avif_signature(&second.path);
    assert_eq!(probe_dimensions(&second.path).unwrap(), (16, 16));

    let second_size = std::fs::metadata(&second.path).unwrap().len();
    assert!(second_size <= first_size * 3);
    assert!(second_size * 3 >= first_size);
}

#[test]
fn enhancement_super_resolution_doubles_artifact_dimensions() {
    let temp_dir = create_temp_directory();
    let source = create_gradient_image(temp_dir.path(), "small.png", 10, 8);

    let options =
        ConvertOptions::new(None, &["super_resolution".to_string()], None, false).unwrap();
    let result = convert_one(&source, &options);
    assert!(result.is_success(), "conversion failed: {:?}", result.error);

    assert_eq!(probe_dimensions(&result.target).unwrap(), (20, 16));

    let meta = result.metadata.unwrap();
    assert_eq!((meta.width, meta.height), (20, 16));
}

#[test]
fn enhancement_full_chain_produces_valid_artifact() {
    let temp_dir = create_temp_directory();
    let source = create_gradient_image(temp_dir.path(), "chained.png", 12, 12);

    let stages = vec![
        "noise_reduction".to_string(),
        "super_resolution".to_string(),
        "color_enhancement".to_string(),
    ];
    let options = ConvertOptions::new(Some(70), &stages, None, false).unwrap();
    let result = convert_one(&source, &options);
    assert!(result.is_success(), "conversion failed: {:?}", result.error);

    assert_avif_signature(&result.target);
    assert_eq!(probe_dimensions(&result.target).unwrap(), (24, 24));
}

#[test]
fn convert_one_reports_metadata_for_plain_conversion() {
    let temp_dir = create_temp_directory();
    let source = create_gradient_image(temp_dir.path(), "meta.png", 14, 6);

    let result = convert_one(&source, &ConvertOptions::default());
    assert!(result.is_success());

    let meta = result.metadata.unwrap();
    assert_eq!((meta.width, meta.height), (14, 6));
    assert_eq!(meta.mime, "image/avif");
    assert!(meta.size > 0);
}
