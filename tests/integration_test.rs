// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Integration tests for the hard-case mining library

use std::fs;
use std::path::PathBuf;

use ndarray::{Array3, Array5};

use hardcase_miner::keypoints::{
    LEFT_ANKLE, LEFT_WRIST, NUM_KEYPOINTS, RIGHT_KNEE, RIGHT_SHOULDER,
};
use hardcase_miner::{
    Dataset, HardCaseReason, Keypoints, MiningConfig, PROXIMITY_THRESHOLD, masked_keypoint_loss,
};

/// Flat COCO [x, y, v] keypoints with every joint visible and spread out
/// across a `width` x `height` image.
fn spread_flat(width: f32, height: f32) -> Vec<f32> {
    let mut flat = vec![0.0f32; NUM_KEYPOINTS * 3];
    for i in 0..NUM_KEYPOINTS {
        #[allow(clippy::cast_precision_loss)]
        let t = i as f32 / NUM_KEYPOINTS as f32;
        flat[i * 3] = t * width;
        flat[i * 3 + 1] = (1.0 - t) * height;
        flat[i * 3 + 2] = 2.0;
    }
    flat
}

fn annotation(id: u64, image_id: u64, kpts: &[f32]) -> String {
    format!(r#"{{"id": {id}, "image_id": {image_id}, "category_id": 1, "keypoints": {kpts:?}}}"#)
}

/// Write a small COCO corpus to a temp directory and return the JSON path.
///
/// Image 1: crossed legs. Image 2: occluded wrist. Image 3: easy pose.
/// Image 4: two persons with hard geometry (excluded by the person count).
fn write_corpus(name: &str) -> PathBuf {
    let width = 640.0;
    let height = 480.0;

    let mut crossed = spread_flat(width, height);
    crossed[LEFT_ANKLE * 3] = 0.40 * width;
    crossed[LEFT_ANKLE * 3 + 1] = 0.50 * height;
    crossed[RIGHT_KNEE * 3] = 0.41 * width;
    crossed[RIGHT_KNEE * 3 + 1] = 0.52 * height;

    let mut occluded = spread_flat(width, height);
    occluded[LEFT_WRIST * 3 + 2] = 1.0;

    let easy = spread_flat(width, height);

    let json = format!(
        r#"{{
        "images": [
            {{"id": 1, "file_name": "a.jpg", "width": {width}, "height": {height}}},
            {{"id": 2, "file_name": "b.jpg", "width": {width}, "height": {height}}},
            {{"id": 3, "file_name": "c.jpg", "width": {width}, "height": {height}}},
            {{"id": 4, "file_name": "d.jpg", "width": {width}, "height": {height}}}
        ],
        "annotations": [{}, {}, {}, {}, {}]
        }}"#,
        annotation(1, 1, &crossed),
        annotation(2, 2, &occluded),
        annotation(3, 3, &easy),
        annotation(4, 4, &crossed),
        annotation(5, 4, &occluded),
    );

    let dir = std::env::temp_dir().join("hardcase-miner-integration");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, json).unwrap();
    path
}

#[test]
fn test_mine_corpus_end_to_end() {
    let annotations = write_corpus("corpus.json");
    let dataset = Dataset::load(&annotations, &PathBuf::from("images")).unwrap();
    assert_eq!(dataset.len(), 4);
    assert_eq!(dataset.skipped_annotations(), 0);

    let mined = dataset.mine_hard_cases(PROXIMITY_THRESHOLD, None);

    // The crossed-legs and occluded-wrist images qualify; the easy pose and
    // the two-person image do not.
    assert_eq!(mined.len(), 2);
    assert_eq!(mined[0].0.path, PathBuf::from("images/a.jpg"));
    assert_eq!(mined[0].1, HardCaseReason::CrossedLegs);
    assert_eq!(mined[1].0.path, PathBuf::from("images/b.jpg"));
    assert_eq!(mined[1].1, HardCaseReason::OccludedJoint);
}

#[test]
fn test_mine_corpus_with_limit() {
    let annotations = write_corpus("corpus_limit.json");
    let dataset = Dataset::load(&annotations, &PathBuf::from("images")).unwrap();

    let mined = dataset.mine_hard_cases(PROXIMITY_THRESHOLD, Some(1));
    assert_eq!(mined.len(), 1);
    assert_eq!(mined[0].1, HardCaseReason::CrossedLegs);
}

#[test]
fn test_threshold_widens_the_mined_subset() {
    let annotations = write_corpus("corpus_threshold.json");
    let dataset = Dataset::load(&annotations, &PathBuf::from("images")).unwrap();

    // A near-zero threshold keeps only the occlusion rule alive; a huge one
    // pulls in the easy pose through the distance rules as well.
    let strict = dataset.mine_hard_cases(1e-6, None);
    assert_eq!(strict.len(), 1);
    assert_eq!(strict[0].1, HardCaseReason::OccludedJoint);

    let loose = dataset.mine_hard_cases(2.0, None);
    assert_eq!(loose.len(), 3);
}

#[test]
fn test_coco_pixel_conversion_swaps_to_yx() {
    let mut flat = spread_flat(100.0, 100.0);
    flat[RIGHT_SHOULDER * 3] = 50.0;
    flat[RIGHT_SHOULDER * 3 + 1] = 25.0;

    let kpts = Keypoints::from_coco_pixels(&flat, 100.0, 100.0).unwrap();
    let (y, x) = kpts.yx(RIGHT_SHOULDER);
    assert!((y - 0.25).abs() < 1e-6);
    assert!((x - 0.50).abs() < 1e-6);
}

#[test]
fn test_masked_loss_pools_over_valid_keypoints() {
    let mut y_true = Array3::<f32>::zeros((1, NUM_KEYPOINTS, 3));
    let mut y_pred = Array5::<f32>::zeros((1, 1, 1, NUM_KEYPOINTS, 3));

    // One labeled keypoint off by 0.1 in y; every other keypoint unlabeled
    // with wildly wrong predictions that must not count.
    y_true[[0, 0, 0]] = 0.5;
    y_true[[0, 0, 1]] = 0.5;
    y_true[[0, 0, 2]] = 2.0;
    y_pred[[0, 0, 0, 0, 0]] = 0.6;
    y_pred[[0, 0, 0, 0, 1]] = 0.5;
    for k in 1..NUM_KEYPOINTS {
        y_pred[[0, 0, 0, k, 0]] = 1.0;
        y_pred[[0, 0, 0, k, 1]] = 1.0;
    }

    let loss = masked_keypoint_loss(&y_true, &y_pred);
    assert!((loss - 0.01).abs() < 1e-6);
}

#[test]
fn test_masked_loss_is_zero_without_labels() {
    let y_true = Array3::<f32>::zeros((2, NUM_KEYPOINTS, 3));
    let mut y_pred = Array5::<f32>::zeros((2, 1, 1, NUM_KEYPOINTS, 3));
    y_pred.fill(0.7);

    assert_eq!(masked_keypoint_loss(&y_true, &y_pred), 0.0);
}

#[test]
fn test_mining_config_defaults() {
    let config = MiningConfig::new();
    assert_eq!(config.input_size, 256);
    assert_eq!(config.batch_size, 8);
    assert_eq!(config.train_samples, 10_000);
    assert_eq!(config.val_samples, 2_000);
    assert_eq!(config.epochs, 5);
    assert!((config.proximity_threshold - PROXIMITY_THRESHOLD).abs() < f32::EPSILON);
    assert!((config.learning_rate - 1e-5).abs() < f32::EPSILON);
    assert_eq!(config.num_threads, 0);
}
