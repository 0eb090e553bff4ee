// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! COCO-style keypoint corpus loading and hard-case mining.
//!
//! Reads a `person_keypoints_*.json` annotation file, joins person
//! annotations to their images, and exposes the corpus as [`PoseSample`]s
//! with normalized `(y, x, visibility)` keypoints.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;
use crate::keypoints::{Keypoints, NUM_KEYPOINTS};
use crate::mining::{HardCaseReason, classify_sample};

/// COCO category id for persons.
const PERSON_CATEGORY: u64 = 1;

/// One image record from a COCO annotation file.
#[derive(Debug, Deserialize)]
struct CocoImage {
    id: u64,
    file_name: String,
    width: f32,
    height: f32,
}

/// One person annotation from a COCO annotation file.
#[derive(Debug, Deserialize)]
struct CocoAnnotation {
    image_id: u64,
    #[serde(default)]
    category_id: u64,
    #[serde(default)]
    keypoints: Vec<f32>,
}

/// Top-level COCO keypoint annotation file.
#[derive(Debug, Deserialize)]
struct CocoFile {
    images: Vec<CocoImage>,
    annotations: Vec<CocoAnnotation>,
}

/// One image with its annotated persons.
#[derive(Debug, Clone)]
pub struct PoseSample {
    /// Path to the image file.
    pub path: PathBuf,
    /// Keypoints for each annotated person (possibly empty).
    pub persons: Vec<Keypoints>,
}

/// A loaded pose-estimation corpus.
#[derive(Debug)]
pub struct Dataset {
    samples: Vec<PoseSample>,
    skipped_annotations: usize,
}

impl Dataset {
    /// Load a corpus from a COCO keypoint annotation file.
    ///
    /// Image paths are resolved relative to `image_dir`. Person annotations
    /// with a malformed keypoint list (wrong length) are skipped, not
    /// errored; images without any person annotation are kept with an empty
    /// person list so the classifier can exclude them uniformly.
    ///
    /// # Arguments
    ///
    /// * `annotations` - Path to the JSON annotation file.
    /// * `image_dir` - Directory containing the referenced images.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid COCO JSON.
    pub fn load<P: AsRef<Path>>(annotations: P, image_dir: P) -> Result<Self> {
        let file = File::open(annotations.as_ref())?;
        let coco: CocoFile = serde_json::from_reader(BufReader::new(file))?;
        Ok(Self::from_coco(coco, image_dir.as_ref()))
    }

    fn from_coco(coco: CocoFile, image_dir: &Path) -> Self {
        let mut persons_by_image: HashMap<u64, Vec<Keypoints>> = HashMap::new();
        let mut skipped = 0usize;

        let dims: HashMap<u64, (f32, f32)> = coco
            .images
            .iter()
            .map(|img| (img.id, (img.width, img.height)))
            .collect();

        for ann in &coco.annotations {
            if ann.category_id != PERSON_CATEGORY {
                continue;
            }
            let Some(&(width, height)) = dims.get(&ann.image_id) else {
                skipped += 1;
                continue;
            };
            if ann.keypoints.len() != NUM_KEYPOINTS * 3 {
                skipped += 1;
                continue;
            }
            match Keypoints::from_coco_pixels(&ann.keypoints, width, height) {
                Ok(kpts) => persons_by_image.entry(ann.image_id).or_default().push(kpts),
                Err(_) => skipped += 1,
            }
        }

        let samples = coco
            .images
            .into_iter()
            .map(|img| PoseSample {
                path: image_dir.join(&img.file_name),
                persons: persons_by_image.remove(&img.id).unwrap_or_default(),
            })
            .collect();

        Self {
            samples,
            skipped_annotations: skipped,
        }
    }

    /// Number of images in the corpus.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the corpus is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of person annotations skipped as malformed during loading.
    #[must_use]
    pub const fn skipped_annotations(&self) -> usize {
        self.skipped_annotations
    }

    /// Borrow all samples.
    #[must_use]
    pub fn samples(&self) -> &[PoseSample] {
        &self.samples
    }

    /// Mine the hard-case subset of the corpus.
    ///
    /// Filters single-person samples through the hard-case rules and caps
    /// the result at `limit` samples when given, matching the corpus
    /// `filter(...).take(n)` traversal the miner replaces.
    #[must_use]
    pub fn mine_hard_cases(
        &self,
        threshold: f32,
        limit: Option<usize>,
    ) -> Vec<(&PoseSample, HardCaseReason)> {
        let mined = self
            .samples
            .iter()
            .filter_map(|sample| classify_sample(sample, threshold).map(|reason| (sample, reason)));

        match limit {
            Some(n) => mined.take(n).collect(),
            None => mined.collect(),
        }
    }
}
