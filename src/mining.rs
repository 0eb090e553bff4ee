// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Hard-case classification for pose samples.
//!
//! A "hard case" is a pose the pretrained network tends to get wrong:
//! a key limb joint is occluded, or limbs cross (an ankle near the opposite
//! knee, a wrist near the opposite shoulder). Hard cases are mined from the
//! corpus and oversampled during fine-tuning.

use std::fmt;

use crate::dataset::PoseSample;
use crate::keypoints::{
    Keypoints, LEFT_ANKLE, LEFT_KNEE, LEFT_SHOULDER, LEFT_WRIST, RIGHT_ANKLE, RIGHT_KNEE,
    RIGHT_SHOULDER, RIGHT_WRIST, Visibility, squared_distance,
};

/// Default proximity threshold as a fraction of the normalized image diagonal.
///
/// Two keypoints closer than this are considered "crossed".
pub const PROXIMITY_THRESHOLD: f32 = 0.08;

/// Joints whose occlusion alone makes a pose a hard case.
const OCCLUSION_JOINTS: [usize; 6] = [
    LEFT_ANKLE,
    RIGHT_ANKLE,
    LEFT_KNEE,
    RIGHT_KNEE,
    LEFT_WRIST,
    RIGHT_WRIST,
];

/// Ankle/knee pairs checked for crossed legs.
const LEG_PAIRS: [(usize, usize); 2] = [(LEFT_ANKLE, RIGHT_KNEE), (RIGHT_ANKLE, LEFT_KNEE)];

/// Wrist/shoulder pairs checked for crossed arms.
const ARM_PAIRS: [(usize, usize); 2] = [(LEFT_WRIST, RIGHT_SHOULDER), (RIGHT_WRIST, LEFT_SHOULDER)];

/// Why a pose was classified as a hard case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HardCaseReason {
    /// An ankle, knee, or wrist is annotated as occluded.
    OccludedJoint,
    /// An ankle is within the proximity threshold of the opposite knee.
    CrossedLegs,
    /// A wrist is within the proximity threshold of the opposite shoulder.
    CrossedArms,
}

impl HardCaseReason {
    /// String name used in reports and mined-subset output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OccludedJoint => "occluded_joint",
            Self::CrossedLegs => "crossed_legs",
            Self::CrossedArms => "crossed_arms",
        }
    }
}

impl fmt::Display for HardCaseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classify a single person's pose, returning the first matching reason.
///
/// The rules are a disjunction, so evaluation order only affects which
/// reason is reported, not whether the pose is a hard case:
/// 1. Any of the six key limb joints is occluded (visibility flag exactly 1;
///    unlabeled joints do not count).
/// 2. An ankle is within `threshold` of the opposite knee.
/// 3. A wrist is within `threshold` of the opposite shoulder.
///
/// Distances use normalized `(y, x)` coordinates and ignore visibility, so
/// unlabeled keypoints still contribute their (zero or placeholder)
/// coordinates to the crossed-limb checks. That mirrors the annotation
/// policy this miner was built against.
#[must_use]
pub fn classify_person(keypoints: &Keypoints, threshold: f32) -> Option<HardCaseReason> {
    if OCCLUSION_JOINTS
        .iter()
        .any(|&joint| keypoints.visibility(joint) == Visibility::Occluded)
    {
        return Some(HardCaseReason::OccludedJoint);
    }

    let threshold_sq = threshold * threshold;

    if LEG_PAIRS
        .iter()
        .any(|&(a, b)| squared_distance(keypoints.yx(a), keypoints.yx(b)) < threshold_sq)
    {
        return Some(HardCaseReason::CrossedLegs);
    }

    if ARM_PAIRS
        .iter()
        .any(|&(a, b)| squared_distance(keypoints.yx(a), keypoints.yx(b)) < threshold_sq)
    {
        return Some(HardCaseReason::CrossedArms);
    }

    None
}

/// Classify a full sample.
///
/// Samples without exactly one annotated person are never hard cases; the
/// per-person rules are not evaluated for them.
#[must_use]
pub fn classify_sample(sample: &PoseSample, threshold: f32) -> Option<HardCaseReason> {
    match sample.persons.as_slice() {
        [person] => classify_person(person, threshold),
        _ => None,
    }
}

/// Whether a sample is a hard case.
#[must_use]
pub fn is_hard_case(sample: &PoseSample, threshold: f32) -> bool {
    classify_sample(sample, threshold).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    use crate::keypoints::NUM_KEYPOINTS;

    /// Keypoints with all 17 joints visible and spread far apart.
    fn spread_pose() -> Array2<f32> {
        let mut data = Array2::zeros((NUM_KEYPOINTS, 3));
        for i in 0..NUM_KEYPOINTS {
            #[allow(clippy::cast_precision_loss)]
            let t = i as f32 / NUM_KEYPOINTS as f32;
            data[[i, 0]] = t;
            data[[i, 1]] = 1.0 - t;
            data[[i, 2]] = 2.0;
        }
        data
    }

    fn sample_with(persons: Vec<Keypoints>) -> PoseSample {
        PoseSample {
            path: "test.jpg".into(),
            persons,
        }
    }

    #[test]
    fn test_spread_visible_pose_is_not_hard() {
        let kpts = Keypoints::new(spread_pose()).unwrap();
        assert_eq!(classify_person(&kpts, PROXIMITY_THRESHOLD), None);
    }

    #[test]
    fn test_occluded_joint_triggers() {
        for joint in OCCLUSION_JOINTS {
            let mut data = spread_pose();
            data[[joint, 2]] = 1.0;
            let kpts = Keypoints::new(data).unwrap();
            assert_eq!(
                classify_person(&kpts, PROXIMITY_THRESHOLD),
                Some(HardCaseReason::OccludedJoint)
            );
        }
    }

    #[test]
    fn test_unlabeled_joint_does_not_count_as_occluded() {
        let mut data = spread_pose();
        data[[LEFT_ANKLE, 2]] = 0.0;
        // Move the unlabeled ankle away from every knee so the distance rules
        // stay quiet.
        data[[LEFT_ANKLE, 0]] = 0.95;
        data[[LEFT_ANKLE, 1]] = 0.95;
        let kpts = Keypoints::new(data).unwrap();
        assert_eq!(classify_person(&kpts, PROXIMITY_THRESHOLD), None);
    }

    #[test]
    fn test_crossed_legs_scenario() {
        // Left ankle at (0.50, 0.40), right knee at (0.52, 0.41):
        // squared distance 0.0005 < 0.0064.
        let mut data = spread_pose();
        data[[LEFT_ANKLE, 0]] = 0.50;
        data[[LEFT_ANKLE, 1]] = 0.40;
        data[[RIGHT_KNEE, 0]] = 0.52;
        data[[RIGHT_KNEE, 1]] = 0.41;
        let kpts = Keypoints::new(data).unwrap();
        assert_eq!(
            classify_person(&kpts, PROXIMITY_THRESHOLD),
            Some(HardCaseReason::CrossedLegs)
        );
    }

    #[test]
    fn test_crossed_legs_symmetric_pair() {
        let mut data = spread_pose();
        data[[RIGHT_ANKLE, 0]] = 0.30;
        data[[RIGHT_ANKLE, 1]] = 0.60;
        data[[LEFT_KNEE, 0]] = 0.30;
        data[[LEFT_KNEE, 1]] = 0.63;
        let kpts = Keypoints::new(data).unwrap();
        assert_eq!(
            classify_person(&kpts, PROXIMITY_THRESHOLD),
            Some(HardCaseReason::CrossedLegs)
        );
    }

    #[test]
    fn test_crossed_arms() {
        let mut data = spread_pose();
        data[[LEFT_WRIST, 0]] = 0.20;
        data[[LEFT_WRIST, 1]] = 0.70;
        data[[RIGHT_SHOULDER, 0]] = 0.22;
        data[[RIGHT_SHOULDER, 1]] = 0.71;
        let kpts = Keypoints::new(data).unwrap();
        assert_eq!(
            classify_person(&kpts, PROXIMITY_THRESHOLD),
            Some(HardCaseReason::CrossedArms)
        );
    }

    #[test]
    fn test_distance_at_threshold_is_not_crossed() {
        // Exactly at the threshold: strict less-than means no match.
        let mut data = spread_pose();
        data[[LEFT_ANKLE, 0]] = 0.50;
        data[[LEFT_ANKLE, 1]] = 0.40;
        data[[RIGHT_KNEE, 0]] = 0.50;
        data[[RIGHT_KNEE, 1]] = 0.40 + PROXIMITY_THRESHOLD;
        let kpts = Keypoints::new(data).unwrap();
        assert_eq!(classify_person(&kpts, PROXIMITY_THRESHOLD), None);
    }

    #[test]
    fn test_unlabeled_coordinates_still_reach_distance_checks() {
        // Both joints unlabeled but sitting at the array default (0, 0):
        // the distance rule still fires. Preserved annotation-policy gap.
        let mut data = spread_pose();
        for &joint in &[LEFT_ANKLE, RIGHT_KNEE] {
            data[[joint, 0]] = 0.0;
            data[[joint, 1]] = 0.0;
            data[[joint, 2]] = 0.0;
        }
        let kpts = Keypoints::new(data).unwrap();
        assert_eq!(
            classify_person(&kpts, PROXIMITY_THRESHOLD),
            Some(HardCaseReason::CrossedLegs)
        );
    }

    #[test]
    fn test_multi_person_sample_is_never_hard() {
        let mut data = spread_pose();
        data[[LEFT_ANKLE, 2]] = 1.0;
        let occluded = Keypoints::new(data).unwrap();

        let sample = sample_with(vec![occluded.clone(), occluded]);
        assert!(!is_hard_case(&sample, PROXIMITY_THRESHOLD));
    }

    #[test]
    fn test_zero_person_sample_is_never_hard() {
        let sample = sample_with(Vec::new());
        assert!(!is_hard_case(&sample, PROXIMITY_THRESHOLD));
    }

    #[test]
    fn test_single_person_sample_uses_person_rules() {
        let mut data = spread_pose();
        data[[RIGHT_WRIST, 2]] = 1.0;
        let sample = sample_with(vec![Keypoints::new(data).unwrap()]);
        assert_eq!(
            classify_sample(&sample, PROXIMITY_THRESHOLD),
            Some(HardCaseReason::OccludedJoint)
        );
    }
}
