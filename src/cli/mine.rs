// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::collections::HashMap;
use std::fs;
use std::process;

use serde::Serialize;

use crate::cli::args::MineArgs;
use crate::dataset::Dataset;
use crate::mining::HardCaseReason;
use crate::{error, info, success, verbose, warn};

/// One mined hard case in the JSON output.
#[derive(Debug, Serialize)]
struct MinedEntry {
    image: String,
    reason: &'static str,
}

/// Run hard-case mining over a corpus.
pub fn run_mining(args: &MineArgs) {
    let dataset = match Dataset::load(&args.annotations, &args.images) {
        Ok(d) => d,
        Err(e) => {
            error!("Failed to load annotations: {e}");
            process::exit(1);
        }
    };

    verbose!(
        "Loaded {} images from '{}'",
        dataset.len(),
        args.annotations
    );
    if dataset.skipped_annotations() > 0 {
        warn!(
            "Skipped {} malformed person annotation(s)",
            dataset.skipped_annotations()
        );
    }

    let mined = dataset.mine_hard_cases(args.threshold, args.limit);

    let mut reason_counts: HashMap<HardCaseReason, usize> = HashMap::new();
    for (_, reason) in &mined {
        *reason_counts.entry(*reason).or_insert(0) += 1;
    }

    info!(
        "Found {} hard case(s) among {} images (threshold {})",
        mined.len(),
        dataset.len(),
        args.threshold
    );
    for reason in [
        HardCaseReason::OccludedJoint,
        HardCaseReason::CrossedLegs,
        HardCaseReason::CrossedArms,
    ] {
        let count = reason_counts.get(&reason).copied().unwrap_or(0);
        verbose!("  {reason}: {count}");
    }

    if let Some(ref output) = args.output {
        let entries: Vec<MinedEntry> = mined
            .iter()
            .map(|(sample, reason)| MinedEntry {
                image: sample.path.to_string_lossy().to_string(),
                reason: reason.as_str(),
            })
            .collect();

        let json = match serde_json::to_string_pretty(&entries) {
            Ok(j) => j,
            Err(e) => {
                error!("Failed to serialize mined subset: {e}");
                process::exit(1);
            }
        };
        if let Err(e) = fs::write(output, json) {
            error!("Failed to write '{output}': {e}");
            process::exit(1);
        }
        success!("Mined subset written to '{output}'");
    }
}
