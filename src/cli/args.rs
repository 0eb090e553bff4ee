// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use clap::{Args, Parser, Subcommand};

/// CLI arguments parser.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = r#"Examples:
    hardcase-miner mine --annotations person_keypoints_val2017.json --images val2017/
    hardcase-miner mine -a train.json -i train2017/ --threshold 0.1 --output hard.json
    hardcase-miner finetune -a train.json -i train2017/ --val-annotations val.json --val-images val2017/
    hardcase-miner finetune -a train.json -i train2017/ --val-annotations val.json --val-images val2017/ \
        --model movenet-singlepose-thunder.onnx --epochs 5 --batch 8 --imgsz 256"#)]
pub struct Cli {
    #[command(subcommand)]
    /// Subcommand to execute.
    pub command: Commands,
}

/// Commands for the CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Mine hard-case poses (occluded or crossed limbs) from a corpus
    Mine(MineArgs),
    /// Fine-tune a pretrained pose model on mined hard cases
    Finetune(FinetuneArgs),
}

/// Arguments for the mine command.
#[derive(Args, Debug)]
pub struct MineArgs {
    /// Path to a COCO keypoint annotation JSON file
    #[arg(short, long)]
    pub annotations: String,

    /// Directory containing the annotated images
    #[arg(short, long, default_value = ".")]
    pub images: String,

    /// Normalized proximity threshold for crossed-limb detection
    #[arg(long, default_value_t = 0.08)]
    pub threshold: f32,

    /// Maximum number of hard cases to mine
    #[arg(long)]
    pub limit: Option<usize>,

    /// Write the mined subset as JSON to this path
    #[arg(short, long)]
    pub output: Option<String>,

    /// Show verbose output
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub verbose: bool,
}

/// Arguments for the finetune command.
#[derive(Args, Debug)]
pub struct FinetuneArgs {
    /// Path to the training COCO keypoint annotation JSON file
    #[arg(short, long)]
    pub annotations: String,

    /// Directory containing the training images
    #[arg(short, long, default_value = ".")]
    pub images: String,

    /// Path to the validation COCO keypoint annotation JSON file
    #[arg(long)]
    pub val_annotations: String,

    /// Directory containing the validation images
    #[arg(long, default_value = ".")]
    pub val_images: String,

    /// Path to the pretrained ONNX pose model
    #[arg(short, long)]
    pub model: Option<String>,

    /// Square model input resolution
    #[arg(long, default_value_t = 256)]
    pub imgsz: usize,

    /// Batch size
    #[arg(long, default_value_t = 8)]
    pub batch: usize,

    /// Number of epochs
    #[arg(long, default_value_t = 5)]
    pub epochs: usize,

    /// Maximum number of mined training samples to use
    #[arg(long, default_value_t = 10_000)]
    pub train_samples: usize,

    /// Maximum number of mined validation samples to use
    #[arg(long, default_value_t = 2_000)]
    pub val_samples: usize,

    /// Normalized proximity threshold for crossed-limb detection
    #[arg(long, default_value_t = 0.08)]
    pub threshold: f32,

    /// Fine-tuning learning rate
    #[arg(long, default_value_t = 1e-5)]
    pub lr: f32,

    /// Number of intra-op threads (0 = auto)
    #[arg(long, default_value_t = 0)]
    pub threads: usize,

    /// Base directory for run outputs
    #[arg(long, default_value = "runs")]
    pub output: String,

    /// Show verbose output
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_mine_args_defaults() {
        let args = Cli::parse_from(["app", "mine", "--annotations", "val.json"]);
        match args.command {
            Commands::Mine(mine_args) => {
                assert_eq!(mine_args.annotations, "val.json");
                assert_eq!(mine_args.images, ".");
                assert!((mine_args.threshold - 0.08).abs() < f32::EPSILON);
                assert!(mine_args.limit.is_none());
                assert!(mine_args.output.is_none());
                assert!(mine_args.verbose);
            }
            Commands::Finetune(_) => panic!("expected mine command"),
        }
    }

    #[test]
    fn test_finetune_args_custom() {
        let args = Cli::parse_from([
            "app",
            "finetune",
            "--annotations",
            "train.json",
            "--val-annotations",
            "val.json",
            "--epochs",
            "2",
            "--batch",
            "16",
            "--lr",
            "0.0001",
            "--verbose",
            "false",
        ]);
        match args.command {
            Commands::Finetune(ft) => {
                assert_eq!(ft.annotations, "train.json");
                assert_eq!(ft.val_annotations, "val.json");
                assert_eq!(ft.epochs, 2);
                assert_eq!(ft.batch, 16);
                assert!((ft.lr - 1e-4).abs() < f32::EPSILON);
                assert_eq!(ft.imgsz, 256);
                assert_eq!(ft.train_samples, 10_000);
                assert_eq!(ft.val_samples, 2_000);
                assert!(!ft.verbose);
            }
            Commands::Mine(_) => panic!("expected finetune command"),
        }
    }
}
