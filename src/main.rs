// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use clap::Parser;

use hardcase_miner::cli::args::{Cli, Commands};
use hardcase_miner::cli::finetune::run_finetune;
use hardcase_miner::cli::logging::set_verbose;
use hardcase_miner::cli::mine::run_mining;

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Mine(args) => {
            set_verbose(args.verbose);
            run_mining(&args);
        }
        Commands::Finetune(args) => {
            set_verbose(args.verbose);
            run_finetune(&args);
        }
    }
}
