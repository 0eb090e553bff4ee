// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! CLI module for mining and fine-tuning.
//!
//! This module contains the command-line interface logic, including argument parsing
//! and the `mine` and `finetune` command implementations.

// Modules
/// CLI arguments.
pub mod args;

/// Fine-tuning logic.
pub mod finetune;

/// Logging helpers.
pub mod logging;

/// Mining logic.
pub mod mine;
