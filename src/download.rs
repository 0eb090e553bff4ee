// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pretrained model downloading utilities.
//!
//! This module fetches the default pretrained pose model from its release
//! URL when it is not found locally.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{MiningError, Result};

/// Default pretrained pose model name.
pub const DEFAULT_MODEL: &str = "movenet-singlepose-thunder.onnx";

/// URL for downloading the default pose model.
const DEFAULT_MODEL_URL: &str =
    "https://huggingface.co/onnx-community/movenet-singlepose-thunder/resolve/main/model.onnx";

/// Connection timeout in seconds.
const CONNECT_TIMEOUT: u64 = 30;

/// Read timeout in seconds.
const READ_TIMEOUT: u64 = 300;

/// Format bytes as human-readable string (e.g., "10.4MB").
fn format_bytes(bytes: f64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    if bytes >= GB {
        format!("{:.1}GB", bytes / GB)
    } else if bytes >= MB {
        format!("{:.1}MB", bytes / MB)
    } else if bytes >= KB {
        format!("{:.1}KB", bytes / KB)
    } else {
        format!("{bytes:.0}B")
    }
}

/// Ensure the model file exists, downloading the default when missing.
///
/// A path other than [`DEFAULT_MODEL`] is never downloaded; a missing custom
/// model is the caller's error.
///
/// # Errors
///
/// Returns an error if the model is missing and cannot be downloaded.
pub fn ensure_model<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(path.to_path_buf());
    }

    if path.file_name().and_then(|n| n.to_str()) != Some(DEFAULT_MODEL) {
        return Err(MiningError::ModelLoadError(format!(
            "Model file not found: {}",
            path.display()
        )));
    }

    download_file(DEFAULT_MODEL_URL, path)?;
    Ok(path.to_path_buf())
}

/// Download a file from URL to the specified path with a progress line.
///
/// Uses streaming download to a temporary file, then atomic rename to prevent
/// corrupted files from partial downloads.
fn download_file(url: &str, dest: &Path) -> Result<()> {
    // Create ureq agent with timeouts
    let config = ureq::Agent::config_builder()
        .timeout_connect(Some(Duration::from_secs(CONNECT_TIMEOUT)))
        .timeout_recv_body(Some(Duration::from_secs(READ_TIMEOUT)))
        .build();
    let agent = ureq::Agent::new_with_config(config);

    let response = agent.get(url).call().map_err(|e| {
        let msg = match &e {
            ureq::Error::Timeout(_) => format!("Connection timed out while downloading {url}"),
            ureq::Error::Io(io_err) => format!("Network error downloading {url}: {io_err}"),
            _ => format!("Failed to download {url}: {e}"),
        };
        MiningError::ModelLoadError(msg)
    })?;

    let total_size: u64 = response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|s: &str| s.parse().ok())
        .unwrap_or(0);

    // Create temp file for atomic download (same directory for atomic rename)
    let temp_path = dest.with_extension("part");
    let _ = fs::remove_file(&temp_path);

    let temp_file = File::create(&temp_path).map_err(|e| {
        MiningError::ModelLoadError(format!(
            "Failed to create temp file {}: {e}",
            temp_path.display()
        ))
    })?;
    let mut writer = BufWriter::new(temp_file);

    let mut reader = response.into_body().into_reader();
    let mut downloaded: u64 = 0;
    let mut buffer = [0u8; 65536];
    let mut last_update = Instant::now();

    // Update the progress line at most every 100ms
    const MIN_UPDATE_INTERVAL: f64 = 0.1;

    println!("Downloading {} to '{}'...", url, dest.display());

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(|e| {
            MiningError::ModelLoadError(format!("Failed to read from network: {e}"))
        })?;

        if bytes_read == 0 {
            break;
        }

        writer.write_all(&buffer[..bytes_read]).map_err(|e| {
            MiningError::ModelLoadError(format!("Failed to write to temp file: {e}"))
        })?;

        downloaded += bytes_read as u64;

        let now = Instant::now();
        if now.duration_since(last_update).as_secs_f64() >= MIN_UPDATE_INTERVAL {
            #[allow(clippy::cast_precision_loss)]
            if total_size > 0 {
                print!(
                    "\r  {} / {}",
                    format_bytes(downloaded as f64),
                    format_bytes(total_size as f64)
                );
            } else {
                print!("\r  {}", format_bytes(downloaded as f64));
            }
            let _ = std::io::stdout().flush();
            last_update = now;
        }
    }

    writer
        .flush()
        .map_err(|e| MiningError::ModelLoadError(format!("Failed to flush temp file: {e}")))?;
    drop(writer);

    #[allow(clippy::cast_precision_loss)]
    {
        println!("\r  {} downloaded", format_bytes(downloaded as f64));
    }

    fs::rename(&temp_path, dest).map_err(|e| {
        MiningError::ModelLoadError(format!(
            "Failed to move downloaded file to {}: {e}",
            dest.display()
        ))
    })?;

    Ok(())
}
