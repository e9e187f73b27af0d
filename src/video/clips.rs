//! Clip trimming around matched moments.

use crate::error::{BlikkError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// Deterministic output path for a clip of `source_path` over `[start, end]`.
///
/// The path depends only on the source file name and the integral window
/// bounds, so repeated requests for the same moment reuse the same file.
pub fn clip_output_path(clips_dir: &Path, source_path: &Path, start: f64, end: f64) -> PathBuf {
    let video_name = source_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("video");

    clips_dir.join(format!("clip_{}_{}_{}.mp4", video_name, start as i64, end as i64))
}

/// Cut `[start, end]` out of a video file into `output`.
///
/// The window is clamped to the file duration; a window that collapses to
/// nothing after clamping is an error. Tries a stream copy first and falls
/// back to re-encoding when the copy fails.
#[instrument(skip_all, fields(source = %source.display(), start, end))]
pub async fn extract_clip(source: &Path, start: f64, end: f64, output: &Path) -> Result<()> {
    if !source.exists() {
        return Err(BlikkError::ClipExtraction(format!(
            "Video file not found: {}",
            source.display()
        )));
    }

    let duration = probe_duration(source).await?;
    let start = start.max(0.0);
    let end = end.min(duration);

    if start >= end {
        return Err(BlikkError::ClipExtraction(format!(
            "Empty clip window [{:.1}, {:.1}] for {}",
            start,
            end,
            source.display()
        )));
    }

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let length = end - start;

    // First attempt: stream copy (fast, no quality loss)
    let copy_result = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-c").arg("copy")
        .arg("-y")
        .arg("-loglevel").arg("warning")
        .arg(output)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match copy_result {
        Ok(status) if status.success() && output.exists() => {
            debug!("Stream-copied clip to {:?}", output);
            return Ok(());
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(BlikkError::ToolNotFound("ffmpeg".into()));
        }
        _ => {}
    }

    // Fallback: re-encode
    warn!("Stream copy failed, re-encoding clip");

    let encode_result = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-c:v").arg("libx264")
        .arg("-preset").arg("ultrafast")
        .arg("-c:a").arg("aac")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(output)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match encode_result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(BlikkError::ToolFailed(format!("ffmpeg encode failed: {err}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(BlikkError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(BlikkError::ToolFailed(format!("ffmpeg: {e}"))),
    }
}

/// Queries the duration of a media file using ffprobe with JSON output.
pub async fn probe_duration(path: &Path) -> Result<f64> {
    let result = Command::new("ffprobe")
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg(path)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(BlikkError::ToolNotFound("ffprobe".into()));
        }
        Err(e) => {
            return Err(BlikkError::ToolFailed(format!("ffprobe: {e}")));
        }
    };

    if !output.status.success() {
        return Err(BlikkError::ToolFailed("ffprobe returned error".into()));
    }

    let json_str = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&json_str)
        .map_err(|_| BlikkError::ClipExtraction("Invalid ffprobe output".into()))?;

    parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| BlikkError::ClipExtraction("Could not determine video duration".into()))
}
