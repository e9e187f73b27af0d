//! Frame sampling from a video file.

use crate::error::{BlikkError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Frames are downscaled before captioning to reduce API cost and latency.
const FRAME_WIDTH: u32 = 640;
const FRAME_HEIGHT: u32 = 360;

/// One sampled frame: its position in the source and the JPEG on disk.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Position of the frame in the source video (seconds).
    pub timestamp: f64,
    /// Path of the extracted JPEG.
    pub jpeg_path: PathBuf,
}

/// Sample one frame every `interval` seconds into `work_dir`.
///
/// A single pass over the video; the returned frames are ordered by
/// timestamp. The work directory is expected to be empty and is owned by
/// the caller (typically a temp dir removed after indexing).
#[instrument(skip(work_dir), fields(source = %source.display()))]
pub async fn extract_frames(source: &Path, interval: f64, work_dir: &Path) -> Result<Vec<Frame>> {
    if !source.exists() {
        return Err(BlikkError::InvalidInput(format!(
            "Video file not found: {}",
            source.display()
        )));
    }
    if interval <= 0.0 {
        return Err(BlikkError::InvalidInput(format!(
            "Frame interval must be positive, got {}",
            interval
        )));
    }

    std::fs::create_dir_all(work_dir)?;

    let pattern = work_dir.join("frame_%06d.jpg");
    let filter = format!(
        "fps=1/{},scale={}:{}",
        interval, FRAME_WIDTH, FRAME_HEIGHT
    );

    let result = Command::new("ffmpeg")
        .arg("-i").arg(source)
        .arg("-vf").arg(&filter)
        .arg("-q:v").arg("3")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(&pattern)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(BlikkError::ToolNotFound("ffmpeg".into()));
        }
        Err(e) => {
            return Err(BlikkError::FrameExtraction(format!(
                "ffmpeg execution failed: {e}"
            )));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BlikkError::FrameExtraction(format!("ffmpeg failed: {stderr}")));
    }

    let frames = collect_frames(work_dir, interval)?;
    info!("Extracted {} frames from {:?}", frames.len(), source);
    Ok(frames)
}

/// Gather the numbered JPEGs ffmpeg wrote and map them back to timestamps.
///
/// ffmpeg numbers output frames from 1, so frame n sits at (n-1) * interval.
fn collect_frames(work_dir: &Path, interval: f64) -> Result<Vec<Frame>> {
    let mut numbered: Vec<(u32, PathBuf)> = Vec::new();

    for entry in std::fs::read_dir(work_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();

        if let Some(number) = name
            .strip_prefix("frame_")
            .and_then(|s| s.strip_suffix(".jpg"))
            .and_then(|s| s.parse::<u32>().ok())
        {
            numbered.push((number, entry.path()));
        }
    }

    numbered.sort_by_key(|(n, _)| *n);

    let frames = numbered
        .into_iter()
        .map(|(n, jpeg_path)| Frame {
            timestamp: (n.saturating_sub(1)) as f64 * interval,
            jpeg_path,
        })
        .collect();

    debug!("Collected frames from {:?}", work_dir);
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_frames_orders_and_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        for n in [3u32, 1, 2] {
            std::fs::write(dir.path().join(format!("frame_{:06}.jpg", n)), b"jpeg").unwrap();
        }
        // Unrelated file is ignored.
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let frames = collect_frames(dir.path(), 2.0).unwrap();
        assert_eq!(frames.len(), 3);
        assert!((frames[0].timestamp - 0.0).abs() < f64::EPSILON);
        assert!((frames[1].timestamp - 2.0).abs() < f64::EPSILON);
        assert!((frames[2].timestamp - 4.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_missing_source_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_frames(Path::new("/nonexistent/video.mp4"), 1.0, dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, BlikkError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_nonpositive_interval_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("video.mp4");
        std::fs::write(&source, b"stub").unwrap();

        let err = extract_frames(&source, 0.0, dir.path()).await.unwrap_err();
        assert!(matches!(err, BlikkError::InvalidInput(_)));
    }
}
