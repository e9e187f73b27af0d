//! Index command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::path::Path;

/// Run the index command.
pub async fn run_index(video: &Path, interval: Option<f64>, mut settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Index) {
        Output::error(&format!("{}", e));
        Output::info("Run 'blikk doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(interval) = interval {
        if interval <= 0.0 {
            Output::error("Frame interval must be positive.");
            return Err(anyhow::anyhow!("invalid frame interval: {interval}"));
        }
        settings.indexing.frame_interval_seconds = interval;
    }

    let orchestrator = Orchestrator::new(settings)?;

    Output::info(&format!("Indexing {}", video.display()));

    match orchestrator.process_video(video).await {
        Ok(report) => {
            Output::success(&format!(
                "Indexed {} frames from {}",
                report.frames_indexed, report.source_path
            ));
            Output::kv(
                "Library size",
                &format!("{} frames", orchestrator.store().len()),
            );
        }
        Err(e) => {
            Output::error(&format!("Indexing failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
