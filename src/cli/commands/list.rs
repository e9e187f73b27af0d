//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    let sources = orchestrator.store().sources();

    if sources.is_empty() {
        Output::info("No videos indexed yet. Use 'blikk index <video>' to add one.");
        return Ok(());
    }

    Output::header(&format!("Indexed Videos ({})", sources.len()));
    println!();

    for source in &sources {
        Output::video_info(
            &source.source_path,
            source.frame_count,
            source.last_timestamp,
        );
    }

    let total_frames: usize = sources.iter().map(|s| s.frame_count).sum();
    println!();
    Output::kv("Total videos", &sources.len().to_string());
    Output::kv("Total frames", &total_frames.to_string());

    Ok(())
}
