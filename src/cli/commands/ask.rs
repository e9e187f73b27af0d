//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, model: Option<String>, mut settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        Output::info("Run 'blikk doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.answer.model = model;
    }

    let orchestrator = Orchestrator::new(settings)?;
    let engine = orchestrator.answer_engine();

    let spinner = Output::spinner("Searching video library...");

    match engine.ask(question).await {
        Ok(response) => {
            spinner.finish_and_clear();

            println!("\n{}\n", response.answer);

            if !response.findings.is_empty() {
                Output::header("Moments");
                for finding in &response.findings {
                    Output::search_result(
                        &finding.source_path,
                        &format!("{:.1}s", finding.timestamp),
                        finding.distance,
                        &finding.description,
                    );
                }
            }

            if !response.clips.is_empty() {
                println!();
                Output::header("Clips");
                for clip in &response.clips {
                    Output::clip_item(&clip.display().to_string());
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
