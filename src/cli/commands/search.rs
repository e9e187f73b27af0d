//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, limit: usize, mut settings: Settings) -> Result<()> {
    // Embedding the query needs the API key
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        Output::info("Run 'blikk doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    settings.retrieval.max_results = limit;

    let orchestrator = Orchestrator::new(settings)?;
    let engine = orchestrator.retrieval_engine();

    let spinner = Output::spinner("Searching...");

    let results = engine.search(query).await;
    spinner.finish_and_clear();

    match results {
        Ok(hits) => {
            if hits.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", hits.len()));

                for hit in &hits {
                    Output::search_result(
                        &hit.metadata.source_path,
                        &hit.metadata.format_timestamp(),
                        hit.distance,
                        &hit.metadata.description,
                    );
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
