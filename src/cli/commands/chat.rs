//! Interactive chat command.

use crate::answer::Conversation;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::Result;
use crate::orchestrator::Orchestrator;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(model: Option<String>, mut settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        Output::info("Run 'blikk doctor' for detailed diagnostics.");
        return Err(e);
    }

    if let Some(model) = model {
        settings.answer.model = model;
    }

    let orchestrator = Orchestrator::new(settings)?;
    let engine = orchestrator.answer_engine();
    let mut conversation = Conversation::new();

    println!("\n{}", style("Blikk Chat").bold().cyan());
    println!(
        "{}\n",
        style("Ask about your videos, or 'exit' to quit. Use 'clear' to reset conversation.")
            .dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            conversation.clear();
            Output::info("Conversation history cleared.");
            continue;
        }

        match engine.chat(&mut conversation, input).await {
            Ok(response) => {
                println!(
                    "\n{} {}\n",
                    style("Blikk:").cyan().bold(),
                    response.answer
                );

                for clip in &response.clips {
                    Output::clip_item(&clip.display().to_string());
                }
                if !response.clips.is_empty() {
                    println!();
                }
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}
