//! CLI output formatting utilities.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print indexed video info.
    pub fn video_info(path: &str, frames: usize, last_timestamp: f64) {
        println!(
            "  {} {} ({} frames, {})",
            style("*").cyan(),
            style(path).bold(),
            frames,
            format_duration(last_timestamp)
        );
    }

    /// Print a search result.
    pub fn search_result(source: &str, timestamp: &str, distance: f32, description: &str) {
        println!(
            "\n{} {} @ {} (distance: {:.3})",
            style(">>").green(),
            style(source).bold(),
            style(timestamp).cyan(),
            distance
        );
        println!("   {}", content_preview(description, 200));
    }

    /// Print an extracted clip path.
    pub fn clip_item(path: &str) {
        println!("  {} {}", style("*").cyan(), style(path).dim());
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Format duration in seconds to a human-readable string.
fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Truncate content to `max_chars` characters with ellipsis.
///
/// Counts characters, not bytes: captions are model-generated and can
/// contain multibyte text, so a byte slice could split a character.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_preview_keeps_short_content() {
        assert_eq!(content_preview("a red car", 200), "a red car");
    }

    #[test]
    fn test_content_preview_truncates_long_content() {
        let long = "x".repeat(250);
        let preview = content_preview(&long, 200);
        assert_eq!(preview, format!("{}...", "x".repeat(200)));
    }

    #[test]
    fn test_content_preview_truncates_multibyte_on_char_boundary() {
        // Three-byte characters; a byte-offset slice would panic here.
        let caption = "日".repeat(300);
        let preview = content_preview(&caption, 200);
        assert_eq!(preview, format!("{}...", "日".repeat(200)));
    }

    #[test]
    fn test_content_preview_flattens_newlines() {
        assert_eq!(content_preview("a red\ncar", 200), "a red car");
    }
}
