//! CLI output formatting utilities.

use crate::pipeline::PodcastOutput;
use crate::speech::SkipReason;
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

    /// Print a script line, dimmed when it produced no audio.
    pub fn script_line(speaker: &str, utterance: &str, voiced: bool) {
        let text = content_preview(utterance, 100);
        if voiced {
            println!("  {} {}", style(format!("{}:", speaker)).cyan().bold(), text);
        } else {
            println!(
                "  {} {}",
                style(format!("{}:", speaker)).dim(),
                style(text).dim().strikethrough()
            );
        }
    }

    /// Print the summary of a finished podcast.
    pub fn podcast_summary(output: &PodcastOutput, path: &str) {
        Output::header("Podcast");
        for line in &output.lines {
            let voiced = output.track.segments.contains(&line.index);
            Output::script_line(&line.speaker.to_string(), &line.utterance, voiced);
        }
        println!();
        Output::kv("File", path);
        Output::kv("Duration", &format_duration(output.track.duration_seconds()));
        Output::kv(
            "Format",
            &format!(
                "{} Hz, {} ch, {} bit",
                output.track.format.sample_rate,
                output.track.format.channels,
                output.track.format.bits_per_sample
            ),
        );
        Output::kv(
            "Lines",
            &format!(
                "{} voiced of {}",
                output.track.segments.len(),
                output.lines.len()
            ),
        );
        if output.discarded > 0 {
            Output::kv("Discarded", &output.discarded.to_string());
        }
        for skipped in &output.skipped {
            let reason = match &skipped.reason {
                SkipReason::EmptyUtterance => "empty line".to_string(),
                SkipReason::Failed(e) => e.clone(),
                SkipReason::DeadlineExceeded => "deadline exceeded".to_string(),
            };
            Output::warning(&format!("Line {} skipped: {}", skipped.index, reason));
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Format duration in seconds to a human-readable string.
fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds.round() as u32;
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

/// Truncate content with ellipsis.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    match content.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &content[..idx]),
        None => content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(4.4), "4s");
        assert_eq!(format_duration(125.0), "2m 5s");
        assert_eq!(format_duration(3725.0), "1h 2m 5s");
    }

    #[test]
    fn test_content_preview_respects_char_boundaries() {
        assert_eq!(content_preview("short", 10), "short");
        assert_eq!(content_preview("héllo wörld", 5), "héllo...");
        assert_eq!(content_preview("a\nb", 10), "a b");
    }
}
