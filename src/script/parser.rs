//! Parsing of sanitized scripts into voiced dialogue lines.

use super::{Line, ParsedScript, Speaker, VoiceMap};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

const EMPHASIS: &[char] = &['*', '_'];

/// A speaker label that follows the end of a sentence on the same line.
fn inline_label() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)([.!?…"'”)\]*])[ \t]+([*_]*(?:host|guest):)"#)
            .expect("valid inline label regex")
    })
}

/// Split `text` into ordered dialogue lines.
///
/// Only lines starting with `host:` or `guest:` (case-insensitive, after trimming
/// whitespace and emphasis markers) are kept. Other non-blank lines are counted in
/// [`ParsedScript::discarded`] and otherwise ignored. A label that starts a new
/// sentence mid-line begins a new dialogue line.
pub fn parse_script(text: &str, voices: &VoiceMap) -> ParsedScript {
    let text = inline_label().replace_all(text, "$1\n$2");
    let mut parsed = ParsedScript::default();

    for raw in text.lines() {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }

        match recognize(trimmed) {
            Some((speaker, utterance)) => {
                parsed.lines.push(Line {
                    index: parsed.lines.len(),
                    speaker,
                    voice: voices.voice_for(speaker).to_string(),
                    utterance,
                });
            }
            None => {
                debug!("Discarding unlabeled script line: {:.80}", trimmed);
                parsed.discarded += 1;
            }
        }
    }

    if parsed.discarded > 0 {
        debug!(
            "Parsed {} lines, discarded {}",
            parsed.lines.len(),
            parsed.discarded
        );
    }
    parsed
}

fn recognize(line: &str) -> Option<(Speaker, String)> {
    let line = line.trim_matches(EMPHASIS).trim();
    let lower = line.to_lowercase();
    let speaker = if lower.starts_with("host:") {
        Speaker::Host
    } else if lower.starts_with("guest:") {
        Speaker::Guest
    } else {
        return None;
    };

    let (_, rest) = line.split_once(':')?;
    let utterance = rest.trim().trim_start_matches(EMPHASIS).trim();
    Some((speaker, utterance.to_string()))
}
