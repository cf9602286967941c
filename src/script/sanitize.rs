//! Cleanup of raw model output into the canonical `Host:`/`Guest:` format.

use regex::Regex;
use std::sync::OnceLock;

fn emphasized_label() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\*+(host|guest):\*+").expect("valid label regex"))
}

fn html_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid tag regex"))
}

/// Strip HTML-like tags and emphasis around speaker labels.
///
/// Tags go first so that a tag split inside a label cannot leave a fresh
/// `**Host:**` behind. Applying this twice gives the same result as once.
pub fn sanitize_script(raw: &str) -> String {
    let without_tags = html_tag().replace_all(raw, "");
    emphasized_label()
        .replace_all(&without_tags, "${1}:")
        .into_owned()
}
