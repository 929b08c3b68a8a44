use once_cell_regex::footer_regex;

use crate::ansi::{collapse_trailing_crlf, strip_ansi};

const CLEAR_SCREEN_SEQ: &str = "\x1b[2J";

/// Strip ANSI CSI/OSC/charset/keypad/cursor-save/line-op sequences and
/// control bytes except `\t\r\n` from raw user keystrokes. Collapses
/// trailing CR/LF pairs. Empty result returns empty string.
pub fn clean_user_input(raw: &str) -> String {
    let stripped = strip_ansi(raw).cleaned;
    collapse_trailing_crlf(&stripped).trim_matches(|c| c == '\0').to_string()
}

fn collapse_spinner_lines(s: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut prev: Option<&str> = None;
    for line in s.lines() {
        if Some(line) == prev {
            continue;
        }
        out.push(line);
        prev = Some(line);
    }
    out.join("\n")
}

fn is_noise_line(line: &str, provider: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }
    if trimmed.eq_ignore_ascii_case("ctrl+c exit") {
        return true;
    }
    if remaining_requests_regex().is_match(trimmed) {
        return true;
    }
    footer_regex(provider).is_match(trimmed)
}

fn remaining_requests_regex() -> &'static regex::Regex {
    static RE: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    RE.get_or_init(|| regex::Regex::new(r"(?i)^remaining requests:\s*\d+%?$").unwrap())
}

fn last_non_empty_line(s: &str) -> Option<&str> {
    s.lines().rev().find(|l| !l.trim().is_empty())
}

/// Parse raw assistant PTY output into cleaned text plus a confidence score
/// in `[0.0, 1.0]`. Handles full-screen redraws, cursor-jump reordering
/// artifacts left behind as stray control codes, and spinner-frame repeats.
pub fn parse_assistant_output(raw: &str, provider: &str) -> (String, f32) {
    let mut confidence: f32 = 1.0;

    let had_clear_screen = raw.contains(CLEAR_SCREEN_SEQ);
    let effective_raw = if had_clear_screen {
        confidence *= 0.6;
        match raw.rfind(CLEAR_SCREEN_SEQ) {
            Some(idx) => &raw[idx + CLEAR_SCREEN_SEQ.len()..],
            None => raw,
        }
    } else {
        raw
    };

    let stripped = strip_ansi(effective_raw);
    if stripped.ansi_ratio() > 0.3 {
        confidence *= 0.8;
    }

    let collapsed = collapse_spinner_lines(&stripped.cleaned);

    let footer_was_last_line = last_non_empty_line(&collapsed)
        .map(|line| is_noise_line(line, provider))
        .unwrap_or(false);

    let denoised: String = collapsed
        .lines()
        .filter(|line| !is_noise_line(line, provider))
        .collect::<Vec<_>>()
        .join("\n");

    let trimmed = denoised.trim();
    if trimmed.is_empty() {
        return (String::new(), 0.0);
    }

    if trimmed.chars().count() < 20 {
        confidence *= 0.7;
    }
    if footer_was_last_line {
        confidence *= 0.9;
    }

    (trimmed.to_string(), confidence.clamp(0.0, 1.0))
}

mod once_cell_regex {
    //! Provider-known footer patterns, lazily compiled once per provider.
    use once_cell::sync::Lazy;
    use regex::Regex;

    static GENERIC_FOOTER: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)^(tokens used|model:|context left|press .* to).*$").unwrap());
    static CLAUDE_FOOTER: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)^(claude (sonnet|opus|haiku)|\? for shortcuts).*$").unwrap());
    static COPILOT_FOOTER: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)^(copilot|esc to cancel|ctrl\+c to exit).*$").unwrap());

    pub fn footer_regex(provider: &str) -> &'static Regex {
        match provider {
            "claude" => &CLAUDE_FOOTER,
            "github-copilot" => &COPILOT_FOOTER,
            _ => &GENERIC_FOOTER,
        }
    }
}
