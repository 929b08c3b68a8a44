use once_cell::sync::Lazy;
use regex::Regex;

const MENU_INDICATOR_GLYPHS: [char; 7] = ['❯', '›', '>', '●', '◉', '✓', '✔'];

static YN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\(y/n\)|\[y/n\]").unwrap());

/// What the prompt-detection state machine decided to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// A menu-selection prompt already has "Yes" marked; just confirm it.
    Enter,
    /// A bare `(y/n)`-style prompt; answer affirmatively.
    Yes,
}

impl Response {
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Response::Enter => b"\r",
            Response::Yes => b"y\r",
        }
    }
}

/// Run the prompt-detection heuristic over a quiescent window of cleaned
/// (ANSI-stripped) output. Pure and stateless: the caller owns the 500 ms
/// quiescence timing and the 1-second echo-suppression window.
pub fn evaluate(window: &str) -> Option<Response> {
    let lines: Vec<&str> = window.lines().collect();

    let has_marked_menu_selection = lines.iter().any(|line| {
        line.chars().any(|c| MENU_INDICATOR_GLYPHS.contains(&c))
            && line.to_lowercase().contains("yes")
    });

    if has_marked_menu_selection && looks_like_tui_menu(window) {
        return Some(Response::Enter);
    }

    let last_three = lines.iter().rev().take(3);
    if last_three.clone().any(|line| YN_PATTERN.is_match(line)) {
        return Some(Response::Yes);
    }

    None
}

fn looks_like_tui_menu(window: &str) -> bool {
    const BOX_DRAWING: [char; 6] = ['─', '│', '┌', '┐', '└', '┘'];
    if window.chars().any(|c| BOX_DRAWING.contains(&c)) {
        return true;
    }
    let lower = window.to_lowercase();
    lower.contains("use arrow keys") || lower.contains("press enter") || lower.contains("to select")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marked_menu_selection_inside_tui_frame_sends_enter() {
        let window = "┌─ choose one ─┐\n❯ Yes\n  No\n└───────────────┘\n";
        assert_eq!(evaluate(window), Some(Response::Enter));
    }

    #[test]
    fn marked_glyph_without_tui_context_is_ignored() {
        let window = "❯ Yes, proceed with install\n";
        assert_eq!(evaluate(window), None);
    }

    #[test]
    fn yn_pattern_in_last_three_lines_sends_y() {
        let window = "some earlier log line\nanother line\nOverwrite file? (y/n) ";
        assert_eq!(evaluate(window), Some(Response::Yes));
    }

    #[test]
    fn bracketed_yn_variants_match() {
        assert_eq!(evaluate("Continue? [Y/n]"), Some(Response::Yes));
        assert_eq!(evaluate("Continue? [y/N]"), Some(Response::Yes));
    }

    #[test]
    fn yn_pattern_outside_last_three_lines_is_ignored() {
        let window = "Overwrite file? (y/n)\nline two\nline three\nline four\nline five";
        assert_eq!(evaluate(window), None);
    }

    #[test]
    fn plain_output_triggers_nothing() {
        assert_eq!(evaluate("just regular command output\nno prompts here\n"), None);
    }

    #[test]
    fn response_bytes_match_protocol() {
        assert_eq!(Response::Enter.as_bytes(), b"\r");
        assert_eq!(Response::Yes.as_bytes(), b"y\r");
    }
}
