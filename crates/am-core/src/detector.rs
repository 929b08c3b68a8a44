use crate::model::CommandType;

/// Result of classifying one shell input line. Stateless, deterministic,
/// no side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedCommand {
    pub provider: String,
    pub command_type: CommandType,
    pub initial_prompt: String,
    pub detected: bool,
}

impl DetectedCommand {
    fn not_detected() -> Self {
        Self {
            provider: String::new(),
            command_type: CommandType::Unknown,
            initial_prompt: String::new(),
            detected: false,
        }
    }

    fn interactive(provider: &str) -> Self {
        Self {
            provider: provider.to_string(),
            command_type: CommandType::Chat,
            initial_prompt: String::new(),
            detected: true,
        }
    }

    fn one_shot(provider: &str, command_type: CommandType, prompt: &str) -> Self {
        Self {
            provider: provider.to_string(),
            command_type,
            initial_prompt: unquote(prompt),
            detected: true,
        }
    }
}

/// Strip matched surrounding single or double quotes only.
fn unquote(text: &str) -> String {
    let text = text.trim();
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if (first == b'"' || first == b'\'') && first == last {
            return text[1..text.len() - 1].to_string();
        }
    }
    text.to_string()
}

const GH_COPILOT_PREFIX: &str = "gh copilot ";
const GH_COPILOT_SUGGEST_PREFIX: &str = "gh copilot suggest ";
const GH_COPILOT_EXPLAIN_PREFIX: &str = "gh copilot explain ";

/// Pattern-match one trimmed shell input line and classify provider and
/// command type.
pub fn classify(line: &str) -> DetectedCommand {
    let trimmed = line.trim();

    match trimmed {
        "copilot" => return DetectedCommand::interactive("github-copilot"),
        "claude" => return DetectedCommand::interactive("claude"),
        "aider" => return DetectedCommand::interactive("aider"),
        _ => {}
    }

    if let Some(rest) = trimmed.strip_prefix(GH_COPILOT_SUGGEST_PREFIX) {
        if !rest.trim().is_empty() {
            return DetectedCommand::one_shot("github-copilot", CommandType::Suggest, rest);
        }
    }
    if let Some(rest) = trimmed.strip_prefix(GH_COPILOT_EXPLAIN_PREFIX) {
        if !rest.trim().is_empty() {
            return DetectedCommand::one_shot("github-copilot", CommandType::Explain, rest);
        }
    }
    if let Some(rest) = trimmed.strip_prefix(GH_COPILOT_PREFIX) {
        if !rest.trim().is_empty() {
            return DetectedCommand::one_shot("github-copilot", CommandType::Suggest, rest);
        }
    }

    if let Some(rest) = trimmed.strip_prefix("claude ") {
        if !rest.trim().is_empty() {
            return DetectedCommand::one_shot("claude", CommandType::Chat, rest);
        }
    }

    if let Some(rest) = trimmed.strip_prefix("aider ") {
        if !rest.trim().is_empty() {
            return DetectedCommand::one_shot("aider", CommandType::Chat, rest);
        }
    }

    DetectedCommand::not_detected()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_copilot_is_interactive_chat() {
        let d = classify("copilot");
        assert!(d.detected);
        assert_eq!(d.provider, "github-copilot");
        assert_eq!(d.command_type, CommandType::Chat);
        assert_eq!(d.initial_prompt, "");
    }

    #[test]
    fn bare_claude_is_interactive_chat() {
        let d = classify("  claude  ");
        assert!(d.detected);
        assert_eq!(d.provider, "claude");
        assert_eq!(d.command_type, CommandType::Chat);
    }

    #[test]
    fn gh_copilot_suggest_extracts_and_unquotes() {
        let d = classify(r#"gh copilot suggest "list all docker containers""#);
        assert!(d.detected);
        assert_eq!(d.command_type, CommandType::Suggest);
        assert_eq!(d.initial_prompt, "list all docker containers");
    }

    #[test]
    fn gh_copilot_explain_extracts_text() {
        let d = classify("gh copilot explain 'tar -xzf archive.tar.gz'");
        assert!(d.detected);
        assert_eq!(d.command_type, CommandType::Explain);
        assert_eq!(d.initial_prompt, "tar -xzf archive.tar.gz");
    }

    #[test]
    fn bare_gh_copilot_text_is_legacy_suggest() {
        let d = classify("gh copilot fix my git history");
        assert!(d.detected);
        assert_eq!(d.command_type, CommandType::Suggest);
        assert_eq!(d.initial_prompt, "fix my git history");
    }

    #[test]
    fn claude_one_shot_extracts_text() {
        let d = classify("claude explain this regex");
        assert!(d.detected);
        assert_eq!(d.provider, "claude");
        assert_eq!(d.initial_prompt, "explain this regex");
    }

    #[test]
    fn aider_forms_are_detected() {
        assert!(classify("aider").detected);
        let d = classify("aider refactor main.py");
        assert!(d.detected);
        assert_eq!(d.provider, "aider");
        assert_eq!(d.initial_prompt, "refactor main.py");
    }

    #[test]
    fn unrelated_line_is_not_detected() {
        let d = classify("ls -la");
        assert!(!d.detected);
        assert_eq!(d.provider, "");
    }

    #[test]
    fn empty_line_is_not_detected() {
        assert!(!classify("").detected);
        assert!(!classify("   ").detected);
    }
}
