use once_cell::sync::Lazy;
use regex::Regex;

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://[^\s]+").unwrap());
const CONTEXT_WORDS: [&str; 4] = ["oauth", "authorize", "device", "login"];

/// Look for an OAuth/device-login URL in a chunk of cleaned output. Only
/// lines that both contain a URL and mention an auth-flow keyword qualify,
/// so a plain `https://` in command output doesn't get surfaced as a
/// control message on every line.
pub fn detect_auth_url(cleaned_output: &str) -> Option<String> {
    for line in cleaned_output.lines() {
        let lower = line.to_lowercase();
        if !CONTEXT_WORDS.iter().any(|w| lower.contains(w)) {
            continue;
        }
        if let Some(m) = URL_PATTERN.find(line) {
            return Some(m.as_str().trim_end_matches(['.', ',', ')']).to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_device_login_url() {
        let out = "Please visit https://github.com/login/device to authorize this device.\n";
        assert_eq!(
            detect_auth_url(out),
            Some("https://github.com/login/device".to_string())
        );
    }

    #[test]
    fn ignores_unrelated_urls() {
        let out = "see the docs at https://example.com/readme\n";
        assert_eq!(detect_auth_url(out), None);
    }

    #[test]
    fn strips_trailing_punctuation() {
        let out = "oauth authorize: https://example.com/o/authorize.\n";
        assert_eq!(detect_auth_url(out), Some("https://example.com/o/authorize".to_string()));
    }
}
