use once_cell::sync::Lazy;
use regex::Regex;

/// How many trailing non-empty lines of recent output are scanned for a
/// prompt shape. Prompts are short; scanning more wastes cycles on TUI
/// frames that never contain one.
const SCAN_LINES: usize = 6;

static POWERSHELL_PROMPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^PS ([A-Za-z]:\\[^>]*)>\s*$").unwrap());
static CMD_PROMPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Za-z]:\\[^>]*)>\s*$").unwrap());
static BASH_PROMPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.-]+@[\w.-]+:([^$#]+)[$#]\s*$").unwrap());
static SHORT_PROMPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(~[^$]*)\$\s*$").unwrap());

/// Scan the last handful of non-empty lines of cleaned (ANSI-stripped)
/// output for a known prompt shape and return the directory it names.
pub fn detect_cwd(cleaned_output: &str) -> Option<String> {
    let lines: Vec<&str> = cleaned_output
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .collect();

    for line in lines.iter().rev().take(SCAN_LINES) {
        let trimmed = line.trim();
        if let Some(caps) = POWERSHELL_PROMPT.captures(trimmed) {
            return Some(caps[1].to_string());
        }
        if let Some(caps) = CMD_PROMPT.captures(trimmed) {
            return Some(caps[1].to_string());
        }
        if let Some(caps) = BASH_PROMPT.captures(trimmed) {
            return Some(caps[1].trim().to_string());
        }
        if let Some(caps) = SHORT_PROMPT.captures(trimmed) {
            return Some(caps[1].to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_powershell_prompt() {
        assert_eq!(detect_cwd("PS C:\\Users\\dev>"), Some("C:\\Users\\dev".to_string()));
    }

    #[test]
    fn detects_cmd_prompt() {
        assert_eq!(detect_cwd("C:\\proj>"), Some("C:\\proj".to_string()));
    }

    #[test]
    fn detects_bash_prompt() {
        assert_eq!(
            detect_cwd("dev@host:/home/dev/proj$"),
            Some("/home/dev/proj".to_string())
        );
    }

    #[test]
    fn detects_bash_root_prompt_with_hash() {
        assert_eq!(detect_cwd("root@host:/etc#"), Some("/etc".to_string()));
    }

    #[test]
    fn detects_short_tilde_prompt() {
        assert_eq!(detect_cwd("~/proj$"), Some("~/proj".to_string()));
    }

    #[test]
    fn scans_last_lines_ignoring_blanks() {
        let output = "some tui frame\n\n\ndev@host:/tmp$\n";
        assert_eq!(detect_cwd(output), Some("/tmp".to_string()));
    }

    #[test]
    fn no_prompt_found_returns_none() {
        assert_eq!(detect_cwd("just some random output\nwith no prompt shape\n"), None);
    }
}
