use portable_pty::CommandBuilder;
use serde::Deserialize;

/// Which shell to launch inside the PTY, chosen from the WebSocket
/// connection's query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shell {
    PowerShell,
    Cmd,
    Wsl { distro: Option<String>, home: Option<String> },
    Bash,
}

impl Shell {
    /// Platform-appropriate default when the query string omits `shell`.
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Shell::Cmd
        } else {
            Shell::Bash
        }
    }

    pub fn from_query(shell: Option<&str>, distro: Option<&str>, home: Option<&str>) -> Self {
        match shell {
            Some("powershell") => Shell::PowerShell,
            Some("cmd") => Shell::Cmd,
            Some("wsl") => Shell::Wsl {
                distro: distro.map(str::to_string),
                home: home.map(str::to_string),
            },
            _ => Self::platform_default(),
        }
    }

    pub fn command(&self) -> CommandBuilder {
        match self {
            Shell::PowerShell => CommandBuilder::new("powershell.exe"),
            Shell::Cmd => CommandBuilder::new("cmd.exe"),
            Shell::Wsl { distro, home } => {
                let mut cmd = CommandBuilder::new("wsl.exe");
                if let Some(distro) = distro {
                    cmd.arg("-d");
                    cmd.arg(distro);
                }
                if let Some(home) = home {
                    cmd.arg("--cd");
                    cmd.arg(home);
                }
                cmd
            }
            Shell::Bash => {
                let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/bash".to_string());
                CommandBuilder::new(shell)
            }
        }
    }

    /// The `cd <dir>\r` line to replay after a reconnect, shell-quoted the
    /// way that shell expects.
    pub fn cd_command(&self, dir: &str) -> String {
        match self {
            Shell::Cmd => format!("cd /d \"{dir}\"\r"),
            Shell::PowerShell => format!("cd \"{dir}\"\r"),
            Shell::Wsl { .. } | Shell::Bash => {
                let escaped = dir.replace(' ', "\\ ");
                format!("cd {escaped}\r")
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TerminalQuery {
    pub shell: Option<String>,
    pub distro: Option<String>,
    pub home: Option<String>,
    pub workdir: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_shell_wins_over_default() {
        assert_eq!(Shell::from_query(Some("powershell"), None, None), Shell::PowerShell);
        assert_eq!(Shell::from_query(Some("cmd"), None, None), Shell::Cmd);
    }

    #[test]
    fn wsl_carries_distro_and_home() {
        let shell = Shell::from_query(Some("wsl"), Some("Ubuntu"), Some("/home/u"));
        assert_eq!(
            shell,
            Shell::Wsl {
                distro: Some("Ubuntu".to_string()),
                home: Some("/home/u".to_string())
            }
        );
    }

    #[test]
    fn unknown_shell_falls_back_to_platform_default() {
        assert_eq!(Shell::from_query(Some("bogus"), None, None), Shell::platform_default());
    }

    #[test]
    fn cd_command_is_quoted_per_shell() {
        assert_eq!(Shell::Cmd.cd_command("C:\\proj"), "cd /d \"C:\\proj\"\r");
        assert_eq!(Shell::PowerShell.cd_command("C:\\proj"), "cd \"C:\\proj\"\r");
        assert_eq!(Shell::Bash.cd_command("/home/u/my project"), "cd /home/u/my\\ project\r");
    }
}
