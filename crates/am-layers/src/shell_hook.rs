use std::path::{Path, PathBuf};
use std::time::Duration;

use am_core::{EventBus, EventKind, LayerEvent, LAYER_SHELL_HOOK};
use chrono::Utc;
use tokio::fs;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

const BEGIN_MARKER: &str = "# >>> am-hook BEGIN >>>";
const END_MARKER: &str = "# <<< am-hook END <<<";
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
    PowerShell,
}

impl Shell {
    fn rc_candidates(self) -> Vec<&'static str> {
        match self {
            Shell::Bash => vec![".bashrc", ".bash_profile"],
            Shell::Zsh => vec![".zshrc"],
            Shell::PowerShell => vec![],
        }
    }
}

pub struct AppliedHook {
    pub target_path: PathBuf,
    pub backup_path: PathBuf,
}

/// Alive-signal ticker for layer 2, plus the installer contract: generate,
/// preview, apply, and remove the shell hook snippet.
pub struct ShellHookLayer {
    bus: EventBus,
}

impl ShellHookLayer {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    pub fn spawn(self, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.bus
                .publish(LayerEvent::new(EventKind::Heartbeat, LAYER_SHELL_HOOK));

            let mut ticker = tokio::time::interval(HEARTBEAT_INTERVAL);
            ticker.tick().await; // consume the immediate first tick

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::info!("shell hook heartbeat shutting down");
                        return;
                    }
                    _ = ticker.tick() => {
                        self.bus.publish(LayerEvent::new(EventKind::Heartbeat, LAYER_SHELL_HOOK));
                    }
                }
            }
        })
    }

    /// Publish a heartbeat as a side effect of an incoming hook ping over
    /// the external API.
    pub fn record_ping(&self) {
        self.bus
            .publish(LayerEvent::new(EventKind::Heartbeat, LAYER_SHELL_HOOK));
    }
}

/// Exact lines to append for the given shell, bounded by BEGIN/END markers.
pub fn snippet(shell: Shell) -> String {
    match shell {
        Shell::Bash | Shell::Zsh => format!(
            "{begin}\n\
             export AM_HOOK_ENABLED=1\n\
             am_hook_ping() {{ curl -s -X POST http://127.0.0.1:4000/api/am/hook -d \"$1\" >/dev/null 2>&1 & }}\n\
             PROMPT_COMMAND=\"am_hook_ping \\\"\\$(history 1)\\\"; ${{PROMPT_COMMAND:-}}\"\n\
             {end}\n",
            begin = BEGIN_MARKER,
            end = END_MARKER,
        ),
        Shell::PowerShell => format!(
            "{begin}\n\
             $env:AM_HOOK_ENABLED = \"1\"\n\
             function Invoke-AmHookPing {{ param($cmd) Invoke-RestMethod -Method Post -Uri http://127.0.0.1:4000/api/am/hook -Body $cmd | Out-Null }}\n\
             {end}\n",
            begin = BEGIN_MARKER,
            end = END_MARKER,
        ),
    }
}

fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(Error::NoHomeDir)
}

fn target_rc_path(shell: Shell) -> Result<PathBuf> {
    let home = home_dir()?;
    match shell {
        Shell::Bash => Ok(home.join(".bashrc")),
        Shell::Zsh => Ok(home.join(".zshrc")),
        Shell::PowerShell => Ok(home.join(".config/powershell/Microsoft.PowerShell_profile.ps1")),
    }
}

fn backup_path_for(target: &Path) -> PathBuf {
    let stamp = Utc::now().format("%Y%m%dT%H%M%S");
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    target.with_file_name(format!("{file_name}.forge-backup-{stamp}"))
}

/// Locate the rc file by platform convention; back it up, append the
/// snippet, and publish HOOK_INSTALLED.
pub async fn apply(bus: &EventBus, shell: Shell) -> Result<AppliedHook> {
    let target_path = target_rc_path(shell)?;
    let backup_path = backup_path_for(&target_path);

    let existing = match fs::read_to_string(&target_path).await {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(source) => {
            return Err(Error::Io {
                path: target_path.clone(),
                source,
            })
        }
    };

    if !existing.is_empty() {
        fs::write(&backup_path, &existing)
            .await
            .map_err(|source| Error::Io {
                path: backup_path.clone(),
                source,
            })?;
    }

    let mut updated = existing;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(&snippet(shell));

    write_atomic(&target_path, &updated).await?;

    bus.publish(LayerEvent::new(EventKind::HookInstalled, LAYER_SHELL_HOOK));

    Ok(AppliedHook {
        target_path,
        backup_path,
    })
}

/// Return the snippet without touching the filesystem.
pub fn preview(shell: Shell) -> String {
    snippet(shell)
}

/// For each candidate rc file containing the BEGIN marker, back it up and
/// rewrite with only the content outside BEGIN/END. Returns the changed
/// file paths.
pub async fn remove() -> Result<Vec<PathBuf>> {
    let home = home_dir()?;
    let mut changed = Vec::new();

    for shell in [Shell::Bash, Shell::Zsh] {
        for candidate in shell.rc_candidates() {
            let path = home.join(candidate);
            let Ok(contents) = fs::read_to_string(&path).await else {
                continue;
            };
            if !contents.contains(BEGIN_MARKER) {
                continue;
            }

            let backup_path = backup_path_for(&path);
            fs::write(&backup_path, &contents)
                .await
                .map_err(|source| Error::Io {
                    path: backup_path.clone(),
                    source,
                })?;

            let stripped = strip_between_markers(&contents);
            write_atomic(&path, &stripped).await?;
            changed.push(path);
        }
    }

    Ok(changed)
}

fn strip_between_markers(contents: &str) -> String {
    let Some(begin_idx) = contents.find(BEGIN_MARKER) else {
        return contents.to_string();
    };
    let Some(end_idx) = contents.find(END_MARKER) else {
        return contents.to_string();
    };
    let after_end = end_idx + END_MARKER.len();
    let tail_start = contents[after_end..]
        .find('\n')
        .map(|offset| after_end + offset + 1)
        .unwrap_or(contents.len());

    let mut result = String::new();
    result.push_str(&contents[..begin_idx]);
    result.push_str(&contents[tail_start..]);
    result
}

/// Copy `backup_path` back over `target_path` verbatim, byte-for-byte.
/// Never partially writes: the whole backup is read into memory first.
pub async fn restore_from_backup(backup_path: &Path, target_path: &Path) -> Result<()> {
    let bytes = fs::read(backup_path).await.map_err(|source| Error::Io {
        path: backup_path.to_path_buf(),
        source,
    })?;

    let tmp_path = target_path.with_extension("am-restore.tmp");
    fs::write(&tmp_path, &bytes).await.map_err(|source| Error::Io {
        path: tmp_path.clone(),
        source,
    })?;
    fs::rename(&tmp_path, target_path)
        .await
        .map_err(|source| Error::Io {
            path: target_path.to_path_buf(),
            source,
        })?;

    Ok(())
}

async fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp_path = path.with_extension("am-hook.tmp");
    fs::write(&tmp_path, contents).await.map_err(|source| Error::Io {
        path: tmp_path.clone(),
        source,
    })?;
    fs::rename(&tmp_path, path).await.map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn snippet_is_bounded_by_markers() {
        let s = snippet(Shell::Bash);
        assert!(s.starts_with(BEGIN_MARKER));
        assert!(s.trim_end().ends_with(END_MARKER));
    }

    #[test]
    fn strip_between_markers_removes_only_the_hook_block() {
        let contents = format!(
            "export PATH=/usr/bin\n{begin}\nam stuff\n{end}\nexport EDITOR=vim\n",
            begin = BEGIN_MARKER,
            end = END_MARKER,
        );
        let stripped = strip_between_markers(&contents);
        assert_eq!(stripped, "export PATH=/usr/bin\nexport EDITOR=vim\n");
    }

    #[test]
    fn strip_between_markers_is_noop_without_markers() {
        let contents = "export PATH=/usr/bin\n".to_string();
        assert_eq!(strip_between_markers(&contents), contents);
    }

    #[tokio::test]
    async fn restore_from_backup_round_trips_bytes() {
        let dir = tempdir().unwrap();
        let backup = dir.path().join("rc.bak");
        let target = dir.path().join("rc");

        fs::write(&backup, b"original contents\n").await.unwrap();
        fs::write(&target, b"mutated contents\n").await.unwrap();

        restore_from_backup(&backup, &target).await.unwrap();

        let restored = fs::read(&target).await.unwrap();
        assert_eq!(restored, b"original contents\n");
    }

    #[tokio::test]
    async fn restore_from_backup_errors_on_missing_backup() {
        let dir = tempdir().unwrap();
        let backup = dir.path().join("missing.bak");
        let target = dir.path().join("rc");
        fs::write(&target, b"x").await.unwrap();

        let result = restore_from_backup(&backup, &target).await;
        assert!(result.is_err());
    }
}
