use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use tokio::fs;

use crate::error::{Error, Result};

const RETENTION: Duration = Duration::from_secs(10 * 24 * 60 * 60);
const ARCHIVE_DIR: &str = "archive";

/// Move a finished session log into `<am_dir>/archive/`.
pub async fn archive_session_log(am_dir: &Path, log_path: &Path) -> Result<()> {
    let archive_dir = am_dir.join(ARCHIVE_DIR);
    fs::create_dir_all(&archive_dir).await.map_err(|source| Error::Io {
        path: archive_dir.display().to_string(),
        source,
    })?;

    let Some(file_name) = log_path.file_name() else {
        return Ok(());
    };
    let destination = archive_dir.join(file_name);

    fs::rename(log_path, &destination)
        .await
        .map_err(|source| Error::Io {
            path: destination.display().to_string(),
            source,
        })?;

    Ok(())
}

/// Delete archived session logs whose modification time is older than the
/// 10-day retention window. Returns the number of files removed.
pub async fn prune_archive(am_dir: &Path) -> Result<usize> {
    let archive_dir = am_dir.join(ARCHIVE_DIR);
    let mut removed = 0;

    let Ok(mut entries) = fs::read_dir(&archive_dir).await else {
        return Ok(0);
    };

    let now = Utc::now();

    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let Ok(metadata) = entry.metadata().await else {
            continue;
        };
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        let modified_utc: chrono::DateTime<Utc> = modified.into();
        let age = now.signed_duration_since(modified_utc);
        let age = age.to_std().unwrap_or(Duration::ZERO);

        if age > RETENTION {
            if fs::remove_file(&path).await.is_ok() {
                removed += 1;
            }
        }
    }

    Ok(removed)
}
