use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no home directory could be determined")]
    NoHomeDir,
    #[error("rc file not found for shell: {0}")]
    RcFileNotFound(String),
    #[error("hook markers not found in {0}")]
    MarkersNotFound(PathBuf),
    #[error("filesystem watch failed: {0}")]
    Watch(#[from] notify::Error),
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
