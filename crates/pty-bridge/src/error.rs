use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to open pty: {0}")]
    Pty(String),

    #[error("failed to spawn shell: {0}")]
    Spawn(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
