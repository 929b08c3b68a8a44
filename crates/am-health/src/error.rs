#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// One conversation file failed content validation; the reason is
    /// appended verbatim to `ValidationReport::errors`.
    #[error("{0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
