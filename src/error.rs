pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The time format rendered to itself, so the filename would carry no
    /// timestamp at all.
    #[error("time format '{0}' performs no substitution")]
    NoOpTimeFormat(String),
    /// The time format could not be parsed as a strftime string.
    #[error("invalid time format '{0}'")]
    InvalidTimeFormat(String),
    /// A periodic sync task exceeded its error budget and stopped.
    #[error("gave up after {0} log file sync errors")]
    TooManySyncErrors(usize),
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}
