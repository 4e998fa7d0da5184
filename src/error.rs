use thiserror::Error;

/// Crate-wide error type.
///
/// `BufferFull` is the only variant callers are expected to recover from
/// (retry or abandon, per the buffer manager's contract); everything else
/// indicates a programmer error or an I/O failure this design has no
/// recovery strategy for (recovery would require a WAL, which is out of
/// scope).
#[derive(Error, Debug)]
pub enum DbError {
    #[error("buffer pool is full: all {0} resident frames are pinned")]
    BufferFull(usize),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type DbResult<T> = Result<T, DbError>;
