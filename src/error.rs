use thiserror::Error;

#[derive(Error, Debug)]
pub enum CartridgeError {
    #[error("unsupported mapper: {0}")]
    UnsupportedMapper(u16),
}

/// Failures while encoding or applying a save state.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("snapshot {field} length {found} does not match {expected}")]
    Geometry {
        field: &'static str,
        found: usize,
        expected: usize,
    },
}
