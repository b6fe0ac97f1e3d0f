use std::io;
use thiserror::Error;

/// Conditions that stop a run. Malformed DNS payloads are not in here,
/// they are reported per record and never abort the stream.
#[derive(Error, Debug)]
pub enum Error {
    /// The envelope does not follow the dnstap schema (missing or unknown
    /// message type, undecodable protobuf, ...).
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// The Frame Streams container is malformed or truncated.
    #[error("frame corruption: {0}")]
    FrameCorruption(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Returns early with a `std::io::Error` of the given kind.
#[macro_export]
macro_rules! bail {
    ($kind:ident, $($arg:tt)*) => {{
        return Err(std::io::Error::new(
            std::io::ErrorKind::$kind,
            format!($($arg)*),
        ));
    }};
}
