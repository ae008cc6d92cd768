use std::time::Duration;

use thiserror::Error;

/// Rejections raised while validating caller parameters, before any process runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    #[error("Missing required parameter 'dest'")]
    MissingDestination,

    #[error("Destination must not be empty")]
    EmptyDestination,

    #[error("Invalid destination '{0}': must be a single token not starting with '-'")]
    InvalidDestination(String),

    #[error("Invalid count {0}: must be between 0 and {max}", max = u32::MAX)]
    InvalidCount(i64),

    #[error("Invalid packet_size {0}: must be between 0 and {max}", max = u32::MAX)]
    InvalidPacketSize(i64),

    #[error("Invalid interval {0}: must be a finite number of seconds >= 0")]
    InvalidInterval(f64),

    #[error("Parameters 'v4' and 'v6' are mutually exclusive")]
    ConflictingAddressFamily,

    #[error("Parameters 'interface_name' and 'interface_ip' are mutually exclusive")]
    ConflictingSource,
}

/// Failures of the process runner. These never escape the executor; they are
/// folded into the outcome's status.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Timed out after {0:?}")]
    TimedOut(Duration),
}

#[derive(Error, Debug)]
pub enum PingError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}
