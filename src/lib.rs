//! Runs the system `ping` utility against one destination and turns its text
//! output into a structured [`PingOutcome`].

pub mod command;
pub mod config;
pub mod error;
pub mod parser;
pub mod ping;
pub mod ping_executor;

pub use command::{PingCommand, build};
pub use config::AppConfig;
pub use error::{PingError, RequestError, RunError};
pub use parser::parse;
pub use ping::{AddressFamily, PingOutcome, PingParams, PingRequest, PingStatistics, Source, Status};
pub use ping_executor::{CommandRunner, PingExecutor, ProcessOutput, SystemRunner};
