pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, FlushPolicy, ScanMode, WriteMode};
pub use error::TermWatchError;
pub use types::*;
