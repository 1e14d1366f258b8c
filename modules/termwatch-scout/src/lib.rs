pub mod dedup;
pub mod matcher;
pub mod reddit_source;
pub mod report;
pub mod run_log;
pub mod scanner;
pub mod scheduler;
pub mod splitter;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
