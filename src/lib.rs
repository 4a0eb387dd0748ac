//! # fanlog
//! Fan-out logger with a line-oriented facade and a structured facade over one
//! shared writer set, plus helpers for date-stamped log files and periodic
//! durable sync.
//!
//! ## Usage
//! ```rust
//! let log = fanlog::new_quiet_logger(Vec::new());
//! log.c().set_prefix("app");
//! log.c().info("hello, world");
//! log.z().info().str("who", "world").msg("hello");
//! ```
//!
//! ## Logging to dated files
//! Log files are created with a timestamped name and can be registered with a
//! periodic sync task. Both the file watcher and the sync task stop when the
//! cancellation token fires.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use fanlog::{CancelToken, create_dated_log_file_with_token, start_periodic_sync};
//!
//! let token = CancelToken::new();
//! let dir = std::env::temp_dir();
//! let file = create_dated_log_file_with_token(&token, &dir, "app").unwrap();
//! let sync = start_periodic_sync(&token, &file, Duration::from_millis(100));
//!
//! let log = fanlog::new_quiet_logger(vec![Box::new(file.clone())]);
//! log.z().info().msg("hello");
//!
//! token.cancel();
//! sync.join().unwrap();
//! ```
//!
//! ## Global access
//! One logger can be published process-wide and fetched from anywhere. The
//! slot is empty until set; there is no initialization on first use.
//!
//! ```rust
//! let log = fanlog::new_quiet_logger(Vec::new()).with_global_access();
//! let same = fanlog::global().expect("set above");
//! same.c().info("from the global slot");
//! ```

mod cancel;
mod config;
mod error;
mod file;
mod logger;
mod sink;
mod sync;

pub use cancel::CancelToken;
pub use config::{FANLOG_CONFIG, FanlogConfig};
pub use error::{Error, Result};
pub use file::{
    LogHandle, create_dated_log_file, create_dated_log_file_formatted,
    create_dated_log_file_formatted_with_token, create_dated_log_file_with_token,
};
pub use logger::{
    Event, LineLogger, Logger, ZLogger, global, new_logger, new_logger_no_color, new_quiet_logger,
};
pub use sink::{ConsoleSink, Record, Sink, WriterSink};
pub use sync::{
    MAX_SYNC_ERRORS, SyncTask, disable_sync_error_accounting, enable_sync_error_accounting,
    start_periodic_sync, start_periodic_sync_default,
};
