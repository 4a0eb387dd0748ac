use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{select, tick};

use crate::cancel::CancelToken;
use crate::config::FANLOG_CONFIG;
use crate::error::Error;
use crate::file::LogHandle;

/// Maximum flush errors one sync task tolerates before giving up.
pub const MAX_SYNC_ERRORS: usize = 10_000;

static SYNC_ERROR_ACCOUNTING: AtomicBool = AtomicBool::new(true);

/// Enables storing flush errors and giving up past [`MAX_SYNC_ERRORS`] for
/// every running and future sync task. Enabled by default.
pub fn enable_sync_error_accounting() {
    SYNC_ERROR_ACCOUNTING.store(true, Ordering::SeqCst);
}

/// Disables flush-error accounting; failed flushes are silently dropped.
pub fn disable_sync_error_accounting() {
    SYNC_ERROR_ACCOUNTING.store(false, Ordering::SeqCst);
}

fn sync_error_accounting_enabled() -> bool {
    SYNC_ERROR_ACCOUNTING.load(Ordering::SeqCst)
}

/// Flush errors recorded by one sync task.
struct SyncErrorLog {
    errors: Vec<io::Error>,
}

impl SyncErrorLog {
    fn new() -> Self {
        Self { errors: Vec::new() }
    }

    fn record(&mut self, error: io::Error, enabled: bool) -> Result<(), Error> {
        if !enabled {
            return Ok(());
        }
        self.errors.push(error);
        if self.errors.len() > MAX_SYNC_ERRORS {
            return Err(Error::TooManySyncErrors(self.errors.len()));
        }
        Ok(())
    }
}

/// Handle to a background periodic-sync task.
pub struct SyncTask {
    gave_up: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<Result<(), Error>>>>,
}

impl SyncTask {
    /// Non-blocking probe: true once the task has stopped because its error
    /// budget was exceeded.
    pub fn has_given_up(&self) -> bool {
        self.gave_up.load(Ordering::SeqCst)
    }

    /// Blocks until the task exits, returning [`Error::TooManySyncErrors`] if
    /// it gave up. Returns `Ok(())` on a second call.
    pub fn join(&self) -> Result<(), Error> {
        let Some(handle) = self.handle.lock().unwrap().take() else {
            return Ok(());
        };
        handle.join().expect("unable to join sync task")
    }
}

/// Launches a background task that flushes `handle` to durable storage every
/// `interval` until `token` fires.
///
/// Flush failures are accounted per task while the global accounting flag is
/// enabled; past [`MAX_SYNC_ERRORS`] the task stops and reports
/// [`Error::TooManySyncErrors`] through the returned [`SyncTask`].
pub fn start_periodic_sync(
    token: &CancelToken,
    handle: &LogHandle,
    interval: Duration,
) -> SyncTask {
    let token = token.clone();
    let file = handle.clone();
    let gave_up = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&gave_up);
    let thread = std::thread::spawn(move || {
        let done = token.done();
        let ticker = tick(interval);
        let mut errors = SyncErrorLog::new();
        loop {
            select! {
                recv(done) -> _ => return Ok(()),
                recv(ticker) -> _ => {
                    if token.is_cancelled() {
                        return Ok(());
                    }
                    if let Err(error) = file.sync()
                        && let Err(terminal) =
                            errors.record(error, sync_error_accounting_enabled())
                    {
                        flag.store(true, Ordering::SeqCst);
                        return Err(terminal);
                    }
                }
            }
        }
    });
    SyncTask {
        gave_up,
        handle: Mutex::new(Some(thread)),
    }
}

/// [`start_periodic_sync`] with the interval taken from `FANLOG_SYNC_INTERVAL_MS`
/// (default 1000).
pub fn start_periodic_sync_default(token: &CancelToken, handle: &LogHandle) -> SyncTask {
    start_periodic_sync(
        token,
        handle,
        Duration::from_millis(FANLOG_CONFIG.SYNC_INTERVAL_MS),
    )
}
