use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Local;
use chrono::format::{Item, StrftimeItems};

use crate::cancel::CancelToken;
use crate::error::{Error, Result};

/// Cloneable handle to one open log file.
///
/// Every clone shares the same underlying file. After [`LogHandle::close`]
/// fires (explicitly or through a cancellation watcher), writes and syncs on
/// every clone fail with an I/O error.
#[derive(Clone, Debug)]
pub struct LogHandle {
    path: PathBuf,
    file: Arc<Mutex<Option<File>>>,
}

impl LogHandle {
    fn open(path: PathBuf) -> Result<Self> {
        let file = File::create(&path)?;
        Ok(Self {
            path,
            file: Arc::new(Mutex::new(Some(file))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.file.lock().unwrap().is_none()
    }

    /// Closes the file. Idempotent; later writes and syncs fail.
    pub fn close(&self) {
        self.file.lock().unwrap().take();
    }

    /// Flushes buffered writes to durable storage.
    pub fn sync(&self) -> io::Result<()> {
        match &*self.file.lock().unwrap() {
            Some(file) => file.sync_all(),
            None => Err(closed_error(&self.path)),
        }
    }
}

fn closed_error(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::BrokenPipe,
        format!("log file {} is closed", path.display()),
    )
}

impl Write for LogHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut *self.file.lock().unwrap() {
            Some(file) => file.write(buf),
            None => Err(closed_error(&self.path)),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut *self.file.lock().unwrap() {
            Some(file) => file.flush(),
            None => Err(closed_error(&self.path)),
        }
    }
}

/// Renders the filename suffix: decimal unix milliseconds by default, or the
/// given strftime format against current local time. A format that renders
/// to itself carries no timestamp and is rejected before any I/O.
fn dated_suffix(format: Option<&str>) -> Result<String> {
    let now = Local::now();
    let Some(format) = format else {
        return Ok(now.timestamp_millis().to_string());
    };
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(Error::InvalidTimeFormat(format.to_string()));
    }
    let rendered = now.format_with_items(items.iter()).to_string();
    if rendered == format {
        return Err(Error::NoOpTimeFormat(format.to_string()));
    }
    Ok(rendered)
}

fn create_dated(
    token: Option<&CancelToken>,
    directory: &Path,
    prefix: &str,
    format: Option<&str>,
) -> Result<LogHandle> {
    let suffix = dated_suffix(format)?;
    let path = directory.join(format!("{prefix}-{suffix}.log"));
    let handle = LogHandle::open(path)?;
    if let Some(token) = token {
        let token = token.clone();
        let watched = handle.clone();
        std::thread::spawn(move || {
            token.wait();
            watched.close();
        });
    }
    Ok(handle)
}

/// Creates (truncating) `<directory>/<prefix>-<unix-millis>.log`.
pub fn create_dated_log_file(directory: impl AsRef<Path>, prefix: &str) -> Result<LogHandle> {
    create_dated(None, directory.as_ref(), prefix, None)
}

/// Creates (truncating) `<directory>/<prefix>-<formatted-time>.log`, with
/// `format` rendered as a strftime string against current local time.
pub fn create_dated_log_file_formatted(
    directory: impl AsRef<Path>,
    prefix: &str,
    format: &str,
) -> Result<LogHandle> {
    create_dated(None, directory.as_ref(), prefix, Some(format))
}

/// Like [`create_dated_log_file`], plus a background watcher that closes the
/// file when `token` fires.
pub fn create_dated_log_file_with_token(
    token: &CancelToken,
    directory: impl AsRef<Path>,
    prefix: &str,
) -> Result<LogHandle> {
    create_dated(Some(token), directory.as_ref(), prefix, None)
}

/// Like [`create_dated_log_file_formatted`], plus a background watcher that
/// closes the file when `token` fires.
pub fn create_dated_log_file_formatted_with_token(
    token: &CancelToken,
    directory: impl AsRef<Path>,
    prefix: &str,
    format: &str,
) -> Result<LogHandle> {
    create_dated(Some(token), directory.as_ref(), prefix, Some(format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fanlog-file-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn default_name_is_prefix_dash_millis() {
        let dir = temp_dir("default-name");
        let handle = create_dated_log_file(&dir, "app").unwrap();
        let name = handle.path().file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("app-"), "name: {name}");
        assert!(name.ends_with(".log"), "name: {name}");
        let suffix = &name["app-".len()..name.len() - ".log".len()];
        suffix.parse::<i64>().expect("suffix must be decimal millis");
        assert_eq!(handle.path().parent().unwrap(), dir.as_path());
        assert!(handle.path().exists());
    }

    #[test]
    fn formatted_name_uses_rendered_time() {
        let dir = temp_dir("formatted-name");
        let handle = create_dated_log_file_formatted(&dir, "app", "%Y-%m-%d").unwrap();
        let name = handle.path().file_name().unwrap().to_str().unwrap();
        let today = Local::now().format("%Y-%m-%d").to_string();
        assert_eq!(name, format!("app-{today}.log"));
    }

    #[test]
    fn no_op_format_is_rejected_before_io() {
        let dir = temp_dir("noop-format");
        let err = create_dated_log_file_formatted(&dir, "app", "plain").unwrap_err();
        assert!(matches!(err, Error::NoOpTimeFormat(_)), "err: {err}");
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn unparseable_format_is_rejected_before_io() {
        let dir = temp_dir("bad-format");
        let err = create_dated_log_file_formatted(&dir, "app", "%Y-%").unwrap_err();
        assert!(matches!(err, Error::InvalidTimeFormat(_)), "err: {err}");
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn missing_directory_propagates_io_error() {
        let dir = temp_dir("missing").join("nope");
        let err = create_dated_log_file(&dir, "app").unwrap_err();
        assert!(matches!(err, Error::Io(_)), "err: {err}");
    }

    #[test]
    fn cancellation_closes_the_file() {
        let dir = temp_dir("cancel-close");
        let token = CancelToken::new();
        let mut handle = create_dated_log_file_with_token(&token, &dir, "ctx").unwrap();
        handle.write_all(b"before\n").unwrap();
        token.cancel();
        std::thread::sleep(Duration::from_millis(50));
        assert!(handle.is_closed());
        assert!(handle.write_all(b"after\n").is_err());
        assert!(handle.sync().is_err());
    }

    #[test]
    fn clones_share_the_same_file() {
        let dir = temp_dir("clone-share");
        let mut handle = create_dated_log_file(&dir, "shared").unwrap();
        let mut clone = handle.clone();
        handle.write_all(b"one\n").unwrap();
        clone.write_all(b"two\n").unwrap();
        handle.sync().unwrap();
        let content = fs::read_to_string(handle.path()).unwrap();
        assert_eq!(content, "one\ntwo\n");
        clone.close();
        assert!(handle.is_closed());
    }
}
