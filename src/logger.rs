use std::io::Write;
use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;
use log::Level;
use serde_json::{Map, Value};

use crate::sink::{ConsoleSink, Record, SharedSink, WriterSink, write_all};

/// Process-wide optional logger slot. Set explicitly, never cleared.
static GLOBAL_LOGGER: RwLock<Option<Logger>> = RwLock::new(None);

struct Inner {
    /// Snapshot list handed to facades; swapped wholesale by `add_writer`.
    sinks: RwLock<Arc<Vec<SharedSink>>>,
    /// Line prefix, shared live across every facade of this logger.
    prefix: Arc<RwLock<String>>,
}

/// A logger fanning every record out to a console sink plus any number of
/// writer sinks. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

fn build(console: Option<ConsoleSink>, writers: Vec<Box<dyn Write + Send>>) -> Logger {
    let mut sinks: Vec<SharedSink> = Vec::with_capacity(writers.len() + 1);
    if let Some(console) = console {
        sinks.push(Arc::new(Mutex::new(console)));
    }
    for writer in writers {
        sinks.push(Arc::new(Mutex::new(WriterSink::new(writer))));
    }
    Logger {
        inner: Arc::new(Inner {
            sinks: RwLock::new(Arc::new(sinks)),
            prefix: Arc::new(RwLock::new(String::new())),
        }),
    }
}

/// Creates a logger that writes to the given writers, as well as pretty
/// prints to stdout.
pub fn new_logger(writers: Vec<Box<dyn Write + Send>>) -> Logger {
    build(Some(ConsoleSink::new()), writers)
}

/// Creates a logger that writes to the given writers with no console sink.
pub fn new_quiet_logger(writers: Vec<Box<dyn Write + Send>>) -> Logger {
    build(None, writers)
}

/// Like [`new_logger`], but the console sink never emits color codes.
pub fn new_logger_no_color(writers: Vec<Box<dyn Write + Send>>) -> Logger {
    build(Some(ConsoleSink::no_color()), writers)
}

impl Logger {
    /// Appends a writer to the sink list. The line prefix set through
    /// [`LineLogger::set_prefix`] is preserved. Facades obtained afterwards
    /// see the new writer; facades already held keep their snapshot.
    pub fn add_writer<W: Write + Send + 'static>(&self, writer: W) {
        let mut sinks = self.inner.sinks.write().unwrap();
        let mut rebuilt: Vec<SharedSink> = sinks.as_ref().clone();
        rebuilt.push(Arc::new(Mutex::new(WriterSink::new(writer))));
        *sinks = Arc::new(rebuilt);
    }

    fn snapshot(&self) -> Arc<Vec<SharedSink>> {
        self.inner.sinks.read().unwrap().clone()
    }

    /// The line-oriented facade over the current sink snapshot.
    pub fn c(&self) -> LineLogger {
        LineLogger {
            sinks: self.snapshot(),
            prefix: Arc::clone(&self.inner.prefix),
        }
    }

    /// The structured/leveled facade over the current sink snapshot.
    pub fn z(&self) -> ZLogger {
        ZLogger {
            sinks: self.snapshot(),
            prefix: Arc::clone(&self.inner.prefix),
        }
    }

    /// Flushes every sink.
    pub fn flush(&self) {
        for sink in self.snapshot().iter() {
            if let Ok(mut guard) = sink.lock() {
                let _ = guard.flush();
            }
        }
    }

    /// Stores a clone of this logger in the process-wide slot, overwriting
    /// any prior occupant, and returns the receiver for chaining.
    pub fn with_global_access(self) -> Logger {
        *GLOBAL_LOGGER.write().unwrap() = Some(self.clone());
        self
    }

    /// Installs this logger as the `log` crate's global backend, so
    /// `log::info!` and friends flow through the same fan-out.
    pub fn init_log_facade(&self) -> Result<(), log::SetLoggerError> {
        log::set_boxed_logger(Box::new(self.clone()))?;
        log::set_max_level(log::LevelFilter::Trace);
        Ok(())
    }

    fn prefix(&self) -> String {
        self.inner.prefix.read().unwrap().clone()
    }
}

impl log::Log for Logger {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        let sinks = self.snapshot();
        let prefix = self.prefix();
        let message = record.args().to_string();
        let fields = Map::new();
        let record = Record {
            level: record.level(),
            time: Utc::now().timestamp(),
            prefix: &prefix,
            fields: &fields,
            message: &message,
        };
        write_all(&sinks, &record);
    }

    fn flush(&self) {
        Logger::flush(self);
    }
}

/// Returns the logger stored via [`Logger::with_global_access`], if any.
pub fn global() -> Option<Logger> {
    GLOBAL_LOGGER.read().unwrap().clone()
}

/// Line-oriented facade. Holds an immutable snapshot of the sink list from
/// the moment it was fetched; only the prefix cell is shared with the logger.
pub struct LineLogger {
    sinks: Arc<Vec<SharedSink>>,
    prefix: Arc<RwLock<String>>,
}

impl LineLogger {
    pub fn set_prefix(&self, prefix: &str) {
        *self.prefix.write().unwrap() = prefix.to_string();
    }

    pub fn prefix(&self) -> String {
        self.prefix.read().unwrap().clone()
    }

    pub fn trace(&self, message: &str) {
        self.emit(Level::Trace, message);
    }

    pub fn debug(&self, message: &str) {
        self.emit(Level::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.emit(Level::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.emit(Level::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.emit(Level::Error, message);
    }

    fn emit(&self, level: Level, message: &str) {
        let prefix = self.prefix();
        let fields = Map::new();
        let record = Record {
            level,
            time: Utc::now().timestamp(),
            prefix: &prefix,
            fields: &fields,
            message,
        };
        write_all(&self.sinks, &record);
    }
}

/// Structured/leveled facade. Snapshot semantics match [`LineLogger`].
pub struct ZLogger {
    sinks: Arc<Vec<SharedSink>>,
    prefix: Arc<RwLock<String>>,
}

impl ZLogger {
    pub fn trace(&self) -> Event {
        self.event(Level::Trace)
    }

    pub fn debug(&self) -> Event {
        self.event(Level::Debug)
    }

    pub fn info(&self) -> Event {
        self.event(Level::Info)
    }

    pub fn warn(&self) -> Event {
        self.event(Level::Warn)
    }

    pub fn error(&self) -> Event {
        self.event(Level::Error)
    }

    fn event(&self, level: Level) -> Event {
        Event {
            sinks: Arc::clone(&self.sinks),
            prefix: self.prefix.read().unwrap().clone(),
            level,
            fields: Map::new(),
        }
    }
}

/// One structured record under construction. Chain field setters, then finish
/// with [`Event::msg`] or [`Event::send`]; dropping without either emits
/// nothing.
pub struct Event {
    sinks: Arc<Vec<SharedSink>>,
    prefix: String,
    level: Level,
    fields: Map<String, Value>,
}

impl Event {
    pub fn str(mut self, key: &str, value: &str) -> Self {
        self.fields.insert(key.to_string(), Value::from(value));
        self
    }

    pub fn i64(mut self, key: &str, value: i64) -> Self {
        self.fields.insert(key.to_string(), Value::from(value));
        self
    }

    pub fn u64(mut self, key: &str, value: u64) -> Self {
        self.fields.insert(key.to_string(), Value::from(value));
        self
    }

    pub fn f64(mut self, key: &str, value: f64) -> Self {
        self.fields.insert(key.to_string(), Value::from(value));
        self
    }

    pub fn bool_val(mut self, key: &str, value: bool) -> Self {
        self.fields.insert(key.to_string(), Value::from(value));
        self
    }

    pub fn err(mut self, error: &dyn std::error::Error) -> Self {
        self.fields
            .insert("error".to_string(), Value::from(error.to_string()));
        self
    }

    /// Emits the record with the given message.
    pub fn msg(self, message: &str) {
        let record = Record {
            level: self.level,
            time: Utc::now().timestamp(),
            prefix: &self.prefix,
            fields: &self.fields,
            message,
        };
        write_all(&self.sinks, &record);
    }

    /// Emits the record with no message.
    pub fn send(self) {
        self.msg("");
    }
}
