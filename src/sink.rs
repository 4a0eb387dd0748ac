use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use colored::Colorize;
use log::Level;
use serde_json::{Map, Value};

/// A single log record on its way to every sink of a logger.
pub struct Record<'a> {
    pub level: Level,
    /// Unix seconds. Fixed numeric representation for every record.
    pub time: i64,
    pub prefix: &'a str,
    pub fields: &'a Map<String, Value>,
    pub message: &'a str,
}

/// A destination for log records. Console and writer sinks render the same
/// record differently; neither sees the other's bytes.
pub trait Sink: Send {
    fn write_record(&mut self, record: &Record<'_>) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
}

pub(crate) type SharedSink = Arc<Mutex<dyn Sink>>;

/// Forwards a record to every sink in the list. Individual sink failures are
/// swallowed; fan-out guarantees "no corruption", not delivery.
pub(crate) fn write_all(sinks: &[SharedSink], record: &Record<'_>) {
    for sink in sinks {
        if let Ok(mut guard) = sink.lock() {
            let _ = guard.write_record(record);
        }
    }
}

pub(crate) fn level_label(level: Level) -> &'static str {
    match level {
        Level::Error => "error",
        Level::Warn => "warn",
        Level::Info => "info",
        Level::Debug => "debug",
        Level::Trace => "trace",
    }
}

fn level_tag(level: Level, no_color: bool) -> String {
    if no_color {
        return match level {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
        .to_string();
    }
    match level {
        Level::Error => "ERROR".red(),
        Level::Warn => "WARN".yellow(),
        Level::Info => "INFO".green(),
        Level::Debug => "DEBUG".blue(),
        Level::Trace => "TRACE".purple(),
    }
    .to_string()
}

fn format_console(record: &Record<'_>, no_color: bool) -> String {
    let time = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3f");
    let level = level_tag(record.level, no_color);
    let mut line = if record.prefix.is_empty() {
        format!("[{time} {level}]")
    } else {
        format!("[{time} {level}] {}:", record.prefix)
    };
    if !record.message.is_empty() {
        line.push(' ');
        line.push_str(record.message);
    }
    for (key, value) in record.fields {
        match value {
            Value::String(text) => line.push_str(&format!(" {key}={text}")),
            other => line.push_str(&format!(" {key}={other}")),
        }
    }
    line
}

/// Human-readable leveled output on stdout.
pub struct ConsoleSink {
    no_color: bool,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self { no_color: false }
    }

    /// A console sink that never emits ANSI color codes, regardless of
    /// platform or tty detection.
    pub fn no_color() -> Self {
        Self { no_color: true }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for ConsoleSink {
    fn write_record(&mut self, record: &Record<'_>) -> io::Result<()> {
        let line = format_console(record, self.no_color);
        let mut out = io::stdout().lock();
        writeln!(out, "{line}")?;
        out.flush()
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }
}

/// Renders each record as one JSON object per line into any writer.
pub struct WriterSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write + Send> Sink for WriterSink<W> {
    fn write_record(&mut self, record: &Record<'_>) -> io::Result<()> {
        let mut object = Map::new();
        object.insert("time".into(), Value::from(record.time));
        object.insert("level".into(), Value::from(level_label(record.level)));
        if !record.prefix.is_empty() {
            object.insert("prefix".into(), Value::from(record.prefix));
        }
        for (key, value) in record.fields {
            object.insert(key.clone(), value.clone());
        }
        if !record.message.is_empty() {
            object.insert("message".into(), Value::from(record.message));
        }
        serde_json::to_writer(&mut self.writer, &Value::Object(object))?;
        self.writer.write_all(b"\n")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with<'a>(
        fields: &'a Map<String, Value>,
        prefix: &'a str,
        message: &'a str,
    ) -> Record<'a> {
        Record {
            level: Level::Info,
            time: 1_700_000_000,
            prefix,
            fields,
            message,
        }
    }

    #[test]
    fn console_line_carries_prefix_message_and_fields() {
        let mut fields = Map::new();
        fields.insert("port".into(), Value::from(8080));
        let record = record_with(&fields, "api", "listening");
        let line = format_console(&record, true);
        assert!(line.contains("INFO"), "line: {line}");
        assert!(line.contains("api:"), "line: {line}");
        assert!(line.contains("listening"), "line: {line}");
        assert!(line.contains("port=8080"), "line: {line}");
    }

    #[test]
    fn console_line_omits_empty_prefix_segment() {
        let fields = Map::new();
        let record = record_with(&fields, "", "bare");
        let line = format_console(&record, true);
        assert!(line.contains("] bare"), "line: {line}");
        assert!(line.ends_with("bare"), "line: {line}");
    }

    #[test]
    fn writer_sink_emits_one_json_object_per_line() {
        let mut fields = Map::new();
        fields.insert("attempt".into(), Value::from(3));
        let mut sink = WriterSink::new(Vec::new());
        sink.write_record(&record_with(&fields, "job", "retrying"))
            .unwrap();
        sink.write_record(&record_with(&fields, "job", "done"))
            .unwrap();

        let raw = String::from_utf8(sink.writer).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["time"], Value::from(1_700_000_000_i64));
        assert_eq!(parsed["level"], Value::from("info"));
        assert_eq!(parsed["prefix"], Value::from("job"));
        assert_eq!(parsed["attempt"], Value::from(3));
        assert_eq!(parsed["message"], Value::from("retrying"));
    }

    #[test]
    fn writer_sink_drops_empty_prefix_and_message() {
        let fields = Map::new();
        let mut sink = WriterSink::new(Vec::new());
        sink.write_record(&record_with(&fields, "", "")).unwrap();
        let parsed: Value =
            serde_json::from_str(String::from_utf8(sink.writer).unwrap().trim()).unwrap();
        assert!(parsed.get("prefix").is_none());
        assert!(parsed.get("message").is_none());
        assert_eq!(parsed["level"], Value::from("info"));
    }
}
