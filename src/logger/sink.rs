//! Output sink shared by a logger and all handles derived from it.
//!
//! Each entry reaches the sink as one complete line and is written under a
//! single lock, so concurrent writers never interleave. The emitting handle's
//! fields are published in a thread-local for the duration of the event and
//! spliced into the formatted line on its way to the sink.

use std::borrow::Cow;
use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{Map, Value};
use tracing_subscriber::fmt::MakeWriter;

use super::severity::{LogFormat, LogOutput};
use super::{Fields, LoggerError};

/// Keys emitted by the JSON formatter itself; attached fields with these
/// names are written as `fields.<key>` instead.
const RESERVED_KEYS: [&str; 3] = ["timestamp", "level", "message"];

#[derive(Clone)]
pub(crate) enum Sink {
    Stdout,
    File {
        path: PathBuf,
        /// `None` once closed; later writes are discarded.
        file: Arc<Mutex<Option<File>>>,
    },
}

impl Sink {
    pub(crate) fn open(output: &LogOutput) -> Result<Self, LoggerError> {
        match output {
            LogOutput::Stdout => Ok(Sink::Stdout),
            LogOutput::File(path) => {
                let file = open_append(path).map_err(|source| LoggerError::Open {
                    path: path.clone(),
                    source,
                })?;
                Ok(Sink::File {
                    path: path.clone(),
                    file: Arc::new(Mutex::new(Some(file))),
                })
            }
        }
    }

    pub(crate) fn path(&self) -> Option<&Path> {
        match self {
            Sink::Stdout => None,
            Sink::File { path, .. } => Some(path),
        }
    }

    fn write_entry(&self, line: &[u8]) -> io::Result<()> {
        match self {
            Sink::Stdout => io::stdout().lock().write_all(line),
            Sink::File { file, .. } => match lock(file)?.as_mut() {
                Some(f) => f.write_all(line),
                None => Ok(()),
            },
        }
    }

    /// Writes are unbuffered on both targets, so this only forwards to the OS
    /// handle's own flush.
    pub(crate) fn flush(&self) -> io::Result<()> {
        match self {
            Sink::Stdout => io::stdout().lock().flush(),
            Sink::File { file, .. } => match lock(file)?.as_mut() {
                Some(f) => f.flush(),
                None => Ok(()),
            },
        }
    }

    /// Sync the file to disk and release it. Idempotent.
    pub(crate) fn close(&self) -> io::Result<()> {
        match self {
            Sink::Stdout => io::stdout().lock().flush(),
            Sink::File { file, .. } => match lock(file)?.take() {
                Some(mut f) => {
                    f.flush()?;
                    f.sync_all()
                }
                None => Ok(()),
            },
        }
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    let mut opts = OpenOptions::new();
    opts.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o666);
    }
    opts.open(path)
}

fn lock(file: &Mutex<Option<File>>) -> io::Result<MutexGuard<'_, Option<File>>> {
    file.lock().map_err(|_| io::Error::other("log file lock poisoned"))
}

thread_local! {
    /// Fields of the handle currently emitting on this thread.
    static ENTRY_FIELDS: RefCell<Option<Arc<Fields>>> = const { RefCell::new(None) };
}

/// Run `f` with `fields` attached to every entry written on this thread.
/// Nested calls restore the outer handle's fields on return.
pub(crate) fn with_entry_fields<R>(fields: &Arc<Fields>, f: impl FnOnce() -> R) -> R {
    let previous = ENTRY_FIELDS.with(|cell| cell.replace(Some(Arc::clone(fields))));
    let _restore = RestoreFields(previous);
    f()
}

struct RestoreFields(Option<Arc<Fields>>);

impl Drop for RestoreFields {
    fn drop(&mut self) {
        let previous = self.0.take();
        let _ = ENTRY_FIELDS.try_with(|cell| *cell.borrow_mut() = previous);
    }
}

fn current_fields() -> Option<Arc<Fields>> {
    ENTRY_FIELDS.try_with(|cell| cell.borrow().clone()).ok().flatten()
}

/// `MakeWriter` handed to the fmt layer of a backend. One per backend; the
/// fields come from [`with_entry_fields`].
pub(crate) struct EntryWriter {
    sink: Sink,
    format: LogFormat,
}

impl EntryWriter {
    pub(crate) fn new(sink: Sink, format: LogFormat) -> Self {
        Self { sink, format }
    }
}

impl<'a> MakeWriter<'a> for EntryWriter {
    type Writer = EntryLine<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        EntryLine { writer: self }
    }
}

/// Writer for a single formatted entry.
pub(crate) struct EntryLine<'a> {
    writer: &'a EntryWriter,
}

impl Write for EntryLine<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let w = self.writer;
        let fields = current_fields();
        let line = match (fields.as_deref(), w.format) {
            (None, _) => Cow::Borrowed(buf),
            (Some(fields), LogFormat::Json) => inject_json(buf, fields),
            (Some(fields), LogFormat::Text) => inject_text(buf, fields),
        };
        w.sink.write_entry(&line)?;
        // The whole formatted entry was consumed, even if it grew.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.sink.flush()
    }
}

fn inject_json<'b>(buf: &'b [u8], fields: &Fields) -> Cow<'b, [u8]> {
    if fields.is_empty() {
        return Cow::Borrowed(buf);
    }
    let Ok(Value::Object(mut map)) = serde_json::from_slice::<Value>(buf) else {
        return Cow::Borrowed(buf);
    };
    merge_fields(&mut map, fields);
    match serde_json::to_vec(&map) {
        Ok(mut out) => {
            out.push(b'\n');
            Cow::Owned(out)
        }
        Err(_) => Cow::Borrowed(buf),
    }
}

fn merge_fields(map: &mut Map<String, Value>, fields: &Fields) {
    for (key, value) in fields {
        let clashes = RESERVED_KEYS.contains(&key.as_str()) || map.contains_key(key);
        let key = if clashes { format!("fields.{key}") } else { key.clone() };
        map.insert(key, value.clone());
    }
}

fn inject_text<'b>(buf: &'b [u8], fields: &Fields) -> Cow<'b, [u8]> {
    if fields.is_empty() {
        return Cow::Borrowed(buf);
    }
    let body = buf.strip_suffix(b"\n").unwrap_or(buf);
    let mut out = Vec::with_capacity(buf.len() + fields.len() * 16);
    out.extend_from_slice(body);
    for (key, value) in fields {
        out.push(b' ');
        out.extend_from_slice(key.as_bytes());
        out.push(b'=');
        out.extend_from_slice(text_value(value).as_bytes());
    }
    out.push(b'\n');
    Cow::Owned(out)
}

/// Strings are written bare unless they would be ambiguous in `k=v` form.
fn text_value(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => {
            let needs_quotes = s.is_empty()
                || s.chars().any(|c| c.is_whitespace() || c == '=' || c == '"');
            if needs_quotes {
                Cow::Owned(format!("{s:?}"))
            } else {
                Cow::Borrowed(s.as_str())
            }
        }
        other => Cow::Owned(other.to_string()),
    }
}
