//! Solver logging.
//!
//! Every message goes through the `log` facade. A solver instance may also
//! carry a `LogSink`, a shared destination (file, stderr, buffer) guarded by
//! a mutex: each line is written inside one critical section, so solvers
//! running on different threads can share a sink without interleaving.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use log::Level;

/// Shared, mutex-guarded log destination.
#[derive(Clone)]
pub struct LogSink {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl LogSink {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        LogSink {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// Open `path` for logging; `erase_on_beginning` truncates instead of appending.
    pub fn file(path: impl AsRef<Path>, erase_on_beginning: bool) -> io::Result<Self> {
        let file: File = if erase_on_beginning {
            File::create(path)?
        } else {
            OpenOptions::new().create(true).append(true).open(path)?
        };
        Ok(Self::new(file))
    }

    /// Write one line `"<level> <source>: <message>"`.
    pub fn write_line(&self, level: Level, source: &str, args: fmt::Arguments<'_>) -> io::Result<()> {
        // a panic while holding the lock leaves the writer usable
        let mut w = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        writeln!(w, "{:<5} {}: {}", level, source, args)?;
        w.flush()
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSink").finish_non_exhaustive()
    }
}

/// Per-instance logging capability: a name plus an optional shared sink.
#[derive(Clone, Debug)]
pub struct SolverLogger {
    name: String,
    sink: Option<LogSink>,
}

impl Default for SolverLogger {
    fn default() -> Self {
        SolverLogger::new("picard")
    }
}

impl SolverLogger {
    pub fn new(name: impl Into<String>) -> Self {
        SolverLogger {
            name: name.into(),
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: LogSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        log::log!(target: "picard", level, "[{}] {}", self.name, args);
        if let Some(sink) = &self.sink {
            if let Err(e) = sink.write_line(level, &self.name, args) {
                log::error!(target: "picard", "[{}] log sink write failed: {}", self.name, e);
            }
        }
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn concurrent_loggers_do_not_interleave_lines() {
        let buf = SharedBuf::default();
        let sink = LogSink::new(buf.clone());
        std::thread::scope(|s| {
            for t in 0..4 {
                let logger = SolverLogger::new(format!("solver-{t}")).with_sink(sink.clone());
                s.spawn(move || {
                    for i in 0..50 {
                        logger.info(format_args!("step {i} of a long enough message"));
                    }
                });
            }
        });
        let text = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 200);
        for line in lines {
            assert!(line.starts_with("INFO  solver-"), "garbled line: {line}");
            assert!(line.ends_with("of a long enough message"), "garbled line: {line}");
        }
    }
}
