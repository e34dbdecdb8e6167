//! Browser console logging.
//!
//! Installs a `tracing-subscriber` fmt subscriber whose writer sends each
//! formatted line to the `console` method matching the event level. ANSI
//! colours and timestamps are disabled: the console does not render escape
//! codes and `SystemTime` is unavailable on `wasm32-unknown-unknown`.

use std::io;

use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;

/// Destination for one formatted log line.
pub type LineSink = fn(Level, &str);

/// `MakeWriter` producing one [`ConsoleWriter`] per event.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleMakeWriter {
    sink: LineSink,
}

impl ConsoleMakeWriter {
    pub fn new(sink: LineSink) -> Self {
        Self { sink }
    }
}

impl Default for ConsoleMakeWriter {
    fn default() -> Self {
        Self::new(write_to_console)
    }
}

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter::new(self.sink, Level::INFO)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter::new(self.sink, *meta.level())
    }
}

/// Buffers one event and hands it to the sink when dropped.
pub struct ConsoleWriter {
    sink: LineSink,
    level: Level,
    buf: Vec<u8>,
}

impl ConsoleWriter {
    fn new(sink: LineSink, level: Level) -> Self {
        Self {
            sink,
            level,
            buf: Vec::new(),
        }
    }
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let line = String::from_utf8_lossy(&self.buf);
        let line = line.trim_end();
        if !line.is_empty() {
            (self.sink)(self.level, line);
        }
    }
}

/// Console method used for a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleMethod {
    Error,
    Warn,
    Info,
    Debug,
}

impl ConsoleMethod {
    pub fn for_level(level: Level) -> Self {
        match level {
            Level::ERROR => ConsoleMethod::Error,
            Level::WARN => ConsoleMethod::Warn,
            Level::INFO => ConsoleMethod::Info,
            _ => ConsoleMethod::Debug,
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn write_to_console(level: Level, line: &str) {
    use wasm_bindgen::JsValue;
    use web_sys::console;

    let value = JsValue::from_str(line);
    match ConsoleMethod::for_level(level) {
        ConsoleMethod::Error => console::error_1(&value),
        ConsoleMethod::Warn => console::warn_1(&value),
        ConsoleMethod::Info => console::info_1(&value),
        ConsoleMethod::Debug => console::debug_1(&value),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn write_to_console(level: Level, line: &str) {
    match ConsoleMethod::for_level(level) {
        ConsoleMethod::Error | ConsoleMethod::Warn => eprintln!("{line}"),
        ConsoleMethod::Info | ConsoleMethod::Debug => println!("{line}"),
    }
}

/// Install the console subscriber. Later calls are no-ops.
pub fn init() {
    let installed = tracing_subscriber::fmt()
        .with_writer(ConsoleMakeWriter::default())
        .with_ansi(false)
        .without_time()
        .with_target(true)
        .with_max_level(Level::DEBUG)
        .try_init();

    if installed.is_ok() {
        tracing::debug!(version = env!("CARGO_PKG_VERSION"), "console logging ready");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::io::Write;

    thread_local! {
        static LINES: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
    }

    fn capture(level: Level, line: &str) {
        LINES.with(|lines| lines.borrow_mut().push((level, line.to_string())));
    }

    fn take_lines() -> Vec<(Level, String)> {
        LINES.with(|lines| lines.borrow_mut().drain(..).collect())
    }

    #[test]
    fn test_writer_emits_one_line_on_drop() {
        take_lines();
        {
            let make = ConsoleMakeWriter::new(capture);
            let mut writer = make.make_writer();
            write!(writer, "crop ").unwrap();
            writeln!(writer, "applied").unwrap();
            assert!(take_lines().is_empty());
        }
        assert_eq!(take_lines(), vec![(Level::INFO, "crop applied".to_string())]);
    }

    #[test]
    fn test_empty_writer_emits_nothing() {
        take_lines();
        drop(ConsoleMakeWriter::new(capture).make_writer());
        assert!(take_lines().is_empty());
    }

    #[test]
    fn test_console_method_for_level() {
        assert_eq!(ConsoleMethod::for_level(Level::ERROR), ConsoleMethod::Error);
        assert_eq!(ConsoleMethod::for_level(Level::WARN), ConsoleMethod::Warn);
        assert_eq!(ConsoleMethod::for_level(Level::INFO), ConsoleMethod::Info);
        assert_eq!(ConsoleMethod::for_level(Level::DEBUG), ConsoleMethod::Debug);
        assert_eq!(ConsoleMethod::for_level(Level::TRACE), ConsoleMethod::Debug);
    }

    #[test]
    fn test_subscriber_routes_events_to_sink() {
        take_lines();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(ConsoleMakeWriter::new(capture))
            .with_ansi(false)
            .without_time()
            .with_max_level(Level::DEBUG)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(requested = "image/webp", "falling back to PNG export");
        });

        let lines = take_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, Level::WARN);
        assert!(lines[0].1.contains("falling back to PNG export"));
        assert!(lines[0].1.contains("requested=\"image/webp\""));
        assert!(!lines[0].1.contains('\u{1b}'));
    }
}
