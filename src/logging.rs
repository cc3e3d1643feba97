// src/logging.rs
//
// Timestamped stderr logging with an optional log file.
// `tlog!` always prints; `tdebug!` only prints once verbose logging is enabled.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::Result;

/// Name of the link that always points at the newest log file.
const LATEST_LOG: &str = "w800rf32.log";

/// When `Some`, log lines are appended here as well as to stderr.
static LOG_FILE: Mutex<Option<std::fs::File>> = Mutex::new(None);

/// Gate for `tdebug!` output (raw packet dumps, dropped frames).
static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(enabled: bool) {
    VERBOSE.store(enabled, Ordering::Relaxed);
}

pub fn verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Local wall-clock time as `HH:MM:SS.mmm`.
pub fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S%.3f").to_string()
}

/// Write one timestamped line. Use `tlog!` rather than calling this directly.
#[doc(hidden)]
pub fn write_line(args: fmt::Arguments<'_>) {
    let line = format!("{} {}", timestamp(), args);
    eprintln!("{}", line);
    if let Ok(mut guard) = LOG_FILE.lock() {
        if let Some(file) = guard.as_mut() {
            let _ = writeln!(file, "{}", line);
        }
    }
}

/// Start appending log lines to `<log_dir>/YYYYmmdd-HHMMSS-w800rf32.log`.
/// On Unix `w800rf32.log` is re-pointed at the new file.
pub fn init_file_logging(log_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(log_dir)?;

    let filename = chrono::Local::now()
        .format("%Y%m%d-%H%M%S-w800rf32.log")
        .to_string();
    let log_path = log_dir.join(&filename);
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    #[cfg(unix)]
    {
        if let Err(e) = link_latest(log_dir, &filename) {
            write_line(format_args!("[logging] Failed to update {} link: {}", LATEST_LOG, e));
        }
    }

    if let Ok(mut guard) = LOG_FILE.lock() {
        *guard = Some(file);
    }
    write_line(format_args!("[logging] File logging started: {}", log_path.display()));

    Ok(log_path)
}

#[cfg(unix)]
fn link_latest(log_dir: &Path, filename: &str) -> std::io::Result<()> {
    let link = log_dir.join(LATEST_LOG);
    match std::fs::remove_file(&link) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e),
        _ => {}
    }
    std::os::unix::fs::symlink(filename, link)
}

/// Close the log file, if one is open.
pub fn stop_file_logging() {
    let closed = match LOG_FILE.lock() {
        Ok(mut guard) => guard.take().is_some(),
        Err(_) => false,
    };
    if closed {
        write_line(format_args!("[logging] File logging stopped"));
    }
}

/// Timestamped logging to stderr, and to the log file when one is open.
#[macro_export]
macro_rules! tlog {
    ($($arg:tt)*) => {
        $crate::logging::write_line(format_args!($($arg)*))
    };
}

/// Like `tlog!`, but silent unless verbose logging is enabled.
#[macro_export]
macro_rules! tdebug {
    ($($arg:tt)*) => {{
        if $crate::logging::verbose() {
            $crate::tlog!($($arg)*);
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_toggle() {
        set_verbose(true);
        assert!(verbose());
        tdebug!("[logging] verbose output enabled");
        set_verbose(false);
        assert!(!verbose());
    }

    #[test]
    fn test_init_file_logging_creates_file() {
        let dir = std::env::temp_dir().join(format!("w800rf32-log-test-{}", std::process::id()));
        let path = init_file_logging(&dir).expect("file logging should start");
        tlog!("[logging] hello from test");
        stop_file_logging();

        let content = std::fs::read_to_string(&path).expect("log file readable");
        assert!(content.contains("hello from test"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn test_latest_link_is_replaced() {
        let dir = std::env::temp_dir().join(format!("w800rf32-link-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        link_latest(&dir, "first.log").unwrap();
        link_latest(&dir, "second.log").unwrap();
        let target = std::fs::read_link(dir.join(LATEST_LOG)).unwrap();
        assert_eq!(target, PathBuf::from("second.log"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_timestamp_format() {
        let ts = timestamp();
        assert_eq!(ts.len(), "12:34:56.789".len());
        assert_eq!(&ts[2..3], ":");
        assert_eq!(&ts[8..9], ".");
    }
}
