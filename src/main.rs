// src/main.rs
//
// Command-line host for a W800RF32 receiver: listen on a port, replay a raw
// capture, decode frames by hand, or list serial ports. Events and sensor
// updates are printed to stdout as JSON lines; logs go to stderr.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use w800rf32_lib::{
    list_serial_ports, logging, route_bytes, tlog, AcquisitionWorker, Event, SensorRegistry,
    Settings,
};

/// Upper bound on how long the event pump sleeps between off-delay checks.
const IDLE_POLL: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(name = "w800rf32", version, about = "Decode X10 RF traffic from a W800RF32 receiver")]
struct Cli {
    /// Log raw packets and dropped frames
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to a timestamped file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read frames from the receiver until it disconnects
    Listen {
        /// Serial device, overrides `device` from the config file
        #[arg(short, long)]
        device: Option<String>,
        /// Config file (defaults to <config dir>/w800rf32/config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print decoded events instead of sensor updates
        #[arg(long)]
        raw: bool,
    },
    /// Feed a raw byte capture through the reader
    Replay {
        file: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        raw: bool,
    },
    /// Decode frames given as hex, e.g. `56558100`
    Decode {
        #[arg(required = true)]
        frames: Vec<String>,
    },
    /// List available serial ports
    Ports,
}

fn main() {
    let cli = Cli::parse();
    logging::set_verbose(cli.verbose);

    if let Some(dir) = &cli.log_dir {
        if let Err(e) = logging::init_file_logging(dir) {
            tlog!("[logging] {}", e);
        }
    }

    let result = match cli.command {
        Command::Listen { device, config, raw } => listen(device.as_deref(), config.as_deref(), raw),
        Command::Replay { file, config, raw } => replay(&file, config.as_deref(), raw),
        Command::Decode { frames } => decode(&frames),
        Command::Ports => ports(),
    };

    logging::stop_file_logging();

    if let Err(e) = result {
        tlog!("[w800rf32] {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Commands
// ============================================================================

fn listen(device: Option<&str>, config: Option<&Path>, raw: bool) -> Result<(), String> {
    let settings = Settings::load_or_default(config).map_err(|e| e.to_string())?;
    let device = settings.device_path(device).map_err(|e| e.to_string())?;
    let registry = SensorRegistry::from_settings(&settings).map_err(|e| e.to_string())?;

    let (tx, rx) = mpsc::channel();
    let mut worker = AcquisitionWorker::new();
    worker
        .connect(&device, move |event| {
            let _ = tx.send(event);
        })
        .map_err(|e| e.to_string())?;

    let result = pump_events(rx, registry, raw);
    worker.disconnect();
    if let Some(reason) = worker.end_reason() {
        tlog!("[w800rf32] Stream ended: {}", reason);
    }
    result
}

fn replay(file: &Path, config: Option<&Path>, raw: bool) -> Result<(), String> {
    let settings = Settings::load_or_default(config).map_err(|e| e.to_string())?;
    let registry = SensorRegistry::from_settings(&settings).map_err(|e| e.to_string())?;
    let capture = std::fs::File::open(file)
        .map_err(|e| format!("Failed to open {}: {}", file.display(), e))?;

    let (tx, rx) = mpsc::channel();
    let mut worker = AcquisitionWorker::new();
    worker
        .connect_reader(&file.display().to_string(), capture, move |event| {
            let _ = tx.send(event);
        })
        .map_err(|e| e.to_string())?;

    let result = pump_events(rx, registry, raw);
    worker.disconnect();
    result
}

fn decode(frames: &[String]) -> Result<(), String> {
    for text in frames {
        let cleaned: String = text
            .trim()
            .trim_start_matches("0x")
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ':')
            .collect();
        let bytes = hex::decode(&cleaned).map_err(|e| format!("Invalid hex {:?}: {}", text, e))?;
        if bytes.len() != w800rf32_lib::decoder::FRAME_LEN {
            return Err(format!("{:?} is {} bytes, frames are 4", text, bytes.len()));
        }
        match route_bytes(&bytes) {
            Some(event) => print_json(&event)?,
            None => tlog!("[w800rf32] {}: not a valid X10 or security frame", cleaned),
        }
    }
    Ok(())
}

fn ports() -> Result<(), String> {
    let ports = list_serial_ports().map_err(|e| e.to_string())?;
    if ports.is_empty() {
        tlog!("[w800rf32] No serial ports found");
    }
    for port in ports {
        print_json(&port)?;
    }
    Ok(())
}

// ============================================================================
// Output
// ============================================================================

/// Print events (or sensor updates when sensors are configured) until the reader goes away.
fn pump_events(rx: mpsc::Receiver<Event>, mut registry: SensorRegistry, raw: bool) -> Result<(), String> {
    let raw = raw || registry.is_empty();

    loop {
        let wait = registry
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .map_or(IDLE_POLL, |d| d.min(IDLE_POLL));

        match rx.recv_timeout(wait) {
            Ok(event) => {
                if raw {
                    print_json(&event)?;
                } else {
                    for update in registry.handle(&event, Instant::now(), chrono::Utc::now()) {
                        print_json(&update)?;
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        for update in registry.expire(Instant::now()) {
            print_json(&update)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let line = serde_json::to_string(value).map_err(|e| format!("Failed to encode output: {}", e))?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", line).map_err(|e| format!("Failed to write output: {}", e))
}
