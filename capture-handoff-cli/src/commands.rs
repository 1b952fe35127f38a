use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::Level;

use capture_handoff_core::storage::summary::write_summary;
use capture_handoff_core::{
    Aggregator, CaptureSession, ConfigError, DeviceError, DeviceInfo, DeviceProvider, HandoffConfig, HandoffError,
    LoggingProcessor, OpenOptions,
};
use capture_handoff_synthetic::SyntheticProvider;

use crate::console::ConsoleDelegate;
use crate::RunArgs;

pub fn list_devices() -> Result<(), HandoffError> {
    let devices = SyntheticProvider::default().list_devices()?;
    print_devices(&devices);
    Ok(())
}

pub fn run(args: RunArgs) -> Result<(), HandoffError> {
    let config = build_config(&args)?;
    let duration = capture_window(args.duration)?;
    let provider = SyntheticProvider::default();

    let name = match &args.device {
        Some(name) => name.clone(),
        None => select_device(&provider.list_devices()?)?,
    };
    let device = provider.device(&name)?;

    let options = OpenOptions {
        promiscuous: args.promiscuous,
        read_timeout_ms: args.read_timeout_ms,
        snaplen: args.snaplen,
    };
    let mut session = CaptureSession::new(device, config)?.with_open_options(options);
    session.set_delegate(Arc::new(ConsoleDelegate::spawn()?));

    let item_level = if args.show_items { Level::Info } else { Level::Debug };
    let processor = (LoggingProcessor::new(item_level), Aggregator::new());

    let completion = session.run(processor, |_| wait_for_stop(duration))?;

    let (_, aggregator) = completion.processor;
    let aggregate = aggregator.into_aggregate();
    let json = serde_json::to_string_pretty(&completion.summary.final_statistics)
        .map_err(|e| HandoffError::InvalidState(format!("failed to render statistics: {}", e)))?;
    println!("{}", json);
    println!(
        "{} items, {} bytes on the wire, mean length {:.1}",
        aggregate.items,
        aggregate.original_bytes,
        aggregate.mean_len().unwrap_or(0.0)
    );

    if let Some(path) = &args.summary_json {
        write_summary(&completion.summary, path)?;
        log::info!("summary written to {}", path.display());
    }
    Ok(())
}

fn build_config(args: &RunArgs) -> Result<HandoffConfig, HandoffError> {
    let mut config = match &args.config {
        Some(path) => HandoffConfig::from_json_file(path)?,
        None => HandoffConfig::default(),
    };
    if let Some(ms) = args.backoff_ms {
        config.backoff_ms = ms;
    }
    if let Some(ms) = args.stats_interval_ms {
        config.stats_interval_ms = ms;
    }
    if let Some(max) = args.max_buffered {
        config.max_buffered_items = Some(max);
    }
    if let Some(policy) = args.overflow {
        config.overflow_policy = policy.into();
    }
    if let Some(wake) = args.wake {
        config.wake_strategy = wake.into();
    }
    config.validate()?;
    Ok(config)
}

fn capture_window(secs: Option<f64>) -> Result<Option<Duration>, HandoffError> {
    secs.map(|s| {
        Duration::try_from_secs_f64(s)
            .map_err(|e| HandoffError::from(ConfigError::Invalid(format!("duration {}: {}", s, e))))
    })
    .transpose()
}

fn print_devices(devices: &[DeviceInfo]) {
    for (i, device) in devices.iter().enumerate() {
        let status = if device.is_up { "" } else { " [down]" };
        println!("{}. {} ({}){}", i + 1, device.name, device.label(), status);
    }
}

fn select_device(devices: &[DeviceInfo]) -> Result<String, HandoffError> {
    if devices.is_empty() {
        return Err(DeviceError::NotFound("no capture devices".into()).into());
    }
    print_devices(devices);
    print!("Enter the device number (1-{}): ", devices.len());
    io::stdout().flush().ok();

    let mut input = String::new();
    io::stdin()
        .lock()
        .read_line(&mut input)
        .map_err(|e| HandoffError::InvalidState(format!("failed to read selection: {}", e)))?;

    let choice = input.trim();
    choice
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| devices.get(i))
        .map(|d| d.name.clone())
        .ok_or_else(|| DeviceError::NotFound(format!("no device numbered {:?}", choice)).into())
}

/// Block until Enter is pressed or `duration` elapses.
fn wait_for_stop(duration: Option<Duration>) {
    wait_for_line_or(io::BufReader::new(io::stdin()), duration);
}

/// A line on `input` stops early. Closed or unreadable input does not.
fn wait_for_line_or<R: BufRead + Send + 'static>(mut input: R, duration: Option<Duration>) {
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("stop-signal".into())
        .spawn(move || {
            let mut line = String::new();
            match input.read_line(&mut line) {
                Ok(n) if n > 0 => {
                    let _ = tx.send(());
                }
                Ok(_) => log::debug!("stdin closed"),
                Err(e) => log::debug!("cannot read stdin: {}", e),
            }
        });
    if let Err(e) = spawned {
        log::warn!("cannot watch stdin for the stop signal: {}", e);
    }

    match duration {
        Some(d) => {
            println!("Capturing for {:.1}s (press Enter to stop early)...", d.as_secs_f64());
            let deadline = Instant::now() + d;
            if let Err(RecvTimeoutError::Disconnected) = rx.recv_timeout(d) {
                thread::sleep(deadline.saturating_duration_since(Instant::now()));
            }
        }
        None => {
            println!("Capturing; press Enter to stop...");
            if rx.recv().is_err() {
                log::warn!("stdin closed and no --duration given; capturing until the process is killed");
                loop {
                    thread::park();
                }
            }
        }
    }
}
