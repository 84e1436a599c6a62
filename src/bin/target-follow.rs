use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use target_follow::dispatch::{LogTransport, Transport, open_serial};
use target_follow::integration::{CycleOutcome, ReplayDetector, ReplayFeed};
use target_follow::{Command, Dispatcher, FollowConfig, FollowPipeline, ManualDrive};

/// Follow a selected person and steer an actuator toward them
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Actuator transport
    #[arg(short, long, value_enum, default_value_t = TransportKind::Serial)]
    transport: TransportKind,

    /// Serial port (overrides config)
    #[arg(long)]
    port: Option<String>,

    /// Serial baud rate (overrides config)
    #[arg(long)]
    baud: Option<u32>,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Run the follow loop over a recorded detection feed
    Follow {
        /// JSON-lines recording, one detection array per frame
        #[arg(short, long)]
        replay: PathBuf,

        /// Frame width in pixels
        #[arg(long, default_value_t = 320)]
        width: u32,

        /// Frame height in pixels
        #[arg(long, default_value_t = 320)]
        height: u32,

        /// Steering dead-band in pixels (overrides config)
        #[arg(long)]
        dead_band: Option<f32>,

        /// Select the person at X,Y after the first frame
        #[arg(long, value_parser = parse_point)]
        select: Option<(f32, f32)>,
    },
    /// Drive by hand: read `<forward|backward|left|right> <start|stop>` lines from stdin
    Manual,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum TransportKind {
    /// Serial link to the motor controller
    Serial,
    /// Log each command instead of sending it
    Log,
}

fn parse_point(s: &str) -> Result<(f32, f32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got `{s}`"))?;
    let x = x.trim().parse().map_err(|e| format!("bad x: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad y: {e}"))?;
    Ok((x, y))
}

fn open_transport(kind: TransportKind, config: &FollowConfig) -> Result<Box<dyn Transport>> {
    Ok(match kind {
        TransportKind::Serial => Box::new(
            open_serial(&config.serial_settings()).context("opening actuator serial port")?,
        ),
        TransportKind::Log => Box::new(LogTransport),
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => FollowConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => FollowConfig::default(),
    };
    if let Some(port) = args.port {
        config.serial.port = port;
    }
    if let Some(baud) = args.baud {
        config.serial.baud_rate = baud;
    }

    match args.mode {
        Mode::Follow {
            replay,
            width,
            height,
            dead_band,
            select,
        } => {
            if let Some(dead_band) = dead_band {
                config.dead_band = dead_band;
            }
            config.validate()?;

            let feed = ReplayFeed::open(&replay, width, height)?;
            let transport = open_transport(args.transport, &config)?;
            let dispatcher = Dispatcher::spawn(transport, config.dispatch_policy)?;
            let mut pipeline = FollowPipeline::new(feed, ReplayDetector, dispatcher, &config);

            if let Some((x, y)) = select {
                if pipeline.step()? == CycleOutcome::Exhausted {
                    bail!("recording {} has no frames", replay.display());
                }
                match pipeline.gateway().select_target(x, y) {
                    Ok(target) => info!(bbox = ?target.bbox.to_tlbr(), "person selected"),
                    Err(err) => warn!(error = %err, "no person found"),
                }
            }

            let summary = pipeline.run()?;
            info!(cycles = summary.cycles, skipped = summary.skipped, "done");
        }
        Mode::Manual => {
            config.validate()?;
            let transport = open_transport(args.transport, &config)?;
            let mut drive = ManualDrive::new(transport)?;

            for line in io::stdin().lock().lines() {
                let line = line.context("reading stdin")?;
                let mut parts = line.split_whitespace();
                let (Some(name), Some(action)) = (parts.next(), parts.next()) else {
                    continue;
                };
                let Some(command) = Command::from_name(name) else {
                    warn!(command = name, "unknown command");
                    continue;
                };
                match action.parse() {
                    Ok(action) => drive.apply(command, action),
                    Err(err) => warn!(%err, "ignoring line"),
                }
            }
            drive.shutdown();
        }
    }

    Ok(())
}
