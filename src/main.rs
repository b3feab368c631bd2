//! roland-gw - SysEx gateway for Roland digital pianos
//!
//! Read and write FP/RP-series registers over USB MIDI: volume, tone,
//! metronome, transpose, and the rest of the address map.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use roland_gw::midi::format_hex;
use roland_gw::{
    discovery, Instrument, MidiMessage, MidiTransport, Piano, Register, RegisterRequest,
    RegisterResponse, Transport,
};

/// Roland digital piano gateway - register access over USB MIDI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// MIDI port name substring (default: first detected piano)
    #[arg(short, long, env = "ROLAND_PORT")]
    port: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List available MIDI ports
    Ports,
    /// Print the register catalog
    Registers,
    /// Print the tone table
    Instruments,
    /// Read one register by name
    Read {
        /// Register name in kebab-case (see `registers`)
        register: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write one register by name
    Write {
        /// Register name in kebab-case (see `registers`)
        register: String,
        /// Value, decimal or 0x-prefixed hex
        value: String,
    },
    /// Read or set the master volume
    Volume { value: Option<u8> },
    /// Read or set the sequencer tempo
    Tempo { bpm: Option<u16> },
    /// Read or set the key transpose
    Transpose {
        #[arg(allow_negative_numbers = true)]
        semitones: Option<i8>,
    },
    /// Read or set the current tone
    Instrument {
        /// Tone name, case and punctuation insensitive (see `instruments`)
        name: Vec<String>,
    },
    /// Switch the metronome
    Metronome {
        #[arg(value_enum)]
        action: MetronomeAction,
    },
    /// Show time since the piano was powered on
    Uptime,
    /// Print every register push until Ctrl-C
    Monitor,
    /// Interactive prompt
    Repl,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MetronomeAction {
    On,
    Off,
    Toggle,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level)?;

    match args.command {
        Command::Ports => cli::print_ports(),
        Command::Registers => cli::print_registers(),
        Command::Instruments => cli::print_instruments(),
        Command::Monitor => {
            let port = resolve_port(args.port)?;
            monitor(&port).await?;
        }
        command => {
            let port = resolve_port(args.port)?;
            info!("Connecting to {}", port);
            let piano = Piano::connect(&port).await?;
            let result = run_command(&piano, command).await;
            if let Err(e) = piano.close().await {
                warn!("Failed to close session: {}", e);
            }
            result?;
        }
    }

    Ok(())
}

fn resolve_port(arg: Option<String>) -> Result<String> {
    match arg {
        Some(pattern) => Ok(pattern),
        None => Ok(discovery::discover(0)?),
    }
}

async fn run_command(piano: &Piano, command: Command) -> Result<()> {
    match command {
        Command::Read { register, json } => {
            let register = Register::from_name(&register)?;
            let value = piano.read_register(register).await?;
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "register": register, "value": value })
                );
            } else {
                println!("{} = {}", register, value.to_string().green());
            }
        }
        Command::Write { register, value } => {
            let register = Register::from_name(&register)?;
            piano.write_register(register, cli::parse_number_maybe_hex(&value)?)?;
        }
        Command::Volume { value: Some(v) } => piano.set_volume(v)?,
        Command::Volume { value: None } => println!("{}", piano.volume().await?),
        Command::Tempo { bpm: Some(v) } => piano.metronome().set_bpm(v)?,
        Command::Tempo { bpm: None } => println!("{}", piano.metronome().bpm().await?),
        Command::Transpose { semitones: Some(v) } => piano.set_transpose(v)?,
        Command::Transpose { semitones: None } => println!("{}", piano.transpose().await?),
        Command::Instrument { name } => {
            if name.is_empty() {
                println!("{}", piano.instrument().await?);
            } else {
                let name = name.join(" ");
                let instrument = Instrument::from_name(&name)
                    .ok_or_else(|| anyhow::anyhow!("Unknown instrument: {}", name))?;
                piano.set_instrument(instrument)?;
            }
        }
        Command::Metronome { action } => match action {
            MetronomeAction::On => piano.metronome().enable(true).await?,
            MetronomeAction::Off => piano.metronome().enable(false).await?,
            MetronomeAction::Toggle => piano.metronome().toggle()?,
        },
        Command::Uptime => println!("{}", cli::format_uptime(piano.uptime().await?)),
        Command::Repl => cli::run_repl(piano).await?,
        // Handled in main before a session is opened.
        Command::Ports | Command::Registers | Command::Instruments | Command::Monitor => {}
    }
    Ok(())
}

/// Tap the wire without a correlation session: switch on active push, then
/// print every frame the piano sends until Ctrl-C.
async fn monitor(pattern: &str) -> Result<()> {
    let (event_tx, mut event_rx) = mpsc::channel::<Vec<u8>>(1000);

    let mut transport = MidiTransport::open(pattern)?;
    transport.on_message(Arc::new(move |data: &[u8]| {
        let _ = event_tx.try_send(data.to_vec());
    }));

    // The piano only reports register changes once active push is on.
    let enable = RegisterRequest::write(Register::Connection, &1u8.into());
    transport.send(&MidiMessage::SysEx { data: enable.frame() }.encode())?;

    println!("{}", "Monitoring register pushes (Ctrl-C to stop)...".bold());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            Some(data) = event_rx.recv() => print_frame(&data),
            _ = &mut ctrl_c => break,
        }
    }

    transport.close()?;
    println!("\n{}", "Monitor stopped".yellow());
    Ok(())
}

fn print_frame(data: &[u8]) {
    match MidiMessage::parse(data) {
        Some(MidiMessage::SysEx { data }) => match RegisterResponse::parse(&data) {
            Ok(response) => println!(
                "{} = {}  {}",
                response.register.to_string().cyan(),
                response.value.to_string().green(),
                format_hex(&response.raw).dimmed()
            ),
            Err(e) => println!(
                "{} {}",
                format_hex(&data).bright_black(),
                e.to_string().red()
            ),
        },
        Some(message) => println!("{}", message.to_string().dimmed()),
        None => println!("{}", format_hex(data).bright_black()),
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}
