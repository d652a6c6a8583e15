use std::path::PathBuf;

use brick_hal::comms::render_channel;
use brick_hal::config::{BrickConfig, DEFAULT_CONFIG};
use brick_hal::messages::{Command, Reply};
use brick_hal::{Hal, StopSignal, runtime, teleop};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser)]
#[command(version, about = "Brick robot HAL runtime")]
struct Cli {
    /// Brick configuration (geometry, ports, devices, comms)
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Execute JSON commands from a remote controller
    Serve {
        /// Dial out to this peer instead of waiting for one
        #[arg(long)]
        connect: Option<String>,
    },
    /// Execute a single JSON command and print the reply
    Exec { json: String },
    /// Drive the robot from the keyboard
    Teleop,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=debug for more)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("Runtime error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), BoxError> {
    let config = BrickConfig::load(&cli.config)?;
    let stop = StopSignal::new();

    // Ctrl-C aborts whatever blocking wait the HAL is in
    let signal = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping");
            signal.raise();
        }
    });

    // The HAL polls and sleeps, keep it off the async workers
    tokio::task::spawn_blocking(move || {
        let mut hal = Hal::from_config(config, stop);
        let result = dispatch(&mut hal, cli.command);
        if let Err(e) = hal.reset_state() {
            warn!("Reset failed: {}", e);
        }
        result
    })
    .await?
}

fn dispatch(hal: &mut Hal, mode: Mode) -> Result<(), BoxError> {
    match mode {
        Mode::Serve { connect } => {
            let channel = match connect {
                Some(address) => hal.connect(&address),
                None => hal.listen(),
            };
            info!("Channel: {}", render_channel(channel));
            if let Some(channel) = channel {
                runtime::serve(hal, channel);
            }
            Ok(())
        }
        Mode::Exec { json } => {
            let cmd: Command = serde_json::from_str(&json)?;
            let reply = runtime::execute(hal, &cmd);
            println!("{}", serde_json::to_string(&reply)?);
            match reply {
                Reply::Error { message } => Err(message.into()),
                _ => Ok(()),
            }
        }
        Mode::Teleop => teleop::run(hal),
    }
}
