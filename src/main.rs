//! Almond Hub CLI - inspect and drive a Securifi Almond hub from the shell.
//!
//! This is the main binary entry point. See the `almond_hub` library
//! for the core functionality.

use std::sync::Arc;

use almond_hub::{
    encode_value, Client, CommandType, Config, DeviceDirectory, EventFilter, Request, Response,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;

/// Global allocator.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

// CLI
#[derive(Parser)]
#[command(name = "almond-hub")]
#[command(version)]
#[command(about = "Client for the Securifi Almond local WebSocket API")]
struct Cli {
    /// Hub address (host:port), overrides config and ALMOND_ADDR
    #[arg(long, global = true)]
    addr: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and print the device list
    Devices {
        /// Print the raw response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Stream hub events as JSON lines until interrupted
    Watch {
        /// Only print events of this command type (e.g. DynamicIndexUpdated)
        #[arg(long = "type")]
        command_type: Option<String>,
    },
    /// Set a device value by resource path (name, name/location, location/name/value)
    Set {
        /// Resource path of the device
        resource: String,
        /// Value to write (on/off and lock/unlock are translated)
        value: String,
    },
    /// Print the effective configuration
    Config,
}

fn init_logging() {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.format_timestamp_secs();

    if let Ok(path) = std::env::var("ALMOND_LOG_FILE") {
        match std::fs::File::create(&path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("Failed to create log file at {}: {}", path, e),
        }
    }

    builder.init();
}

async fn connect(config: &Config) -> Result<Client> {
    let client_config = config.client_config();
    log::info!("Connecting to Almond hub at {}", config.hub_addr);
    Client::connect(&client_config)
        .await
        .with_context(|| format!("Failed to connect to {}", config.hub_addr))
}

/// Send `request` and wait for its reply, bounded by the configured timeout
/// when one is set.
async fn round_trip(client: &Client, config: &Config, request: Request) -> Result<Arc<Response>> {
    let command_type = request.command_type();
    let handle = client.submit(request).await?;
    let response = match config.request_timeout() {
        Some(limit) => tokio::time::timeout(limit, handle.recv())
            .await
            .with_context(|| format!("Timed out waiting for {} reply", command_type))??,
        None => handle.recv().await?,
    };
    Ok(response)
}

async fn fetch_directory(client: &Client, config: &Config) -> Result<DeviceDirectory> {
    let response = round_trip(client, config, Request::device_list()).await?;
    let mut directory = DeviceDirectory::new();
    match response.as_ref() {
        Response::DeviceList(list) => directory.update(list),
        other => anyhow::bail!("Expected DeviceList, got {}", other.command_type()),
    }
    Ok(directory)
}

async fn run_devices(config: &Config, json: bool) -> Result<()> {
    let client = connect(config).await?;
    let response = round_trip(&client, config, Request::device_list()).await;
    client.close().await;
    let response = response?;

    let Response::DeviceList(list) = response.as_ref() else {
        anyhow::bail!("Expected DeviceList, got {}", response.command_type());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(list)?);
        return Ok(());
    }

    let mut directory = DeviceDirectory::new();
    directory.update(list);
    for (id, device) in directory.devices() {
        println!(
            "{:>4}  {:<24} {:<16} {}",
            id,
            device.name().unwrap_or("-"),
            device.location().unwrap_or("-"),
            device.kind().unwrap_or("-"),
        );
    }
    Ok(())
}

async fn run_watch(config: &Config, command_type: Option<String>) -> Result<()> {
    let filter: EventFilter = command_type
        .as_deref()
        .unwrap_or_default()
        .parse()
        .context("Unknown command type")?;

    let client = connect(config).await?;
    let mut events = client.subscribe(filter).await?;

    // The hub only pushes deltas; a periodic full list keeps consumers in sync.
    let mut refresh = config
        .refresh_interval()
        .map(|period| tokio::time::interval_at(tokio::time::Instant::now() + period, period));
    client.request(Request::device_list()).await?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let result = loop {
        let tick = async {
            match refresh.as_mut() {
                Some(interval) => {
                    interval.tick().await;
                }
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = &mut ctrl_c => {
                log::info!("Interrupted, shutting down");
                break Ok(());
            }
            () = tick => {
                log::debug!("Refreshing device list");
                if let Err(e) = client.request(Request::device_list()).await {
                    break Err(e.into());
                }
            }
            event = events.recv() => match event {
                Some(response) => {
                    if let Err(e) = print_event(&response) {
                        break Err(e);
                    }
                }
                None => break Err(anyhow::anyhow!("Connection to hub lost")),
            },
        }
    };

    client.close().await;
    result
}

fn print_event(response: &Response) -> Result<()> {
    println!(
        "{} {}",
        response.command_type(),
        serde_json::to_string(response)?
    );
    Ok(())
}

async fn run_set(config: &Config, resource: &str, value: &str) -> Result<()> {
    let client = connect(config).await?;
    let result = set_value(&client, config, resource, value).await;
    client.close().await;
    result
}

async fn set_value(client: &Client, config: &Config, resource: &str, value: &str) -> Result<()> {
    let directory = fetch_directory(client, config).await?;
    let target = directory.resolve(resource)?;
    let encoded = encode_value(&target.kind, value);
    log::info!(
        "Setting device {} index {} to {} ({})",
        target.id,
        target.index,
        encoded,
        resource
    );

    let request = Request::update_device_index(target.id, target.index, encoded);
    let response = round_trip(client, config, request).await?;
    match response.as_ref() {
        Response::UpdateAck(ack) if ack.succeeded() => {
            println!("OK");
            Ok(())
        }
        Response::UpdateAck(ack) => anyhow::bail!("Hub rejected update (Success={})", ack.success),
        other => anyhow::bail!(
            "Expected {}, got {}",
            CommandType::UpdateDeviceIndex,
            other.command_type()
        ),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(addr) = cli.addr {
        config.hub_addr = addr;
    }

    match cli.command {
        Commands::Devices { json } => run_devices(&config, json).await?,
        Commands::Watch { command_type } => run_watch(&config, command_type).await?,
        Commands::Set { resource, value } => run_set(&config, &resource, &value).await?,
        Commands::Config => println!("{}", serde_json::to_string_pretty(&config)?),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_set_command() {
        let cli = Cli::parse_from([
            "almond-hub",
            "--addr",
            "10.0.0.2:7681",
            "set",
            "Kitchen/Lamp/SWITCH",
            "on",
        ]);
        assert_eq!(cli.addr.as_deref(), Some("10.0.0.2:7681"));
        match cli.command {
            Commands::Set { resource, value } => {
                assert_eq!(resource, "Kitchen/Lamp/SWITCH");
                assert_eq!(value, "on");
            }
            _ => panic!("expected set"),
        }
    }

    #[test]
    fn test_parse_watch_type() {
        let cli = Cli::parse_from(["almond-hub", "watch", "--type", "DynamicIndexUpdated"]);
        match cli.command {
            Commands::Watch { command_type } => {
                assert_eq!(command_type.as_deref(), Some("DynamicIndexUpdated"));
            }
            _ => panic!("expected watch"),
        }
    }
}
