// src/main.rs
//! Route Recorder - record a GPS route from the terminal and save it

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use route_recorder::{
    config::RecorderConfig,
    gps::{self, LocationFeed, LocationSource},
    GeoSample, HttpRouteStore, RecorderError, RecordingState, RouteDetails, RouteRecorder,
    RouteStore, RouteType,
};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "route-recorder", version, about = "Record GPS routes and save them to a route service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record a route from the configured location source
    Record(RecordArgs),
    /// List available serial ports
    Ports,
    /// Print the effective configuration
    Config {
        /// Also write it to the config file
        #[arg(long)]
        write: bool,
    },
}

#[derive(Args)]
struct RecordArgs {
    /// Location source: gpsd, serial or replay
    #[arg(long, value_parser = ["gpsd", "serial", "replay"])]
    source: Option<String>,
    /// Serial port for NMEA receivers
    #[arg(long)]
    port: Option<String>,
    #[arg(long)]
    baudrate: Option<u32>,
    #[arg(long)]
    gpsd_host: Option<String>,
    #[arg(long)]
    gpsd_port: Option<u16>,
    /// JSON-lines file of samples to replay
    #[arg(long)]
    replay: Option<PathBuf>,
    /// Route service base URL
    #[arg(long)]
    server: Option<String>,
    #[arg(long, env = "ROUTE_RECORDER_TOKEN")]
    token: Option<String>,
    /// Default route name used by `save` without an argument
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    public: bool,
    #[arg(long, value_enum, default_value_t = RouteType::Walking)]
    route_type: RouteType,
    /// Image uploaded after the route is created
    #[arg(long)]
    screenshot: Option<PathBuf>,
}

impl RecordArgs {
    fn apply(&self, config: &mut RecorderConfig) {
        if self.gpsd_host.is_some() || self.gpsd_port.is_some() {
            let host = self
                .gpsd_host
                .clone()
                .or_else(|| config.gpsd_host.clone())
                .unwrap_or_else(|| "localhost".to_string());
            let port = self.gpsd_port.or(config.gpsd_port).unwrap_or(2947);
            config.update_gpsd(host, port);
        }
        match self.source.as_deref() {
            Some("serial") => config.source_type = "serial".to_string(),
            Some("gpsd") => config.source_type = "gpsd".to_string(),
            Some("replay") => config.source_type = "replay".to_string(),
            _ => {}
        }
        if let Some(port) = &self.port {
            config.serial_port = Some(port.clone());
        }
        if let Some(baudrate) = self.baudrate {
            config.serial_baudrate = Some(baudrate);
        }
        if let Some(path) = &self.replay {
            config.update_replay(path.clone());
        }
        if let Some(server) = &self.server {
            config.update_api(server.clone(), self.token.clone());
        } else if self.token.is_some() {
            config.api_token = self.token.clone();
        }
    }

    fn details(&self, name: Option<&str>) -> RouteDetails {
        RouteDetails {
            name: name
                .map(str::to_string)
                .or_else(|| self.name.clone())
                .unwrap_or_default(),
            description: self.description.clone(),
            is_public: self.public,
            route_type: self.route_type,
            screenshot: self.screenshot.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = RecorderConfig::load().unwrap_or_else(|e| {
        warn!("{}; using defaults", e);
        RecorderConfig::default()
    });

    match cli.command {
        Command::Record(args) => {
            args.apply(&mut config);
            record(&config, &args).await
        }
        Command::Ports => {
            let ports = gps::list_serial_ports()?;
            if ports.is_empty() {
                println!("No serial ports found.");
            } else {
                println!("Available serial ports:");
                for port in ports {
                    println!("  {}", port);
                }
            }
            Ok(())
        }
        Command::Config { write } => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            if write {
                config.save().context("Failed to write config file")?;
                println!("Saved to {}", RecorderConfig::get_config_path()?.display());
            }
            Ok(())
        }
    }
}

async fn record(config: &RecorderConfig, args: &RecordArgs) -> anyhow::Result<()> {
    let source = LocationSource::from_config(config).context("Invalid location source")?;
    let store = HttpRouteStore::from_config(config)?;
    let mut recorder = RouteRecorder::with_rules(store, config.validation_rules());

    info!("Using {} source", config.source_type);
    let mut feed = Some(
        LocationFeed::open(&source)
            .await
            .context("Failed to open location source")?,
    );
    recorder.start()?;
    println!("Recording. Commands: pause, resume, stop, status, save [name], discard, quit");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            sample = next_sample(&mut feed) => match sample {
                Some(sample) => {
                    recorder.add_point(sample);
                }
                None => {
                    info!("Location source finished");
                    feed = None;
                    if recorder.is_recording() {
                        recorder.stop()?;
                        print_status(&recorder);
                        println!("Recording stopped. Use `save [name]` or `discard`.");
                    }
                }
            },
            line = stdin.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let mut words = line.trim().splitn(2, ' ');
                let command = words.next().unwrap_or_default();
                let argument = words.next().map(str::trim).filter(|a| !a.is_empty());

                match command {
                    "" => {}
                    "pause" => report(recorder.pause()),
                    "resume" => report(recorder.resume()),
                    "stop" => report(recorder.stop()),
                    "status" => print_status(&recorder),
                    "save" => match recorder.save(args.details(argument)).await {
                        Ok(route) => {
                            match route.id {
                                Some(id) => println!("Route saved with id {}", id),
                                None => println!("Route saved."),
                            }
                            break;
                        }
                        Err(e) => explain_save_failure(&e),
                    },
                    "discard" => {
                        if recorder.discard().is_ok() {
                            println!("Recording discarded.");
                            break;
                        }
                        println!("Nothing to discard.");
                    }
                    "quit" => {
                        discard_unsaved(&mut recorder);
                        break;
                    }
                    other => println!("Unknown command: {}", other),
                }
            },
            _ = tokio::signal::ctrl_c() => {
                if recorder.is_recording() {
                    recorder.stop()?;
                    print_status(&recorder);
                    println!("\nRecording stopped. Use `save [name]` or `discard`.");
                } else {
                    println!();
                    discard_unsaved(&mut recorder);
                    println!("Shutting down...");
                    break;
                }
            }
        }
    }

    if let Some(feed) = feed.take() {
        feed.close();
    }
    Ok(())
}

/// Next sample from the feed; never resolves once the feed is gone
async fn next_sample(feed: &mut Option<LocationFeed>) -> Option<GeoSample> {
    match feed {
        Some(feed) => feed.recv().await,
        None => std::future::pending().await,
    }
}

fn report(result: route_recorder::Result<()>) {
    if let Err(e) = result {
        println!("{}", e);
    }
}

/// Drop a session that was never saved, telling the user
fn discard_unsaved<S: RouteStore>(recorder: &mut RouteRecorder<S>) -> bool {
    if recorder.current_route().is_none() {
        return false;
    }
    report(recorder.discard());
    println!("Unsaved recording discarded.");
    true
}

fn print_status(recorder: &RouteRecorder<HttpRouteStore>) {
    match recorder.current_route() {
        Some(session) => println!(
            "[{}] {} points, {:.2} km, {}",
            recorder.state(),
            session.point_count(),
            session.distance_km(),
            session.format_duration()
        ),
        None => println!("[{}]", RecordingState::Idle),
    }
}

fn explain_save_failure(error: &RecorderError) {
    match error {
        RecorderError::Validation(reason) => println!("Cannot save yet: {}", reason),
        RecorderError::Network(_) => {
            println!("Server unreachable. Your recording is kept; try `save` again.")
        }
        RecorderError::Server { message, .. } => {
            println!("Server rejected the route: {}. Your recording is kept.", message)
        }
        other => println!("Save failed: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn recorder() -> RouteRecorder<HttpRouteStore> {
        let store = HttpRouteStore::new("http://127.0.0.1:9/api", None, Duration::from_secs(1)).unwrap();
        RouteRecorder::new(store)
    }

    #[test]
    fn test_discard_unsaved_on_exit() {
        let mut recorder = recorder();
        assert!(!discard_unsaved(&mut recorder));

        recorder.start().unwrap();
        recorder.stop().unwrap();
        assert!(discard_unsaved(&mut recorder));
        assert_eq!(recorder.state(), RecordingState::Idle);
        assert!(recorder.current_route().is_none());
    }

    #[test]
    fn test_gpsd_flags_select_gpsd_source() {
        let cli = Cli::parse_from(["route-recorder", "record", "--gpsd-host", "gps.local"]);
        let Command::Record(args) = cli.command else {
            panic!("expected record command");
        };
        let mut config = RecorderConfig::default();
        config.update_serial("/dev/ttyUSB0".to_string(), 4800);
        args.apply(&mut config);

        assert_eq!(config.source_type, "gpsd");
        assert_eq!(config.gpsd_host, Some("gps.local".to_string()));
        assert_eq!(config.gpsd_port, Some(2947));
    }
}
