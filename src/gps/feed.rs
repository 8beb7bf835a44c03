// src/gps/feed.rs
//! Location feed: pushes samples from a backend into a channel

use super::{gpsd, nmea::NmeaDecoder};
use crate::{
    config::RecorderConfig,
    error::{RecorderError, Result},
    track::GeoSample,
};
use log::{debug, info, warn};
use std::{path::PathBuf, time::Duration};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    sync::mpsc,
    task::JoinHandle,
};
use tokio_serial::SerialPortBuilderExt;

const CHANNEL_CAPACITY: usize = 256;

/// Where location samples come from
#[derive(Debug, Clone, PartialEq)]
pub enum LocationSource {
    Serial { port: String, baudrate: u32 },
    Gpsd { host: String, port: u16 },
    /// JSON-lines file of `GeoSample` records
    Replay { path: PathBuf },
}

impl LocationSource {
    pub fn from_config(config: &RecorderConfig) -> Result<Self> {
        match config.source_type.as_str() {
            "serial" => {
                let port = config.serial_port.clone().ok_or_else(|| {
                    RecorderError::Config("Serial source requires serial_port".to_string())
                })?;
                Ok(LocationSource::Serial {
                    port,
                    baudrate: config.serial_baudrate.unwrap_or(9600),
                })
            }
            "gpsd" => Ok(LocationSource::Gpsd {
                host: config.gpsd_host.clone().unwrap_or_else(|| "localhost".to_string()),
                port: config.gpsd_port.unwrap_or(2947),
            }),
            "replay" => {
                let path = config.replay_file.clone().ok_or_else(|| {
                    RecorderError::Config("Replay source requires replay_file".to_string())
                })?;
                Ok(LocationSource::Replay { path })
            }
            other => Err(RecorderError::Config(format!("Unknown source type: {}", other))),
        }
    }
}

/// Subscription to a location backend.
///
/// Samples arrive in the order the backend produced them. Dropping the
/// feed or calling [`LocationFeed::close`] stops the reader task.
pub struct LocationFeed {
    receiver: mpsc::Receiver<GeoSample>,
    task: JoinHandle<()>,
}

impl LocationFeed {
    /// Connect to the source and start forwarding samples
    pub async fn open(source: &LocationSource) -> Result<Self> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        let task = match source {
            LocationSource::Serial { port, baudrate } => {
                info!("Connecting to GPS on {} at {} baud...", port, baudrate);
                let serial = tokio_serial::new(port, *baudrate)
                    .timeout(Duration::from_millis(1000))
                    .open_native_async()
                    .map_err(|e| {
                        RecorderError::Connection(format!("Failed to open serial port {}: {}", port, e))
                    })?;
                info!("Connected successfully!");
                tokio::spawn(forward_nmea(BufReader::new(serial), tx))
            }
            LocationSource::Gpsd { host, port } => {
                info!("Connecting to gpsd at {}:{}...", host, port);
                let reader = gpsd::connect_gpsd(host, *port).await?;
                info!("Connected successfully!");
                tokio::spawn(forward_gpsd(reader, tx))
            }
            LocationSource::Replay { path } => {
                let file = tokio::fs::File::open(path).await.map_err(|e| {
                    RecorderError::Connection(format!("Failed to open replay file {}: {}", path.display(), e))
                })?;
                info!("Replaying samples from {}", path.display());
                tokio::spawn(forward_replay(BufReader::new(file), tx))
            }
        };

        Ok(Self { receiver: rx, task })
    }

    /// Next sample, or `None` once the source is exhausted or closed
    pub async fn recv(&mut self) -> Option<GeoSample> {
        self.receiver.recv().await
    }

    /// Stop the reader and discard anything still buffered
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.task.abort();
        self.receiver.close();
    }
}

impl Drop for LocationFeed {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn forward_nmea<R: AsyncBufRead + Unpin>(mut reader: R, tx: mpsc::Sender<GeoSample>) {
    let mut decoder = NmeaDecoder::new();
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break, // EOF
            Ok(_) => {
                if let Some(sample) = decoder.feed(&line) {
                    if tx.send(sample).await.is_err() {
                        break;
                    }
                }
            }
            Err(e) => {
                warn!("Error reading from serial port: {}", e);
                break;
            }
        }
    }
    debug!("NMEA reader finished");
}

async fn forward_gpsd<R: AsyncBufRead + Unpin>(mut reader: R, tx: mpsc::Sender<GeoSample>) {
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break, // EOF
            Ok(_) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match gpsd::parse_gpsd_json(line) {
                    Ok(Some(sample)) => {
                        if tx.send(sample).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!("Error parsing gpsd JSON: {}", e),
                }
            }
            Err(e) => {
                warn!("Error reading from gpsd: {}", e);
                break;
            }
        }
    }
    debug!("gpsd reader finished");
}

async fn forward_replay<R: AsyncBufRead + Unpin>(reader: R, tx: mpsc::Sender<GeoSample>) {
    let mut lines = reader.lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<GeoSample>(line) {
                    Ok(sample) => {
                        if tx.send(sample).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Skipping malformed replay line: {}", e),
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Error reading replay file: {}", e);
                break;
            }
        }
    }
    debug!("Replay finished");
}

/// List available serial ports
pub fn list_serial_ports() -> Result<Vec<String>> {
    let ports = tokio_serial::available_ports()?;

    Ok(ports
        .into_iter()
        .map(|port| format!("{} - {:?}", port.port_name, port.port_type))
        .collect())
}
