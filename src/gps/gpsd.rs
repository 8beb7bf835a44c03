// src/gps/gpsd.rs
//! GPSD client implementation

use crate::error::{RecorderError, Result};
use crate::track::GeoSample;
use chrono::{DateTime, Utc};
use log::info;
use serde::Deserialize;
use std::collections::HashMap;
use tokio::{
    io::{AsyncWriteExt, BufReader},
    net::TcpStream,
};

#[derive(Debug, Deserialize)]
struct GpsdMessage {
    class: String,
    #[serde(flatten)]
    data: HashMap<String, serde_json::Value>,
}

/// Connect to a gpsd daemon and return a stream reader
pub async fn connect_gpsd(host: &str, port: u16) -> Result<BufReader<TcpStream>> {
    let mut stream = TcpStream::connect(format!("{}:{}", host, port))
        .await
        .map_err(|e| RecorderError::Connection(format!("Failed to connect to gpsd at {}:{}: {}", host, port, e)))?;

    // Send WATCH command to start receiving JSON data
    let watch_cmd = "?WATCH={\"enable\":true,\"json\":true}\n";
    stream
        .write_all(watch_cmd.as_bytes())
        .await
        .map_err(|e| RecorderError::Connection(format!("Failed to send WATCH command: {}", e)))?;

    Ok(BufReader::new(stream))
}

/// Parse a single line of gpsd JSON.
///
/// Returns a sample for `TPV` reports with at least a 2D fix; other
/// message classes are informational.
pub fn parse_gpsd_json(line: &str) -> Result<Option<GeoSample>> {
    let msg: GpsdMessage = serde_json::from_str(line)
        .map_err(|e| RecorderError::Parse(format!("Failed to parse gpsd JSON: {}", e)))?;

    let sample = match msg.class.as_str() {
        "TPV" => parse_tpv_message(&msg.data),
        "VERSION" => {
            parse_version_message(&msg.data);
            None
        }
        "DEVICES" => {
            parse_devices_message(&msg.data);
            None
        }
        _ => None,
    };

    Ok(sample)
}

/// Parse TPV (Time Position Velocity) message
fn parse_tpv_message(msg_data: &HashMap<String, serde_json::Value>) -> Option<GeoSample> {
    // mode: 0/1 = no fix, 2 = 2D, 3 = 3D
    let mode = msg_data.get("mode").and_then(|v| v.as_u64()).unwrap_or(0);
    if mode < 2 {
        return None;
    }

    let lat = msg_data.get("lat").and_then(|v| v.as_f64())?;
    let lon = msg_data.get("lon").and_then(|v| v.as_f64())?;

    let timestamp = msg_data
        .get("time")
        .and_then(|v| v.as_str())
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    let mut sample = GeoSample::new(lat, lon, timestamp);

    if mode >= 3 {
        sample.elevation = msg_data.get("alt").and_then(|v| v.as_f64());
    }

    if let Some(speed) = msg_data.get("speed").and_then(|v| v.as_f64()) {
        sample = sample.with_speed(speed * 3.6); // Convert m/s to km/h
    }

    Some(sample)
}

/// Parse VERSION message (informational)
fn parse_version_message(msg_data: &HashMap<String, serde_json::Value>) {
    if let Some(version) = msg_data.get("release").and_then(|v| v.as_str()) {
        info!("Connected to gpsd version: {}", version);
    }
}

/// Parse DEVICES message (informational)
fn parse_devices_message(msg_data: &HashMap<String, serde_json::Value>) {
    if let Some(devices) = msg_data.get("devices").and_then(|v| v.as_array()) {
        info!("gpsd managing {} device(s)", devices.len());
        for device in devices {
            if let Some(path) = device.get("path").and_then(|v| v.as_str()) {
                info!("  Device: {}", path);
            }
        }
    }
}
