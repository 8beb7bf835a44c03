// src/gps/nmea.rs
//! NMEA sentence decoding into location samples

use crate::track::GeoSample;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

/// Stateful NMEA decoder.
///
/// `RMC` sentences carry date, time, position and speed, so each valid `RMC`
/// yields one sample. `GGA` only contributes altitude, which is attached to
/// the next `RMC`.
#[derive(Debug, Default)]
pub struct NmeaDecoder {
    altitude: Option<f64>,
    fix_quality: Option<u8>,
}

impl NmeaDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one sentence; returns a sample when the sentence completes a fix
    pub fn feed(&mut self, line: &str) -> Option<GeoSample> {
        let line = line.trim();
        let body = line.split('*').next().unwrap_or(line);
        let parts: Vec<&str> = body.split(',').collect();

        if line.starts_with("$GPGGA") || line.starts_with("$GNGGA") {
            self.parse_gga(&parts);
            None
        } else if line.starts_with("$GPRMC") || line.starts_with("$GNRMC") {
            self.parse_rmc(&parts)
        } else {
            None
        }
    }

    /// Last GGA fix quality (0 = no fix)
    pub fn fix_quality(&self) -> Option<u8> {
        self.fix_quality
    }

    fn parse_gga(&mut self, parts: &[&str]) {
        if parts.len() < 10 {
            return;
        }

        self.fix_quality = parts[6].parse::<u8>().ok();
        if self.fix_quality == Some(0) {
            self.altitude = None;
            return;
        }

        self.altitude = parts[9].parse::<f64>().ok();
    }

    fn parse_rmc(&mut self, parts: &[&str]) -> Option<GeoSample> {
        if parts.len() < 10 {
            return None;
        }

        // Status 'A' = active fix, 'V' = void
        if parts[2] != "A" {
            return None;
        }

        let latitude = parse_coordinate(parts[3], parts[4], "S")?;
        let longitude = parse_coordinate(parts[5], parts[6], "W")?;
        let time = parse_time(parts[1])?;
        let date = parse_date(parts[9])?;
        let timestamp = Utc.from_utc_datetime(&date.and_time(time));

        let mut sample = GeoSample::new(latitude, longitude, timestamp);

        // Speed over ground in knots (field 7)
        if let Ok(speed_knots) = parts[7].parse::<f64>() {
            sample = sample.with_speed(speed_knots * 1.852);
        }
        sample.elevation = self.altitude;

        Some(sample)
    }
}

/// `ddmm.mmmm` / `dddmm.mmmm` plus hemisphere into signed decimal degrees
fn parse_coordinate(value: &str, hemisphere: &str, negative: &str) -> Option<f64> {
    if value.is_empty() || hemisphere.is_empty() {
        return None;
    }

    let raw = value.parse::<f64>().ok()?;
    let degrees = (raw / 100.0).trunc();
    let minutes = raw - degrees * 100.0;
    let decimal = degrees + minutes / 60.0;

    Some(if hemisphere == negative { -decimal } else { decimal })
}

/// `hhmmss` or `hhmmss.sss`
fn parse_time(value: &str) -> Option<NaiveTime> {
    if value.len() < 6 {
        return None;
    }

    let hour = value.get(0..2)?.parse::<u32>().ok()?;
    let minute = value.get(2..4)?.parse::<u32>().ok()?;
    let seconds = value.get(4..)?.parse::<f64>().ok()?;
    let whole = seconds.trunc() as u32;
    let millis = ((seconds - seconds.trunc()) * 1000.0).round() as u32;

    NaiveTime::from_hms_milli_opt(hour, minute, whole, millis.min(999))
}

/// `ddmmyy`, years 00-79 map to 20xx
fn parse_date(value: &str) -> Option<NaiveDate> {
    if value.len() != 6 {
        return None;
    }

    let day = value.get(0..2)?.parse::<u32>().ok()?;
    let month = value.get(2..4)?.parse::<u32>().ok()?;
    let yy = value.get(4..6)?.parse::<i32>().ok()?;
    let year = if yy < 80 { 2000 + yy } else { 1900 + yy };

    NaiveDate::from_ymd_opt(year, month, day)
}
