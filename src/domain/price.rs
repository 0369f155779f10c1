//! Price series for the battery environment
//!
//! A `PriceSeries` is loaded once, validated, and then shared read-only
//! between environments (wrap it in an `Arc`).

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ArbError, Result};

/// Single market price observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    /// Price in $/MWh
    pub price: f64,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self { timestamp, price }
    }
}

/// Immutable, chronologically ordered price series
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
    source: String,
}

impl PriceSeries {
    /// Build a series, checking it is non-empty, finite and strictly ordered
    pub fn new(points: Vec<PricePoint>, source: impl Into<String>) -> Result<Self> {
        let source = source.into();

        if points.is_empty() {
            return Err(ArbError::Configuration(format!(
                "price series from '{}' is empty",
                source
            )));
        }

        for (i, point) in points.iter().enumerate() {
            if !point.price.is_finite() {
                return Err(ArbError::InvalidPriceData(format!(
                    "non-finite price at index {} in '{}'",
                    i, source
                )));
            }
        }

        if let Some(i) = points
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(ArbError::InvalidPriceData(format!(
                "timestamps not strictly increasing at index {} in '{}' ({} then {})",
                i + 1,
                source,
                points[i].timestamp,
                points[i + 1].timestamp
            )));
        }

        Ok(Self { points, source })
    }

    /// Load from a file, choosing the format by extension (`.json` or CSV)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Self::from_json_path(path)
        } else {
            Self::from_csv_path(path)
        }
    }

    /// Load a `timestamp,price` CSV file
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let series = Self::from_csv_str(&content, path.display().to_string())?;
        debug!("Loaded {} prices from {}", series.len(), path.display());
        Ok(series)
    }

    /// Load a JSON array of `{ "timestamp": ..., "price": ... }`
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let points: Vec<PricePoint> = serde_json::from_str(&content)?;
        let series = Self::new(points, path.display().to_string())?;
        debug!("Loaded {} prices from {}", series.len(), path.display());
        Ok(series)
    }

    /// Parse CSV text.
    ///
    /// An optional header row selects the timestamp and price columns by name
    /// (`timestamp`/`time`/`date` and `price`); without one the first two
    /// columns are used. Blank lines and `#` comments are skipped.
    pub fn from_csv_str(content: &str, source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let mut ts_col = 0usize;
        let mut price_col = 1usize;
        let mut points = Vec::new();
        let mut first_row = true;

        for (line_no, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split(',').map(|f| f.trim()).collect();

            if first_row {
                first_row = false;
                if let Some((ts, price)) = header_columns(&fields) {
                    ts_col = ts;
                    price_col = price;
                    continue;
                }
            }

            let (Some(ts_raw), Some(price_raw)) = (fields.get(ts_col), fields.get(price_col))
            else {
                return Err(ArbError::InvalidPriceData(format!(
                    "{}:{}: expected at least {} columns",
                    source,
                    line_no + 1,
                    ts_col.max(price_col) + 1
                )));
            };

            let timestamp = parse_timestamp(ts_raw).ok_or_else(|| {
                ArbError::InvalidPriceData(format!(
                    "{}:{}: unrecognised timestamp '{}'",
                    source,
                    line_no + 1,
                    ts_raw
                ))
            })?;
            let price = price_raw.parse::<f64>().map_err(|_| {
                ArbError::InvalidPriceData(format!(
                    "{}:{}: unparsable price '{}'",
                    source,
                    line_no + 1,
                    price_raw
                ))
            })?;

            points.push(PricePoint::new(timestamp, price));
        }

        Self::new(points, source)
    }

    /// Generate a deterministic synthetic series
    pub fn synthetic(config: &SyntheticPriceConfig) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let step = Duration::minutes(config.interval_minutes.max(1) as i64);
        let steps_per_day = (24.0 * 60.0 / config.interval_minutes.max(1) as f64).max(1.0);

        let points = (0..config.steps)
            .map(|i| {
                let phase = 2.0 * std::f64::consts::PI * (i as f64) / steps_per_day;
                // Evening peak, overnight trough
                let shape = -(phase.cos()) * 0.6 - (2.0 * phase).sin() * 0.4;

                // Box-Muller
                let u1: f64 = rng.gen::<f64>().max(1e-10);
                let u2: f64 = rng.gen();
                let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();

                let price = config.mean_price
                    + config.daily_amplitude * shape
                    + config.noise * config.mean_price * z;

                PricePoint::new(
                    config.start + step * i as i32,
                    price.max(config.floor),
                )
            })
            .collect();

        Self::new(points, format!("synthetic(seed={})", config.seed))
    }

    /// Render as `timestamp,price` CSV with a header row
    pub fn to_csv_string(&self) -> String {
        let mut out = String::from("timestamp,price\n");
        for point in &self.points {
            let _ = writeln!(out, "{},{}", point.timestamp.to_rfc3339(), point.price);
        }
        out
    }

    /// Write as CSV
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_csv_string())?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed series
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn point_at(&self, index: usize) -> Option<&PricePoint> {
        self.points.get(index)
    }

    pub fn price_at(&self, index: usize) -> Option<f64> {
        self.points.get(index).map(|p| p.price)
    }

    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.price)
    }

    /// Up to `len` prices ending at `end` (inclusive), oldest first
    pub fn window(&self, end: usize, len: usize) -> Vec<f64> {
        if self.points.is_empty() || len == 0 {
            return Vec::new();
        }
        let end = end.min(self.points.len() - 1);
        let start = (end + 1).saturating_sub(len);
        self.points[start..=end].iter().map(|p| p.price).collect()
    }

    pub fn mean_price(&self) -> f64 {
        self.prices().sum::<f64>() / self.points.len() as f64
    }
}

/// Detect a header row and return (timestamp column, price column)
fn header_columns(fields: &[&str]) -> Option<(usize, usize)> {
    let lower: Vec<String> = fields.iter().map(|f| f.to_ascii_lowercase()).collect();
    let price = lower.iter().position(|f| f == "price" || f.starts_with("price"))?;
    let ts = lower
        .iter()
        .position(|f| matches!(f.as_str(), "timestamp" | "time" | "date" | "datetime"))
        .unwrap_or(0);
    Some((ts, price))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|n| n.and_utc());
    }
    raw.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

/// Parameters for `PriceSeries::synthetic`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticPriceConfig {
    /// Number of points
    pub steps: usize,
    /// First timestamp
    pub start: DateTime<Utc>,
    /// Spacing between points
    pub interval_minutes: u32,
    /// Mean price ($/MWh)
    pub mean_price: f64,
    /// Amplitude of the daily shape ($/MWh)
    pub daily_amplitude: f64,
    /// Noise std dev as a fraction of the mean
    pub noise: f64,
    /// Price floor ($/MWh)
    pub floor: f64,
    pub seed: u64,
}

impl Default for SyntheticPriceConfig {
    fn default() -> Self {
        Self {
            steps: 24 * 14,
            // 2024-01-01T00:00:00Z
            start: DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(1_704_067_200),
            interval_minutes: 60,
            mean_price: 50.0,
            daily_amplitude: 20.0,
            noise: 0.08,
            floor: 5.0,
            seed: 42,
        }
    }
}
