use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::ping::ConnectivityRecord;

/// Latency and loss limits used to grade a connectivity record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub green_ms: u64,
    pub yellow_ms: u64,
    /// Packet-loss fraction at or above which the link is graded red.
    pub loss: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            green_ms: 100,
            yellow_ms: 200,
            loss: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    Green,
    Yellow,
    Orange,
    Red,
}

impl Grade {
    pub fn from_record(record: &ConnectivityRecord, thresholds: &Thresholds) -> Self {
        if record.packet_loss >= thresholds.loss {
            return Grade::Red;
        }
        Self::from_latency(record.latency.avg, thresholds)
    }

    pub fn from_latency(avg: Duration, thresholds: &Thresholds) -> Self {
        match avg {
            t if t < Duration::from_millis(thresholds.green_ms) => Grade::Green,
            t if t < Duration::from_millis(thresholds.yellow_ms) => Grade::Yellow,
            _ => Grade::Orange,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Grade::Green => "good",
            Grade::Yellow => "fair",
            Grade::Orange => "slow",
            Grade::Red => "lossy",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Grade::Green => "green",
            Grade::Yellow => "yellow",
            Grade::Orange => "orange",
            Grade::Red => "red",
        };
        write!(f, "{name} ({})", self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ping::LatencySummary;

    fn record(avg_ms: u64, packet_loss: f64) -> ConnectivityRecord {
        let avg = Duration::from_millis(avg_ms);
        ConnectivityRecord {
            target: "example.com".to_string(),
            address: "93.184.216.34".parse().unwrap(),
            packet_loss,
            latency: LatencySummary {
                min: avg,
                avg,
                max: avg,
                mdev: Duration::ZERO,
            },
        }
    }

    #[test]
    fn latency_bands() {
        let thresholds = Thresholds::default();
        assert_eq!(Grade::from_record(&record(20, 0.0), &thresholds), Grade::Green);
        assert_eq!(Grade::from_record(&record(100, 0.0), &thresholds), Grade::Yellow);
        assert_eq!(Grade::from_record(&record(199, 0.0), &thresholds), Grade::Yellow);
        assert_eq!(Grade::from_record(&record(450, 0.0), &thresholds), Grade::Orange);
    }

    #[test]
    fn heavy_loss_overrides_latency() {
        let thresholds = Thresholds::default();
        assert_eq!(Grade::from_record(&record(5, 0.5), &thresholds), Grade::Red);
        assert_eq!(Grade::from_record(&record(5, 0.25), &thresholds), Grade::Green);
    }
}
