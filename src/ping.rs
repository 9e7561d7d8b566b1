use std::net::IpAddr;
use std::time::Duration;

use serde::Serialize;

use crate::numeric::millis;

/// Round-trip latency statistics of one echo-test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LatencySummary {
    #[serde(with = "millis")]
    pub min: Duration,
    #[serde(with = "millis")]
    pub avg: Duration,
    #[serde(with = "millis")]
    pub max: Duration,
    #[serde(with = "millis")]
    pub mdev: Duration,
}

impl LatencySummary {
    /// Summarizes individual round-trip samples the way `ping` does.
    ///
    /// `mdev` is `sqrt(mean(x^2) - mean(x)^2)`. Returns `None` for no samples.
    pub fn from_samples(samples: &[Duration]) -> Option<Self> {
        let min = samples.iter().min().copied()?;
        let max = samples.iter().max().copied()?;
        let count = u32::try_from(samples.len()).ok()?;

        let total: Duration = samples.iter().sum();
        let avg = total / count;

        // Nanosecond floats stay exact for realistic round-trip times.
        let nanos = |d: &Duration| d.as_nanos() as f64;
        let mean = nanos(&total) / f64::from(count);
        let mean_sq = samples.iter().map(|s| nanos(s).powi(2)).sum::<f64>() / f64::from(count);
        let variance = (mean_sq - mean * mean).max(0.0);
        let mdev = Duration::from_nanos(variance.sqrt().round() as u64);

        Some(Self { min, avg, max, mdev })
    }
}

/// The result of one echo test against a target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectivityRecord {
    pub target: String,
    pub address: IpAddr,
    /// Fraction of probes lost, always within `0.0..=1.0`.
    pub packet_loss: f64,
    pub latency: LatencySummary,
}

impl ConnectivityRecord {
    pub fn success_rate(&self) -> f64 {
        1.0 - self.packet_loss
    }
}
