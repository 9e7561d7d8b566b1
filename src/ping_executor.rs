use std::net::IpAddr;
use std::time::Duration;

use surge_ping::{Client, Config, ICMP, IcmpPacket, PingIdentifier, PingSequence};

use crate::error::{Result, SurveyError};
use crate::ping::{ConnectivityRecord, LatencySummary};

const PING_TIMEOUT_SECS: u64 = 5;
const PAYLOAD: [u8; 56] = [0; 56];

/// Sanitize hostname by keeping only valid characters (alphanumeric, dots, hyphens)
/// Returns None if the result is empty
fn sanitize_hostname(hostname: &str) -> Option<String> {
    // Also handle case where user included port like "example.com:8080"
    let hostname = hostname.split(':').next().unwrap_or(hostname);

    let sanitized: String = hostname
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '.' || *c == '-')
        .collect();

    if sanitized.is_empty() {
        None
    } else {
        Some(sanitized)
    }
}

/// Echo test over a raw ICMP socket instead of the `ping` utility.
///
/// Needs the privileges surge-ping needs (root, or an unprivileged ICMP
/// socket range that covers the current group on Linux).
pub struct PingExecutor {
    count: u16,
    interval: Duration,
}

impl PingExecutor {
    pub fn new(count: u16, interval: Duration) -> Self {
        Self { count, interval }
    }

    /// Resolves the target and sends `count` echoes to it.
    pub async fn probe(&self, target: &str) -> Result<ConnectivityRecord> {
        let address = Self::resolve_target(target).await?;
        let samples = self.execute_pings(address).await?;
        summarize(target, address, self.count, &samples)
    }

    /// Resolve hostname to IP address
    async fn resolve_target(target: &str) -> Result<IpAddr> {
        // Try parsing as IP address first
        if let Ok(ip) = target.parse::<IpAddr>() {
            return Ok(ip);
        }

        let sanitized =
            sanitize_hostname(target).ok_or_else(|| SurveyError::Resolve(target.to_string()))?;

        let mut addrs = tokio::net::lookup_host(format!("{sanitized}:80")).await?;
        addrs
            .next()
            .map(|addr| addr.ip())
            .ok_or_else(|| SurveyError::Resolve(target.to_string()))
    }

    /// Sends the echoes one interval apart; lost probes are left out.
    async fn execute_pings(&self, address: IpAddr) -> Result<Vec<Duration>> {
        let config = match address {
            IpAddr::V4(_) => Config::default(),
            IpAddr::V6(_) => Config::builder().kind(ICMP::V6).build(),
        };
        let client = Client::new(&config)?;

        let mut pinger = client.pinger(address, PingIdentifier(std::process::id() as u16)).await;
        pinger.timeout(Duration::from_secs(PING_TIMEOUT_SECS));

        let mut samples = Vec::with_capacity(usize::from(self.count));
        for seq in 0..self.count {
            if seq > 0 {
                tokio::time::sleep(self.interval).await;
            }
            match pinger.ping(PingSequence(seq), &PAYLOAD).await {
                Ok((IcmpPacket::V4(_), rtt)) | Ok((IcmpPacket::V6(_), rtt)) => {
                    log::debug!("reply from {address}: icmp_seq={seq} time={rtt:?}");
                    samples.push(rtt);
                }
                Err(e) => log::debug!("no reply from {address} for icmp_seq={seq}: {e}"),
            }
        }
        Ok(samples)
    }
}

/// Turns the replies of `sent` probes into a record; no replies is an error.
fn summarize(
    target: &str,
    address: IpAddr,
    sent: u16,
    samples: &[Duration],
) -> Result<ConnectivityRecord> {
    let latency = LatencySummary::from_samples(samples).ok_or_else(|| SurveyError::Unreachable {
        target: target.to_string(),
        sent,
    })?;
    let lost = usize::from(sent).saturating_sub(samples.len());

    Ok(ConnectivityRecord {
        target: target.to_string(),
        address,
        packet_loss: lost as f64 / f64::from(sent),
        latency,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostnames_are_sanitized() {
        assert_eq!(sanitize_hostname("example.com:8080").as_deref(), Some("example.com"));
        assert_eq!(sanitize_hostname("exa mple.com;rm").as_deref(), Some("example.comrm"));
        assert_eq!(sanitize_hostname("!!!"), None);
    }

    #[test]
    fn partial_replies_count_as_loss() {
        let address: IpAddr = "192.0.2.1".parse().unwrap();
        let samples = [Duration::from_millis(10), Duration::from_millis(30)];

        let record = summarize("192.0.2.1", address, 4, &samples).unwrap();

        assert_eq!(record.packet_loss, 0.5);
        assert_eq!(record.latency.min, Duration::from_millis(10));
        assert_eq!(record.latency.avg, Duration::from_millis(20));
        assert_eq!(record.latency.max, Duration::from_millis(30));
        assert_eq!(record.latency.mdev, Duration::from_millis(10));
    }

    #[test]
    fn no_replies_is_unreachable() {
        let address: IpAddr = "192.0.2.1".parse().unwrap();
        let err = summarize("192.0.2.1", address, 3, &[]).unwrap_err();
        assert!(matches!(err, SurveyError::Unreachable { sent: 3, .. }));
    }

    #[tokio::test]
    async fn ip_literals_skip_resolution() {
        let ip = PingExecutor::resolve_target("127.0.0.1").await.unwrap();
        assert_eq!(ip, "127.0.0.1".parse::<IpAddr>().unwrap());
    }
}
