use chrono::{DateTime, Local};
use serde::Serialize;

use crate::error::LookupError;
use crate::grade::Grade;
use crate::neighbor::HardwareAddress;
use crate::ping::ConnectivityRecord;
use crate::vendor::VendorRecord;

#[derive(Debug, Serialize)]
pub struct NeighborEntry {
    pub address: HardwareAddress,
    pub vendor: Option<VendorRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup_error: Option<String>,
}

impl NeighborEntry {
    pub fn new(
        address: HardwareAddress,
        lookup: Option<Result<VendorRecord, LookupError>>,
    ) -> Self {
        match lookup {
            Some(Ok(vendor)) => Self {
                address,
                vendor: Some(vendor),
                lookup_error: None,
            },
            Some(Err(e)) => Self {
                address,
                vendor: None,
                lookup_error: Some(e.to_string()),
            },
            None => Self {
                address,
                vendor: None,
                lookup_error: None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Connectivity {
    #[serde(flatten)]
    pub record: ConnectivityRecord,
    pub grade: Grade,
}

/// Everything one run found, printable as text or JSON.
#[derive(Debug, Serialize)]
pub struct SurveyReport {
    pub generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighbors: Option<Vec<NeighborEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connectivity: Option<Connectivity>,
}

impl SurveyReport {
    pub fn new(at: DateTime<Local>) -> Self {
        Self {
            generated_at: at.to_rfc3339(),
            neighbors: None,
            connectivity: None,
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = format!("Network survey at {}\n", self.generated_at);

        if let Some(neighbors) = &self.neighbors {
            out.push_str(&format!("\nNeighbors ({}):\n", neighbors.len()));
            for entry in neighbors {
                out.push_str(&format!("  {}\n", render_neighbor(entry)));
            }
        }

        if let Some(connectivity) = &self.connectivity {
            out.push_str(&render_connectivity(connectivity));
        }
        out
    }

    pub fn render_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn render_neighbor(entry: &NeighborEntry) -> String {
    match (&entry.vendor, &entry.lookup_error) {
        (Some(vendor), _) => {
            let location: Vec<&str> = [
                vendor.address_line1.as_str(),
                vendor.address_line2.as_str(),
                vendor.address_line3.as_str(),
                vendor.country.as_str(),
            ]
            .into_iter()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
            format!("{:<17}  {}  [{}]", entry.address, vendor.company, location.join(", "))
        }
        (None, Some(error)) => format!("{:<17}  (lookup failed: {error})", entry.address),
        (None, None) => entry.address.to_string(),
    }
}

fn render_connectivity(connectivity: &Connectivity) -> String {
    let record = &connectivity.record;
    let ms = |d: std::time::Duration| d.as_secs_f64() * 1000.0;
    let mut out = format!("\nConnectivity to {} ({}):\n", record.target, record.address);
    out.push_str(&format!("  Loss Rate: {:.1}%\n", record.packet_loss * 100.0));
    out.push_str(&format!(
        "  Latency min/avg/max/mdev: {:.3}/{:.3}/{:.3}/{:.3} ms\n",
        ms(record.latency.min),
        ms(record.latency.avg),
        ms(record.latency.max),
        ms(record.latency.mdev),
    ));
    out.push_str(&format!("  Grade: {}\n", connectivity.grade));
    out
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeZone;

    use super::*;
    use crate::neighbor::parse_neighbor_line;
    use crate::ping::LatencySummary;

    fn report() -> SurveyReport {
        let at = Local.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let mut report = SurveyReport::new(at);

        let address = parse_neighbor_line("? (10.0.0.1) at f0:d5:bf:00:00:01 [ether]").unwrap();
        let vendor = VendorRecord {
            company: "Intel Corporate".to_string(),
            address_line1: "Kulim".to_string(),
            country: "MALAYSIA".to_string(),
            ..VendorRecord::default()
        };
        report.neighbors = Some(vec![NeighborEntry::new(address, Some(Ok(vendor)))]);

        let record = ConnectivityRecord {
            target: "example.com".to_string(),
            address: "93.184.216.34".parse().unwrap(),
            packet_loss: 0.0,
            latency: LatencySummary {
                min: Duration::from_micros(10_100),
                avg: Duration::from_micros(11_200),
                max: Duration::from_micros(12_300),
                mdev: Duration::from_micros(800),
            },
        };
        report.connectivity = Some(Connectivity {
            record,
            grade: Grade::Green,
        });
        report
    }

    #[test]
    fn text_report_lists_neighbors_and_latency() {
        let text = report().render_text();

        assert!(text.contains("Neighbors (1):"));
        assert!(text.contains("Intel Corporate  [Kulim, MALAYSIA]"));
        assert!(text.contains("Connectivity to example.com (93.184.216.34)"));
        assert!(text.contains("10.100/11.200/12.300/0.800 ms"));
        assert!(text.contains("Grade: green (good)"));
    }

    #[test]
    fn json_report_uses_milliseconds() {
        let rendered = report().render_json().unwrap();
        let json: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        let connectivity = &json["connectivity"];
        assert_eq!(connectivity["address"], "93.184.216.34");
        assert_eq!(connectivity["grade"], "green");
        assert!((connectivity["latency"]["avg"].as_f64().unwrap() - 11.2).abs() < 1e-9);
        assert_eq!(json["neighbors"][0]["address"], "f0:d5:bf:00:00:01");
    }

    #[test]
    fn failed_lookups_are_reported_inline() {
        let address = parse_neighbor_line("? (10.0.0.2) at 00:11:22:33:44:55 [ether]").unwrap();
        let entry = NeighborEntry::new(address, Some(Err(LookupError::Status(429))));
        let line = render_neighbor(&entry);
        assert!(line.contains("lookup failed: vendor service answered with status 429"));
    }
}
