//! Hardware addresses from neighbor-table (`arp -a`) output.
//!
//! A usable line looks like `? (192.168.1.1) at aa:bb:cc:dd:ee:ff [ether] on eth0`.
//! The address is whatever sits between `) at ` and the following ` [`.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::error::{Field, FormatError, Result};
use crate::source::LineSource;

const ADDRESS_PREFIX: &str = ") at ";
const FLAGS_PREFIX: &str = " [";

/// A link-layer address token exactly as the neighbor table printed it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct HardwareAddress(String);

impl HardwareAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HardwareAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Extracts the hardware address from one neighbor-table line.
pub fn parse_neighbor_line(line: &str) -> std::result::Result<HardwareAddress, FormatError> {
    let layout_error = |missing: &str| {
        FormatError::new(
            Field::HardwareAddress,
            line,
            format!("line does not match expected neighbor-table layout (missing {missing:?})"),
        )
    };

    let (_, rest) = line
        .split_once(ADDRESS_PREFIX)
        .ok_or_else(|| layout_error(ADDRESS_PREFIX))?;
    let (candidate, _) = rest
        .split_once(FLAGS_PREFIX)
        .ok_or_else(|| layout_error(FLAGS_PREFIX))?;

    let address = candidate.trim();
    if address.is_empty() {
        return Err(FormatError::new(Field::HardwareAddress, line, "empty address"));
    }
    if address.contains(char::REPLACEMENT_CHARACTER) {
        return Err(FormatError::new(Field::HardwareAddress, line, "address is not valid text"));
    }
    Ok(HardwareAddress(address.to_string()))
}

/// What to do with a line that has no recognizable address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedLinePolicy {
    /// Log the line and keep reading.
    #[default]
    Skip,
    /// Stop and return the line's error.
    Abort,
}

/// Reads a whole neighbor table and returns its distinct addresses in first-seen order.
pub fn collect_hardware_addresses<S: LineSource>(
    mut source: S,
    policy: MalformedLinePolicy,
) -> Result<Vec<HardwareAddress>> {
    let mut seen = HashSet::new();
    let mut addresses = Vec::new();

    while let Some(line) = source.next_line()? {
        match parse_neighbor_line(&line) {
            Ok(address) => {
                if seen.insert(address.clone()) {
                    addresses.push(address);
                } else {
                    log::debug!("duplicate neighbor {address}");
                }
            }
            Err(e) if policy == MalformedLinePolicy::Skip => {
                log::warn!("skipping neighbor-table line: {e}");
            }
            Err(e) => return Err(e.into()),
        }
    }

    log::info!("found {} neighbors", addresses.len());
    Ok(addresses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SurveyError;
    use crate::source::CannedLines;

    #[test]
    fn extracts_address_between_markers() {
        let line = "? (192.168.1.1) at AA:BB:CC:DD:EE:FF [ether] on eth0";
        assert_eq!(parse_neighbor_line(line).unwrap().as_str(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn surrounding_text_is_unconstrained() {
        let line = "router.lan (10.0.0.1) at 0:1b:2c:3d:4e:5f [ethernet]";
        assert_eq!(parse_neighbor_line(line).unwrap().as_str(), "0:1b:2c:3d:4e:5f");
    }

    #[test]
    fn missing_at_marker_is_a_format_error() {
        let err = parse_neighbor_line("? (192.168.1.1) AA:BB:CC:DD:EE:FF [ether]").unwrap_err();
        assert_eq!(err.field, Field::HardwareAddress);
        assert!(err.reason.contains(") at "));
    }

    #[test]
    fn missing_flags_marker_is_a_format_error() {
        let err = parse_neighbor_line("? (10.0.0.5) at <incomplete> on eth0").unwrap_err();
        assert!(err.reason.contains(" ["));
    }

    #[test]
    fn empty_address_is_rejected() {
        assert!(parse_neighbor_line("? (10.0.0.5) at  [ether]").is_err());
    }

    #[test]
    fn undecodable_address_is_rejected() {
        let err = parse_neighbor_line("? (10.0.0.9) at \u{fffd}\u{fffd} [ether]").unwrap_err();
        assert_eq!(err.field, Field::HardwareAddress);
    }

    #[test]
    fn collection_skips_malformed_lines_and_duplicates() {
        let source = CannedLines::new([
            "? (192.168.1.1) at aa:bb:cc:dd:ee:01 [ether] on eth0",
            "? (192.168.1.7) at <incomplete> on eth0",
            "? (192.168.1.9) at aa:bb:cc:dd:ee:02 [ether] on eth0",
            "? (192.168.1.1) at aa:bb:cc:dd:ee:01 [ether] on wlan0",
        ]);

        let addresses = collect_hardware_addresses(source, MalformedLinePolicy::Skip).unwrap();
        let addresses: Vec<&str> = addresses.iter().map(HardwareAddress::as_str).collect();
        assert_eq!(addresses, ["aa:bb:cc:dd:ee:01", "aa:bb:cc:dd:ee:02"]);
    }

    #[test]
    fn collection_can_abort_on_first_malformed_line() {
        let source = CannedLines::new([
            "? (192.168.1.1) at aa:bb:cc:dd:ee:01 [ether] on eth0",
            "garbage",
        ]);

        let result = collect_hardware_addresses(source, MalformedLinePolicy::Abort);
        assert!(matches!(result, Err(SurveyError::Format(_))));
    }
}
