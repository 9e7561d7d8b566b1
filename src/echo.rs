//! Echo-test (`ping -c N`) output parsing.
//!
//! The output of one run is read as a small state machine:
//!
//! ```text
//! AwaitAddress        PING example.com (93.184.216.34): 56 data bytes
//! AwaitSeparator      64 bytes from 93.184.216.34: icmp_seq=0 ttl=55 time=11.2 ms
//!                     --- example.com ping statistics ---
//! AwaitLossSummary    3 packets transmitted, 3 packets received, 0.0% packet loss
//! AwaitTimingSummary  round-trip min/avg/max/stddev = 10.1/11.2/12.3/0.8 ms
//! Done
//! ```
//!
//! Each state knows exactly which line it expects and how to pull its fields
//! out, so a change in the utility's format is confined to one function.

use std::fmt;
use std::mem;
use std::net::IpAddr;
use std::time::Duration;

use crate::error::{Field, FormatError, Result, SurveyError};
use crate::numeric::{parse_millis, parse_percentage};
use crate::ping::{ConnectivityRecord, LatencySummary};
use crate::source::{CannedLines, LineSource};

const SEPARATOR: &str = "---";
const TIMING_MARKER: &str = " = ";

/// Which line of the echo-test output the parser is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoState {
    AwaitAddress,
    AwaitSeparator,
    AwaitLossSummary,
    AwaitTimingSummary,
    Done,
    /// A line did not match the layout its state expected.
    Failed,
}

impl fmt::Display for EchoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EchoState::AwaitAddress => "awaiting announcement line",
            EchoState::AwaitSeparator => "awaiting statistics separator",
            EchoState::AwaitLossSummary => "awaiting packet-loss summary",
            EchoState::AwaitTimingSummary => "awaiting timing summary",
            EchoState::Done => "done",
            EchoState::Failed => "failed on a malformed line",
        };
        f.write_str(name)
    }
}

// Each stage owns what has been extracted so far.
#[derive(Debug)]
enum Stage {
    AwaitAddress,
    AwaitSeparator { address: IpAddr },
    AwaitLossSummary { address: IpAddr },
    AwaitTimingSummary { address: IpAddr, packet_loss: f64 },
    Done { address: IpAddr, packet_loss: f64, latency: LatencySummary },
    Failed(FormatError),
}

/// Incremental parser for one echo-test run.
#[derive(Debug)]
pub struct EchoParser {
    target: String,
    stage: Stage,
}

impl EchoParser {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            stage: Stage::AwaitAddress,
        }
    }

    pub fn state(&self) -> EchoState {
        match self.stage {
            Stage::AwaitAddress => EchoState::AwaitAddress,
            Stage::AwaitSeparator { .. } => EchoState::AwaitSeparator,
            Stage::AwaitLossSummary { .. } => EchoState::AwaitLossSummary,
            Stage::AwaitTimingSummary { .. } => EchoState::AwaitTimingSummary,
            Stage::Done { .. } => EchoState::Done,
            Stage::Failed(_) => EchoState::Failed,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self.stage, Stage::Done { .. })
    }

    /// Consumes the next output line.
    ///
    /// After an error the parser is spent: later lines are ignored and
    /// [`finish`](Self::finish) returns that error again.
    pub fn feed(&mut self, line: &str) -> std::result::Result<(), FormatError> {
        let before = self.state();
        let next = match mem::replace(&mut self.stage, Stage::AwaitAddress) {
            Stage::AwaitAddress => on_announcement(line),
            Stage::AwaitSeparator { address } => Ok(on_intermediate(address, line)),
            Stage::AwaitLossSummary { address } => on_loss_summary(address, line),
            Stage::AwaitTimingSummary {
                address,
                packet_loss,
            } => on_timing_summary(address, packet_loss, line),
            spent @ (Stage::Done { .. } | Stage::Failed(_)) => Ok(spent),
        };
        match next {
            Ok(stage) => self.stage = stage,
            Err(e) => {
                log::debug!("{}: {before} -> failed: {e}", self.target);
                self.stage = Stage::Failed(e.clone());
                return Err(e);
            }
        }

        let after = self.state();
        if before != after {
            log::debug!("{}: {before} -> {after}", self.target);
        } else {
            log::trace!("{}: ignored {line:?}", self.target);
        }
        Ok(())
    }

    /// Builds the record, or reports how far the output got.
    ///
    /// A parser that failed on a malformed line returns that line's error.
    pub fn finish(self) -> Result<ConnectivityRecord> {
        let state = self.state();
        match self.stage {
            Stage::Done {
                address,
                packet_loss,
                latency,
            } => Ok(ConnectivityRecord {
                target: self.target,
                address,
                packet_loss,
                latency,
            }),
            Stage::Failed(e) => Err(e.into()),
            _ => Err(SurveyError::IncompleteOutput { state }),
        }
    }
}

fn on_announcement(line: &str) -> std::result::Result<Stage, FormatError> {
    let address = resolved_address(line)?;
    Ok(Stage::AwaitSeparator { address })
}

fn on_intermediate(address: IpAddr, line: &str) -> Stage {
    // Any line containing the separator counts, even a reply line that merely
    // happens to contain it.
    if line.contains(SEPARATOR) {
        Stage::AwaitLossSummary { address }
    } else {
        Stage::AwaitSeparator { address }
    }
}

fn on_loss_summary(address: IpAddr, line: &str) -> std::result::Result<Stage, FormatError> {
    let packet_loss = packet_loss(line)?;
    Ok(Stage::AwaitTimingSummary {
        address,
        packet_loss,
    })
}

fn on_timing_summary(
    address: IpAddr,
    packet_loss: f64,
    line: &str,
) -> std::result::Result<Stage, FormatError> {
    // Linux appends `pipe N` after the loss line when every probe errored.
    if !line.contains(TIMING_MARKER) {
        return Ok(Stage::AwaitTimingSummary {
            address,
            packet_loss,
        });
    }
    let latency = latency_summary(line)?;
    Ok(Stage::Done {
        address,
        packet_loss,
        latency,
    })
}

/// The third whitespace token of the announcement, e.g. `(93.184.216.34):`.
fn resolved_address(line: &str) -> std::result::Result<IpAddr, FormatError> {
    let token = line
        .split_whitespace()
        .nth(2)
        .ok_or_else(|| FormatError::new(Field::ResolvedAddress, line, "fewer than three tokens"))?;

    let trimmed = token
        .trim_start_matches('(')
        .trim_end_matches(':')
        .trim_end_matches(')');

    trimmed.parse().map_err(|_| {
        FormatError::new(
            Field::ResolvedAddress,
            line,
            format!("{trimmed:?} is not an IP address"),
        )
    })
}

/// The loss percentage of `3 packets transmitted, 3 received, 0% packet loss`.
fn packet_loss(line: &str) -> std::result::Result<f64, FormatError> {
    let invalid = |reason: String| FormatError::new(Field::PacketLoss, line, reason);

    let segment = loss_segment(line).ok_or_else(|| invalid("no packet-loss segment".into()))?;
    let token = segment
        .split(' ')
        .nth(1)
        .ok_or_else(|| invalid(format!("no percentage in {segment:?}")))?;
    let number = token
        .strip_suffix('%')
        .ok_or_else(|| invalid(format!("{token:?} is not a percentage")))?;

    let fraction = parse_percentage(number)
        .ok_or_else(|| invalid(format!("{number:?} is not a number")))?;
    if !(0.0..=1.0).contains(&fraction) {
        return Err(invalid(format!("{token} is outside 0-100%")));
    }
    Ok(fraction)
}

/// The third comma-separated segment, unless extra counters (`+3 errors`)
/// pushed the loss further right.
fn loss_segment(line: &str) -> Option<&str> {
    let segments: Vec<&str> = line.split(',').collect();
    match segments.get(2) {
        Some(segment) if segment.contains("packet loss") => Some(*segment),
        _ => segments
            .iter()
            .find(|segment| segment.contains("packet loss"))
            .copied()
            .or_else(|| segments.get(2).copied()),
    }
}

/// The fourth whitespace token of `rtt min/avg/max/mdev = 1.0/2.0/3.0/0.5 ms`.
fn latency_summary(line: &str) -> std::result::Result<LatencySummary, FormatError> {
    let token = line.split_whitespace().nth(3).ok_or_else(|| {
        FormatError::new(Field::MinLatency, line, "fewer than four tokens in timing summary")
    })?;

    let mut values = token.split('/');
    let mut next = |field: Field| -> std::result::Result<Duration, FormatError> {
        let text = values
            .next()
            .ok_or_else(|| FormatError::new(field, line, format!("missing from {token:?}")))?;
        parse_millis(text).ok_or_else(|| {
            FormatError::new(field, line, format!("{text:?} is not a millisecond value"))
        })
    };

    let min = next(Field::MinLatency)?;
    let avg = next(Field::AvgLatency)?;
    let max = next(Field::MaxLatency)?;
    let mdev = next(Field::MeanDeviation)?;
    Ok(LatencySummary { min, avg, max, mdev })
}

/// Parses a complete run, reading only as far as the timing summary.
pub fn parse_echo_output<S: LineSource>(target: &str, mut source: S) -> Result<ConnectivityRecord> {
    let mut parser = EchoParser::new(target);
    while !parser.is_done() {
        match source.next_line()? {
            Some(line) => parser.feed(&line)?,
            None => break,
        }
    }
    parser.finish()
}

/// Parses echo-test output that has already been captured as text.
pub fn parse_echo_text(target: &str, text: &str) -> Result<ConnectivityRecord> {
    parse_echo_output(target, CannedLines::from_text(text))
}
