use std::fmt;
use std::io;

use thiserror::Error;

use crate::echo::EchoState;

/// The piece of a line a parser was trying to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    HardwareAddress,
    ResolvedAddress,
    PacketLoss,
    MinLatency,
    AvgLatency,
    MaxLatency,
    MeanDeviation,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::HardwareAddress => "hardware address",
            Field::ResolvedAddress => "resolved address",
            Field::PacketLoss => "packet loss",
            Field::MinLatency => "minimum latency",
            Field::AvgLatency => "average latency",
            Field::MaxLatency => "maximum latency",
            Field::MeanDeviation => "mean deviation",
        };
        f.write_str(name)
    }
}

/// A line did not match the layout expected for its position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason} in line {line:?}")]
pub struct FormatError {
    pub field: Field,
    pub line: String,
    pub reason: String,
}

impl FormatError {
    pub fn new(field: Field, line: &str, reason: impl Into<String>) -> Self {
        Self {
            field,
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failures of the vendor lookup service, surfaced without interpretation.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("vendor request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("vendor service answered with status {0}")]
    Status(u16),

    #[error("malformed vendor response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("no vendor record for {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum SurveyError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("echo-test output ended early (state: {state})")]
    IncompleteOutput { state: EchoState },

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("could not resolve {0}")]
    Resolve(String),

    #[error("no echo replies from {target} after {sent} probes")]
    Unreachable { target: String, sent: u16 },
}

pub type Result<T> = std::result::Result<T, SurveyError>;
