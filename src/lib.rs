//! Local network survey: ARP neighbors with vendor metadata, plus echo-test
//! connectivity to a target host.
//!
//! The parsers ([`neighbor`], [`echo`]) only see lines of text through
//! [`LineSource`]; spawning `arp`/`ping` and talking to the vendor service
//! live in [`source`] and [`vendor`].

pub mod config;
pub mod echo;
pub mod error;
pub mod grade;
pub mod neighbor;
pub mod numeric;
pub mod ping;
pub mod ping_executor;
pub mod report;
pub mod source;
pub mod vendor;

pub use config::AppConfig;
pub use echo::{EchoParser, EchoState, parse_echo_output, parse_echo_text};
pub use error::{Field, FormatError, LookupError, Result, SurveyError};
pub use grade::{Grade, Thresholds};
pub use neighbor::{
    HardwareAddress, MalformedLinePolicy, collect_hardware_addresses, parse_neighbor_line,
};
pub use ping::{ConnectivityRecord, LatencySummary};
pub use ping_executor::PingExecutor;
pub use source::{CannedLines, CommandLines, LineSource, ReaderLines};
pub use vendor::{MacVendorClient, VendorLookup, VendorRecord, lookup_all};
