use std::time::Duration;

use netsurvey::{
    CannedLines, EchoState, Field, LineSource, MalformedLinePolicy, SurveyError,
    collect_hardware_addresses, parse_echo_output, parse_echo_text, parse_neighbor_line,
};
use pretty_assertions::assert_eq;

const ARP_LINUX: &str = include_str!("fixtures/arp_linux.txt");
const PING_LINUX: &str = include_str!("fixtures/ping_linux.txt");
const PING_MACOS: &str = include_str!("fixtures/ping_macos.txt");
const PING_PARTIAL_LOSS: &str = include_str!("fixtures/ping_linux_partial_loss.txt");
const PING_UNREACHABLE: &str = include_str!("fixtures/ping_linux_unreachable.txt");

#[test]
fn linux_neighbor_table() {
    let source = CannedLines::from_text(ARP_LINUX);
    let addresses = collect_hardware_addresses(source, MalformedLinePolicy::Skip).unwrap();
    let addresses: Vec<String> = addresses.iter().map(ToString::to_string).collect();

    assert_eq!(
        addresses,
        [
            "3c:84:6a:12:34:56",
            "f0:d5:bf:aa:bb:cc",
            "00:1b:a9:01:02:03",
            "02:42:ac:11:00:02",
        ]
    );
}

#[test]
fn strict_collection_stops_at_incomplete_entry() {
    let source = CannedLines::from_text(ARP_LINUX);
    let err = collect_hardware_addresses(source, MalformedLinePolicy::Abort).unwrap_err();
    match err {
        SurveyError::Format(e) => {
            assert_eq!(e.field, Field::HardwareAddress);
            assert!(e.line.contains("<incomplete>"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn single_line_contract() {
    let address = parse_neighbor_line("? (10.1.1.1) at AA:BB:CC:DD:EE:FF [ether] on eth0").unwrap();
    assert_eq!(address.as_str(), "AA:BB:CC:DD:EE:FF");
    assert!(parse_neighbor_line("AA:BB:CC:DD:EE:FF [ether]").is_err());
}

#[test]
fn linux_run() {
    let record = parse_echo_text("google.com", PING_LINUX).unwrap();

    assert_eq!(record.target, "google.com");
    assert_eq!(record.address.to_string(), "142.250.185.78");
    assert_eq!(record.packet_loss, 0.0);
    assert_eq!(record.latency.min, Duration::from_micros(13_912));
    assert_eq!(record.latency.avg, Duration::from_micros(14_234));
    assert_eq!(record.latency.max, Duration::from_micros(14_601));
    assert_eq!(record.latency.mdev, Duration::from_micros(283));
}

#[test]
fn macos_run() {
    let record = parse_echo_output("example.com", CannedLines::from_text(PING_MACOS)).unwrap();

    assert_eq!(record.address.to_string(), "93.184.216.34");
    assert_eq!(record.packet_loss, 0.0);
    assert_eq!(record.latency.min, Duration::from_micros(10_100));
    assert_eq!(record.latency.avg, Duration::from_micros(11_200));
    assert_eq!(record.latency.max, Duration::from_micros(12_300));
    assert_eq!(record.latency.mdev, Duration::from_micros(800));
}

#[test]
fn partial_loss_run() {
    let record = parse_echo_text("192.168.1.20", PING_PARTIAL_LOSS).unwrap();

    assert_eq!(record.packet_loss, 0.25);
    assert_eq!(record.success_rate(), 0.75);
    assert_eq!(record.latency.max, Duration::from_micros(4_050));
}

#[test]
fn unreachable_run_is_incomplete() {
    let err = parse_echo_text("10.255.255.1", PING_UNREACHABLE).unwrap_err();
    assert!(matches!(
        err,
        SurveyError::IncompleteOutput {
            state: EchoState::AwaitTimingSummary
        }
    ));
}

#[test]
fn runs_cut_short_report_their_state() {
    let cut: String = PING_LINUX.lines().take(3).map(|line| format!("{line}\n")).collect();
    let err = parse_echo_text("google.com", &cut).unwrap_err();
    assert!(matches!(
        err,
        SurveyError::IncompleteOutput {
            state: EchoState::AwaitSeparator
        }
    ));
}

#[test]
fn parsing_reads_no_further_than_the_timing_summary() {
    let mut source = CannedLines::from_text(&format!("{PING_MACOS}trailing line\n"));
    parse_echo_output("example.com", &mut source).unwrap();

    assert_eq!(source.next_line().unwrap().as_deref(), Some("trailing line"));
}
