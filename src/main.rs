use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Local;
use clap::{Args, Parser, Subcommand};
use netsurvey::report::{Connectivity, NeighborEntry, SurveyReport};
use netsurvey::{
    AppConfig, CommandLines, ConnectivityRecord, Grade, HardwareAddress, MacVendorClient,
    MalformedLinePolicy, PingExecutor, Result, SurveyError, collect_hardware_addresses, lookup_all,
    parse_echo_output,
};

#[derive(Parser)]
#[command(
    name = "netsurvey",
    version,
    about = "List ARP neighbors with their vendors and measure connectivity with ping"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Config file to use instead of the per-user one
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Write the effective settings back to the config file
    #[arg(long, global = true)]
    save_config: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Neighbors, then connectivity (default)
    All {
        #[command(flatten)]
        neighbors: NeighborArgs,
        #[command(flatten)]
        ping: PingArgs,
    },
    /// Neighbor table with vendor lookups
    Neighbors(NeighborArgs),
    /// Connectivity to the target
    Ping(PingArgs),
}

#[derive(Args, Default)]
struct NeighborArgs {
    /// Skip the vendor service
    #[arg(long)]
    no_lookup: bool,

    /// Fail on neighbor-table lines without an address instead of skipping them
    #[arg(long)]
    strict: bool,
}

#[derive(Args, Default)]
struct PingArgs {
    /// Host to ping
    #[arg(short, long)]
    target: Option<String>,

    /// Number of echo requests
    #[arg(short = 'c', long)]
    count: Option<u16>,

    /// Send ICMP echoes directly instead of running the ping utility
    #[arg(long)]
    native: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load(),
    };

    let (neighbors, ping) = match cli.command.unwrap_or(Command::All {
        neighbors: NeighborArgs::default(),
        ping: PingArgs::default(),
    }) {
        Command::All { neighbors, ping } => (Some(neighbors), Some(ping)),
        Command::Neighbors(neighbors) => (Some(neighbors), None),
        Command::Ping(ping) => (None, Some(ping)),
    };

    if let Some(ping) = &ping {
        if let Some(target) = &ping.target {
            config.target = target.clone();
        }
        if let Some(count) = ping.count {
            config.ping_count = count;
        }
    }
    config.validate()?;

    if cli.save_config {
        match &cli.config {
            Some(path) => config.save_to(path)?,
            None => config.save()?,
        }
    }

    let mut report = SurveyReport::new(Local::now());
    if let Some(args) = neighbors {
        report.neighbors = Some(survey_neighbors(&config, &args).await?);
    }
    if let Some(args) = ping {
        let record = measure_connectivity(&config, &args).await?;
        let grade = Grade::from_record(&record, &config.thresholds());
        report.connectivity = Some(Connectivity { record, grade });
    }

    if cli.json {
        let json = report
            .render_json()
            .map_err(|e| SurveyError::Io(io::Error::other(e)))?;
        println!("{json}");
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}

async fn survey_neighbors(config: &AppConfig, args: &NeighborArgs) -> Result<Vec<NeighborEntry>> {
    let policy = if args.strict {
        MalformedLinePolicy::Abort
    } else {
        MalformedLinePolicy::Skip
    };
    let addresses: Vec<HardwareAddress> =
        blocking(move || collect_hardware_addresses(CommandLines::arp_table()?, policy)).await?;

    if args.no_lookup {
        return Ok(addresses
            .into_iter()
            .map(|address| NeighborEntry::new(address, None))
            .collect());
    }

    let client = MacVendorClient::new(&config.vendor_endpoint, config.lookup_timeout())?;
    Ok(lookup_all(&client, &addresses)
        .await
        .into_iter()
        .map(|(address, result)| NeighborEntry::new(address, Some(result)))
        .collect())
}

async fn measure_connectivity(config: &AppConfig, args: &PingArgs) -> Result<ConnectivityRecord> {
    let target = config.target.clone();
    let count = config.ping_count;
    log::info!("pinging {target} ({count} probes)");

    if args.native {
        return PingExecutor::new(count, config.probe_interval())
            .probe(&target)
            .await;
    }
    blocking(move || parse_echo_output(&target, CommandLines::echo_test(&target, count)?)).await
}

/// Runs a utility-backed parse off the async workers.
async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| SurveyError::Io(io::Error::other(e)))?
}
