use clap::Parser;
use color_eyre::eyre::Result;
use tracing::{info, Level};

use membership::config::Config;
use membership::controller::Controller;
use membership::mode::OperatingMode;
use membership::table::MembershipTable;
use membership::transport::UdpTransport;
use membership::member::generate_identity;

/// Group membership and failure-detection daemon. Runs one of two
/// interchangeable heartbeating strategies (all-to-all or push-style
/// gossip) and serves interactive commands over stdin.
#[derive(Parser, Debug)]
#[command(name = "membership-daemon", version, about)]
struct Cli {
    /// Local hostname or IP to bind.
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Local UDP port to bind.
    #[arg(long, default_value_t = 2333)]
    port: u16,

    /// Interpret `join` arguments as VM machine numbers instead of host:port pairs.
    #[arg(long)]
    vm: bool,

    /// Start as the group's introducer.
    #[arg(long)]
    introducer: bool,

    /// Lower the log filter to debug and dump every dispatched message.
    #[arg(long)]
    debug: bool,

    /// Start in gossip mode instead of all-to-all.
    #[arg(long)]
    gossip: bool,

    /// Simulated message loss rate in [0.0, 1.0], for failure-injection experiments.
    #[arg(long, default_value_t = 0.0)]
    experiment: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let _guards = telemetry::init_logger(telemetry::logging::LoggerConfig {
        log_level,
        ..Default::default()
    });

    let local_addr = format!("{}:{}", cli.host, cli.port);
    let local_id = generate_identity(&local_addr);
    info!("Starting as {local_id} ({local_addr})");

    let config = Config {
        local_id: local_id.clone(),
        local_addr: local_addr.clone(),
        introducer: cli.introducer,
        vm_mode: cli.vm,
        debug: cli.debug,
        gossip_mode: cli.gossip,
        loss_rate: cli.experiment,
        ..Config::default()
    };

    let table = MembershipTable::new(local_id, local_addr.clone());
    let mode = OperatingMode::from_gossip_flag(config.gossip_mode);

    let transport = UdpTransport::bind(&local_addr, &config).await?;
    info!("Listening on {local_addr}, heartbeat style: {mode}");

    let controller = Controller::new(table, mode, config, transport);
    controller.run().await?;

    Ok(())
}
