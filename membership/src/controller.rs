use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::commands::{handle_command, Command};
use crate::config::Config;
use crate::detector::FailureDetector;
use crate::mode::OperatingMode;
use crate::protocol::handle_message;
use crate::table::MembershipTable;
use crate::transport::UdpTransport;

/// Owns the membership table, operating mode, and transport exclusively —
/// the only component in the process with `&mut` access to any of them
/// (`spec.md` §5, single-owner concurrency model). Binds inbound datagrams,
/// the periodic heartbeat tick, and interactive stdin commands into one
/// event loop.
pub struct Controller {
    table: MembershipTable,
    mode: OperatingMode,
    config: Config,
    transport: UdpTransport,
    detector: FailureDetector,
}

impl Controller {
    pub fn new(table: MembershipTable, mode: OperatingMode, config: Config, transport: UdpTransport) -> Self {
        let detector = FailureDetector::new(config.clone());
        Self {
            table,
            mode,
            config,
            transport,
            detector,
        }
    }

    /// Runs until a `leave` command returns. Each iteration first runs the
    /// failure-detector scan, then services exactly one pending event —
    /// an inbound message, the tick, or an operator command — per
    /// `spec.md` §4.4.
    pub async fn run(mut self) -> crate::error::Result<()> {
        let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<String>();
        tokio::spawn(read_stdin_commands(cmd_tx));

        let mut ticker = interval(self.config.heartbeat_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            self.detector.scan_timeouts(&mut self.table, self.mode, Instant::now());

            tokio::select! {
                biased;

                maybe_line = cmd_rx.recv() => {
                    let Some(line) = maybe_line else { continue };
                    let outcome = handle_command(&mut self.table, &mut self.mode, &self.config, Command::parse(&line));
                    for line in &outcome.display {
                        println!("{line}");
                    }
                    for out in outcome.outbound {
                        self.transport.send(&out.message, &out.dest_addr).await;
                    }
                    if outcome.should_exit {
                        info!("Bandwidth used: {} bytes", self.transport.bandwidth_used());
                        return Ok(());
                    }
                }

                received = self.transport.recv() => {
                    match received {
                        Ok(message) => {
                            debug!("Dispatching {:?} from {}", message.method, message.sender_id);
                            let outbound = handle_message(&mut self.table, &mut self.mode, message, self.config.introducer);
                            for out in outbound {
                                self.transport.send(&out.message, &out.dest_addr).await;
                            }
                        }
                        Err(e) => error!("Dropped malformed datagram: {e}"),
                    }
                }

                _ = ticker.tick() => {
                    let outbound = self.detector.emit_heartbeats(&mut self.table, self.mode);
                    for out in outbound {
                        self.transport.send(&out.message, &out.dest_addr).await;
                    }
                }
            }
        }
    }
}

async fn read_stdin_commands(tx: mpsc::UnboundedSender<String>) {
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx.send(line).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                error!("stdin read error: {e}");
                break;
            }
        }
    }
}
