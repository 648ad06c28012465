use tokio::time::{Duration, Instant};
use tracing::info;

use crate::codec::{Message, Method};
use crate::config::Config;
use crate::member::Status;
use crate::mode::OperatingMode;
use crate::protocol::{snapshot_payload, Outbound};
use crate::table::MembershipTable;

/// Periodic tick that scans for timeouts, then emits heartbeats, per the
/// active strategy (`spec.md` §4.3). Timeout detection always runs before
/// heartbeat emission so a peer marked FAILED this tick is not pinged this
/// tick.
pub struct FailureDetector {
    config: Config,
}

impl FailureDetector {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn timeout_for(&self, mode: OperatingMode) -> Duration {
        match mode {
            OperatingMode::AllToAll => self.config.all_to_all_timeout,
            OperatingMode::Gossip => self.config.gossip_timeout,
        }
    }

    /// Removes FAILED/LEFT records past the cleanup delay, then marks timed
    /// out RUNNING records FAILED. Uses a single `now` sampled once at the
    /// start of the scan so every comparison in this tick shares a
    /// reference, rather than drifting across the scan's duration.
    pub fn scan_timeouts(&self, table: &mut MembershipTable, mode: OperatingMode, now: Instant) {
        let timeout = self.timeout_for(mode);
        for id in table.remote_ids() {
            let Some(member) = table.get(&id) else { continue };
            let elapsed = now.saturating_duration_since(member.timestamp);
            match member.status {
                Status::Failed | Status::Left => {
                    if elapsed > self.config.cleanup_delay {
                        table.remove(&id);
                    }
                }
                Status::Running => {
                    if elapsed > timeout {
                        table.set_status(&id, Status::Failed);
                        info!("Host {id} failed");
                    }
                }
            }
        }
    }

    /// Emits this tick's heartbeats per the active strategy.
    pub fn emit_heartbeats(&self, table: &mut MembershipTable, mode: OperatingMode) -> Vec<Outbound> {
        match mode {
            OperatingMode::AllToAll => self.all_to_all_heartbeat(table),
            OperatingMode::Gossip => self.gossip_heartbeat(table),
        }
    }

    fn all_to_all_heartbeat(&self, table: &MembershipTable) -> Vec<Outbound> {
        table
            .active_peers()
            .into_iter()
            .map(|peer| Outbound {
                message: Message::new(Method::Ping, table.self_id().to_string(), table.self_addr().to_string()),
                dest_addr: peer.addr,
            })
            .collect()
    }

    fn gossip_heartbeat(&self, table: &mut MembershipTable) -> Vec<Outbound> {
        table.increment_self_counter();
        let payload = match snapshot_payload(table) {
            Ok(bytes) => bytes,
            Err(_) => return Vec::new(),
        };
        table
            .pick_random_active(self.config.gossip_fanout)
            .into_iter()
            .map(|peer| Outbound {
                message: Message::new(Method::Ping, table.self_id().to_string(), table.self_addr().to_string())
                    .with_payload(payload.clone()),
                dest_addr: peer.addr,
            })
            .collect()
    }
}
