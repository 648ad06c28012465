use indexmap::IndexMap;
use rand::seq::SliceRandom;
use tokio::time::Instant;

use crate::codec::WireMember;
use crate::member::{MemberRecord, Status};

/// In-memory mapping from peer identity to member record. Single source of
/// truth for the group view (`spec.md` §3/§4.1). Backed by an `IndexMap` so
/// iteration order is stable within a tick for fair round-robin traversal,
/// unlike `std::collections::HashMap`.
///
/// Single-owner by convention: only the `Controller`'s event loop ever gets
/// a `&mut` reference, so no internal locking is needed (`spec.md` §5).
#[derive(Debug)]
pub struct MembershipTable {
    members: IndexMap<String, MemberRecord>,
    self_id: String,
}

impl MembershipTable {
    /// Creates a table with exactly one record: the self record, `RUNNING`
    /// with counter 0.
    pub fn new(self_id: impl Into<String>, self_addr: impl Into<String>) -> Self {
        let self_id = self_id.into();
        let mut members = IndexMap::new();
        members.insert(self_id.clone(), MemberRecord::new_self(self_id.clone(), self_addr));
        Self { members, self_id }
    }

    pub fn self_id(&self) -> &str {
        &self.self_id
    }

    pub fn self_addr(&self) -> &str {
        self.members
            .get(&self.self_id)
            .map(|m| m.addr.as_str())
            .unwrap_or_default()
    }

    pub fn get(&self, id: &str) -> Option<&MemberRecord> {
        self.members.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut MemberRecord> {
        self.members.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Renews a member on a direct ping/pong. A no-op for the self id — the
    /// self record is mutated only by the heartbeat tick.
    pub fn upsert_heartbeat(&mut self, id: &str, addr: &str) {
        if id == self.self_id {
            return;
        }
        match self.members.get_mut(id) {
            Some(member) => {
                member.addr = addr.to_string();
                member.heartbeat_counter += 1;
                member.timestamp = Instant::now();
            }
            None => {
                self.members
                    .insert(id.to_string(), MemberRecord::new_remote(id, addr));
            }
        }
    }

    /// Merges an incoming gossip snapshot. Never overwrites local `status`
    /// for a known member — status is authoritative locally. Ignores
    /// non-RUNNING unknowns, since they carry no useful liveness signal and
    /// would otherwise strand a FAILED/LEFT ghost that never gets cleaned up
    /// (nothing locally ever refreshes its timestamp to start the cleanup
    /// clock).
    pub fn merge_gossip(&mut self, incoming: &[WireMember]) {
        for member in incoming {
            if member.id == self.self_id {
                continue;
            }
            match self.members.get_mut(&member.id) {
                None => {
                    if member.status == Status::Running {
                        self.members.insert(
                            member.id.clone(),
                            MemberRecord::new_remote(member.id.clone(), member.addr.clone()),
                        );
                    }
                }
                Some(local) => {
                    if member.heartbeat_counter > local.heartbeat_counter {
                        local.heartbeat_counter = member.heartbeat_counter;
                        local.timestamp = Instant::now();
                    }
                }
            }
        }
    }

    /// Direct status mutation used by the detector (timeout -> FAILED) and
    /// leave handling (LEAVE -> LEFT). Refuses to mark the self record
    /// FAILED or LEFT: the self record is never mutated by local failure
    /// logic (`spec.md` §3, Self invariance).
    pub fn set_status(&mut self, id: &str, status: Status) {
        if id == self.self_id && status != Status::Running {
            return;
        }
        if let Some(member) = self.members.get_mut(id) {
            member.status = status;
            member.timestamp = Instant::now();
        }
    }

    pub fn remove(&mut self, id: &str) {
        self.members.shift_remove(id);
    }

    /// Applies a JOIN: marks the sender `RUNNING`, refreshes its address and
    /// timestamp, and resets its counter to 1 — distinct from
    /// [`Self::upsert_heartbeat`], which increments rather than resets.
    pub fn join(&mut self, id: &str, addr: &str) {
        match self.members.get_mut(id) {
            Some(member) => {
                member.addr = addr.to_string();
                member.status = Status::Running;
                member.heartbeat_counter = 1;
                member.timestamp = Instant::now();
            }
            None => {
                self.members
                    .insert(id.to_string(), MemberRecord::new_remote(id, addr));
            }
        }
    }

    /// SWITCH resets every record's counter to 0, including self.
    pub fn reset_all_counters(&mut self) {
        for member in self.members.values_mut() {
            member.heartbeat_counter = 0;
        }
    }

    /// Increments the self record's counter, used once per gossip round.
    pub fn increment_self_counter(&mut self) {
        if let Some(me) = self.members.get_mut(&self.self_id) {
            me.heartbeat_counter += 1;
            me.timestamp = Instant::now();
        }
    }

    /// Immutable copy of the table for serialization or display.
    pub fn snapshot(&self) -> Vec<MemberRecord> {
        self.members.values().cloned().collect()
    }

    /// Up to `k` records chosen uniformly at random, without replacement,
    /// from peers whose status is `RUNNING` and identity != self. Never
    /// returns the self record even if it is RUNNING.
    pub fn pick_random_active(&self, k: usize) -> Vec<MemberRecord> {
        let mut active: Vec<&MemberRecord> = self
            .members
            .values()
            .filter(|m| m.status == Status::Running && m.id != self.self_id)
            .collect();
        let mut rng = rand::thread_rng();
        active.shuffle(&mut rng);
        active.into_iter().take(k).cloned().collect()
    }

    /// All records except self whose status is `RUNNING`, used for
    /// all-to-all heartbeat fan-out and for broadcasting LEAVE/SWITCH.
    pub fn active_peers(&self) -> Vec<MemberRecord> {
        self.members
            .values()
            .filter(|m| m.status == Status::Running && m.id != self.self_id)
            .cloned()
            .collect()
    }

    /// Identities, addresses, and timestamps except self, for the failure
    /// detector's timeout scan. Returned as owned data so the detector can
    /// iterate while later calling back into `&mut self` methods.
    pub fn remote_ids(&self) -> Vec<String> {
        self.members
            .keys()
            .filter(|id| *id != &self.self_id)
            .cloned()
            .collect()
    }
}
