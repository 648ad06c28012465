use tracing::{debug, info, warn};

use crate::codec::{decode_member_list, encode_member_list, Message, Method, WireMember};
use crate::member::Status;
use crate::mode::OperatingMode;
use crate::table::MembershipTable;

/// An outbound message produced by the handler, paired with its destination
/// address. The controller executes the actual send; the handler itself
/// never touches a socket (`spec.md` §9, Design Notes — pure reducer).
#[derive(Debug, Clone)]
pub struct Outbound {
    pub message: Message,
    pub dest_addr: String,
}

/// Reacts to one inbound message by mutating `table`/`mode` and returning
/// any messages that should be sent as a result. This is the "pure reducer"
/// the design notes call for: `(table, mode, message) -> (table', mode',
/// outbound_messages)`, expressed as in-place mutation plus a return value
/// rather than threading owned state through, which is the idiomatic Rust
/// equivalent.
pub fn handle_message(
    table: &mut MembershipTable,
    mode: &mut OperatingMode,
    message: Message,
    is_introducer: bool,
) -> Vec<Outbound> {
    match message.method {
        Method::Ping => handle_ping(table, mode, message),
        Method::Pong => handle_pong(table, message),
        Method::Join => handle_join(table, message, is_introducer),
        Method::Leave => handle_leave(table, message),
        Method::Switch => handle_switch(table, mode),
    }
}

fn handle_ping(table: &mut MembershipTable, mode: &OperatingMode, message: Message) -> Vec<Outbound> {
    match (mode, &message.payload) {
        (OperatingMode::Gossip, Some(payload)) => {
            match decode_member_list(payload) {
                Ok(incoming) => {
                    table.merge_gossip(&incoming);
                    debug!("Merged gossip from {}", message.sender_id);
                }
                Err(e) => warn!("Malformed gossip payload from {}: {e}", message.sender_id),
            }
            Vec::new()
        }
        (OperatingMode::AllToAll, None) => {
            table.upsert_heartbeat(&message.sender_id, &message.sender_addr);
            vec![Outbound {
                message: Message::new(Method::Pong, table.self_id().to_string(), table.self_addr().to_string()),
                dest_addr: message.sender_addr,
            }]
        }
        _ => {
            // A ping whose payload presence doesn't match our current mode:
            // normal in-flight traffic during a cluster-wide switch, not an
            // error. Drop silently rather than mutate the table.
            debug!(
                "Dropped a PING with mismatched heartbeating style from {} (normal during switch)",
                message.sender_id
            );
            Vec::new()
        }
    }
}

fn handle_pong(table: &mut MembershipTable, message: Message) -> Vec<Outbound> {
    table.upsert_heartbeat(&message.sender_id, &message.sender_addr);
    Vec::new()
}

fn handle_join(table: &mut MembershipTable, message: Message, is_introducer: bool) -> Vec<Outbound> {
    table.join(&message.sender_id, &message.sender_addr);

    let mut outbound = vec![Outbound {
        message: Message::new(Method::Pong, table.self_id().to_string(), table.self_addr().to_string()),
        dest_addr: message.sender_addr.clone(),
    }];

    if is_introducer {
        for peer in table.active_peers() {
            outbound.push(Outbound {
                message: Message::new(Method::Join, message.sender_id.clone(), message.sender_addr.clone()),
                dest_addr: peer.addr,
            });
        }
        info!("Introducer rebroadcast JOIN from {} to active peers", message.sender_id);
    }

    outbound
}

fn handle_leave(table: &mut MembershipTable, message: Message) -> Vec<Outbound> {
    table.set_status(&message.sender_id, Status::Left);
    info!("Process {} left the system", message.sender_id);
    Vec::new()
}

fn handle_switch(table: &mut MembershipTable, mode: &mut OperatingMode) -> Vec<Outbound> {
    mode.toggle();
    table.reset_all_counters();
    info!("Switched heartbeat style to {mode}");
    // Switch is not re-propagated on receipt; only the originating user
    // command broadcasts it, to avoid an infinite SWITCH storm.
    Vec::new()
}

/// Builds the gossip payload for a heartbeat round: the local membership
/// snapshot, wire-encoded.
pub fn snapshot_payload(table: &MembershipTable) -> crate::error::Result<Vec<u8>> {
    let wire_members: Vec<WireMember> = table.snapshot().iter().map(WireMember::from).collect();
    encode_member_list(&wire_members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_member_list;

    fn table() -> MembershipTable {
        MembershipTable::new("self@1", "127.0.0.1:9000")
    }

    #[test]
    fn ping_all_to_all__upserts_and_replies_pong() {
        let mut t = table();
        let mut mode = OperatingMode::AllToAll;
        let msg = Message::new(Method::Ping, "a@1", "127.0.0.1:9001");
        let out = handle_message(&mut t, &mut mode, msg, false);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].message.method, Method::Pong);
        assert_eq!(out[0].dest_addr, "127.0.0.1:9001");
        assert_eq!(t.get("a@1").unwrap().heartbeat_counter, 1);
    }

    #[test]
    fn ping_gossip__merges_payload_and_sends_nothing() {
        let mut t = table();
        let mut mode = OperatingMode::Gossip;
        let payload = encode_member_list(&[crate::codec::WireMember {
            id: "a@1".into(),
            addr: "127.0.0.1:9001".into(),
            heartbeat_counter: 1,
            status: Status::Running,
            timestamp: chrono::Utc::now(),
        }])
        .unwrap();
        let msg = Message::new(Method::Ping, "a@1", "127.0.0.1:9001").with_payload(payload);
        let out = handle_message(&mut t, &mut mode, msg, false);
        assert!(out.is_empty());
        assert!(t.get("a@1").is_some());
    }

    #[test]
    fn ping_mode_mismatch__dropped_silently() {
        let mut t = table();
        let mut mode = OperatingMode::Gossip;
        let msg = Message::new(Method::Ping, "a@1", "127.0.0.1:9001"); // no payload in gossip mode
        let out = handle_message(&mut t, &mut mode, msg, false);
        assert!(out.is_empty());
        assert!(t.get("a@1").is_none(), "mismatched ping must not mutate the table");

        let mut mode2 = OperatingMode::AllToAll;
        let payload = encode_member_list(&[]).unwrap();
        let msg2 = Message::new(Method::Ping, "b@1", "127.0.0.1:9002").with_payload(payload);
        let out2 = handle_message(&mut t, &mut mode2, msg2, false);
        assert!(out2.is_empty());
        assert!(t.get("b@1").is_none());
    }

    #[test]
    fn pong__upserts_without_reply() {
        let mut t = table();
        let mut mode = OperatingMode::AllToAll;
        let msg = Message::new(Method::Pong, "a@1", "127.0.0.1:9001");
        let out = handle_message(&mut t, &mut mode, msg, false);
        assert!(out.is_empty());
        assert_eq!(t.get("a@1").unwrap().heartbeat_counter, 1);
    }

    #[test]
    fn join__replies_pong_and_sets_running_counter_one() {
        let mut t = table();
        let mut mode = OperatingMode::AllToAll;
        let msg = Message::new(Method::Join, "a@1", "127.0.0.1:9001");
        let out = handle_message(&mut t, &mut mode, msg, false);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].message.method, Method::Pong);
        let a = t.get("a@1").unwrap();
        assert_eq!(a.status, Status::Running);
        assert_eq!(a.heartbeat_counter, 1);
    }

    #[test]
    fn join_as_introducer__rebroadcasts_to_active_peers() {
        let mut t = table();
        t.upsert_heartbeat("existing@1", "127.0.0.1:9002");
        let mut mode = OperatingMode::AllToAll;
        let msg = Message::new(Method::Join, "a@1", "127.0.0.1:9001");
        let out = handle_message(&mut t, &mut mode, msg, true);
        // 1 PONG to the new joiner, plus a JOIN rebroadcast to every active peer
        let joins: Vec<_> = out.iter().filter(|o| o.message.method == Method::Join).collect();
        assert!(joins.iter().any(|o| o.dest_addr == "127.0.0.1:9002"));
    }

    #[test]
    fn leave__marks_left() {
        let mut t = table();
        t.upsert_heartbeat("a@1", "127.0.0.1:9001");
        let mut mode = OperatingMode::AllToAll;
        let msg = Message::new(Method::Leave, "a@1", "127.0.0.1:9001");
        let out = handle_message(&mut t, &mut mode, msg, false);
        assert!(out.is_empty());
        assert_eq!(t.get("a@1").unwrap().status, Status::Left);
    }

    #[test]
    fn switch__toggles_mode_and_resets_counters_without_reply() {
        let mut t = table();
        t.upsert_heartbeat("a@1", "127.0.0.1:9001");
        let mut mode = OperatingMode::AllToAll;
        let msg = Message::new(Method::Switch, "a@1", "127.0.0.1:9001");
        let out = handle_message(&mut t, &mut mode, msg, false);
        assert!(out.is_empty());
        assert_eq!(mode, OperatingMode::Gossip);
        assert_eq!(t.get("a@1").unwrap().heartbeat_counter, 0);
        assert_eq!(t.get("self@1").unwrap().heartbeat_counter, 0);
    }
}
