use tracing::info;

use crate::codec::{Message, Method};
use crate::config::Config;
use crate::mode::OperatingMode;
use crate::protocol::Outbound;
use crate::table::MembershipTable;

/// One line of interactive operator input, parsed into a typed command
/// (`spec.md` §4.4, User Commands).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Join(String),
    Leave,
    Switch,
    DisplayMembers,
    DisplayId,
    Send(String, String),
    Unrecognized(String),
}

impl Command {
    pub fn parse(line: &str) -> Command {
        let line = line.trim();
        let mut parts = line.splitn(2, char::is_whitespace);
        let verb = parts.next().unwrap_or("").to_lowercase();
        let rest = parts.next().unwrap_or("").trim();
        match verb.as_str() {
            "join" => Command::Join(rest.to_string()),
            "leave" => Command::Leave,
            "switch" => Command::Switch,
            "display" => match rest {
                "id" => Command::DisplayId,
                _ => Command::DisplayMembers,
            },
            "send" => {
                let mut send_parts = rest.splitn(2, char::is_whitespace);
                let addr = send_parts.next().unwrap_or("").to_string();
                let text = send_parts.next().unwrap_or("").to_string();
                Command::Send(addr, text)
            }
            _ => Command::Unrecognized(line.to_string()),
        }
    }
}

/// Maps a `join` argument to a dialable address. In VM mode the operator
/// supplies a machine number and the introducer's port as two whitespace
/// separated tokens (`original_source/command.go`: `vmNumber :=
/// Payload[0]; vmPort := Payload[1]`), mapped to the conventional hostname
/// template the original course deployment used (`spec.md` §6). Outside VM
/// mode the first token is already a `host:port` pair.
pub fn resolve_join_target(arg: &str, vm_mode: bool) -> String {
    let mut tokens = arg.split_whitespace();
    let first = tokens.next().unwrap_or("");
    if vm_mode {
        if let (Ok(n), Some(port)) = (first.parse::<u32>(), tokens.next()) {
            return format!("fa20-cs425-g07-{n:02}.cs.illinois.edu:{port}");
        }
    }
    first.to_string()
}

/// Outcome of executing one interactive command: messages to send, lines to
/// print to the operator, and whether the process should exit afterward
/// (only `leave` sets this).
#[derive(Debug, Default)]
pub struct CommandOutcome {
    pub outbound: Vec<Outbound>,
    pub display: Vec<String>,
    pub should_exit: bool,
}

pub fn handle_command(
    table: &mut MembershipTable,
    mode: &mut OperatingMode,
    config: &Config,
    command: Command,
) -> CommandOutcome {
    match command {
        Command::Join(arg) => {
            if config.introducer {
                return CommandOutcome {
                    display: vec!["this process is the introducer; it does not join".to_string()],
                    ..Default::default()
                };
            }
            let dest = resolve_join_target(&arg, config.vm_mode);
            CommandOutcome {
                outbound: vec![Outbound {
                    message: Message::new(Method::Join, table.self_id().to_string(), table.self_addr().to_string()),
                    dest_addr: dest,
                }],
                ..Default::default()
            }
        }

        Command::Leave => {
            let outbound = table
                .active_peers()
                .into_iter()
                .map(|peer| Outbound {
                    message: Message::new(Method::Leave, table.self_id().to_string(), table.self_addr().to_string()),
                    dest_addr: peer.addr,
                })
                .collect();
            info!("Leaving the group");
            CommandOutcome {
                outbound,
                should_exit: true,
                ..Default::default()
            }
        }

        // Only the originating switch command broadcasts SWITCH; receivers
        // toggle locally and stop (see protocol::handle_switch) so the
        // broadcast cannot loop forever.
        Command::Switch => {
            mode.toggle();
            table.reset_all_counters();
            let outbound = table
                .active_peers()
                .into_iter()
                .map(|peer| Outbound {
                    message: Message::new(Method::Switch, table.self_id().to_string(), table.self_addr().to_string()),
                    dest_addr: peer.addr,
                })
                .collect();
            CommandOutcome {
                outbound,
                display: vec![format!("switched heartbeat style to {mode}")],
                ..Default::default()
            }
        }

        Command::DisplayMembers => {
            let mode_name = if mode.is_gossip() { "GOSSIP" } else { "ALL-TO-ALL" };
            let mut lines = vec![format!("Current Membership Mode: {mode_name}")];
            lines.extend(
                table
                    .snapshot()
                    .into_iter()
                    .map(|m| format!("{}\t{}\t{:?}\tcounter={}", m.id, m.addr, m.status, m.heartbeat_counter)),
            );
            CommandOutcome {
                display: lines,
                ..Default::default()
            }
        }

        Command::DisplayId => CommandOutcome {
            display: vec![table.self_id().to_string()],
            ..Default::default()
        },

        // Diagnostic raw send, not part of the protocol proper: piggybacks
        // operator text on a PING payload to a given address.
        Command::Send(addr, text) => CommandOutcome {
            outbound: vec![Outbound {
                message: Message::new(Method::Ping, table.self_id().to_string(), table.self_addr().to_string())
                    .with_payload(text.into_bytes()),
                dest_addr: addr,
            }],
            ..Default::default()
        },

        Command::Unrecognized(line) => CommandOutcome {
            display: vec![format!("unrecognized command: {line}")],
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::Status;

    fn table() -> MembershipTable {
        MembershipTable::new("self@1", "127.0.0.1:2333")
    }

    #[test]
    fn parse__recognizes_every_verb() {
        assert_eq!(Command::parse("join 1.2.3.4:9"), Command::Join("1.2.3.4:9".into()));
        assert_eq!(Command::parse("leave"), Command::Leave);
        assert_eq!(Command::parse("switch"), Command::Switch);
        assert_eq!(Command::parse("display member"), Command::DisplayMembers);
        assert_eq!(Command::parse("display id"), Command::DisplayId);
        assert_eq!(
            Command::parse("send 1.2.3.4:9 hello there"),
            Command::Send("1.2.3.4:9".into(), "hello there".into())
        );
        assert_eq!(Command::parse("frobnicate"), Command::Unrecognized("frobnicate".into()));
    }

    #[test]
    fn resolve_join_target__vm_mode_maps_machine_number_and_port_to_hostname() {
        let resolved = resolve_join_target("3 5000", true);
        assert_eq!(resolved, "fa20-cs425-g07-03.cs.illinois.edu:5000");
    }

    #[test]
    fn resolve_join_target__vm_mode_without_port_falls_back_to_literal_token() {
        let resolved = resolve_join_target("3", true);
        assert_eq!(resolved, "3", "missing port token means there's nothing to build a hostname from");
    }

    #[test]
    fn resolve_join_target__non_vm_mode_passes_through() {
        let resolved = resolve_join_target("10.0.0.5:4000", false);
        assert_eq!(resolved, "10.0.0.5:4000");
    }

    #[test]
    fn join__introducer_refuses_and_sends_nothing() {
        let mut t = table();
        let mut mode = OperatingMode::AllToAll;
        let config = Config {
            introducer: true,
            ..Config::default()
        };
        let outcome = handle_command(&mut t, &mut mode, &config, Command::Join("x".into()));
        assert!(outcome.outbound.is_empty());
    }

    #[test]
    fn leave__broadcasts_to_active_peers_and_exits() {
        let mut t = table();
        t.upsert_heartbeat("a@1", "127.0.0.1:9001");
        t.upsert_heartbeat("b@1", "127.0.0.1:9002");
        t.set_status("b@1", Status::Failed);
        let mut mode = OperatingMode::AllToAll;
        let config = Config::default();
        let outcome = handle_command(&mut t, &mut mode, &config, Command::Leave);
        assert_eq!(outcome.outbound.len(), 1);
        assert_eq!(outcome.outbound[0].message.method, Method::Leave);
        assert!(outcome.should_exit);
    }

    #[test]
    fn switch__toggles_mode_resets_counters_and_broadcasts() {
        let mut t = table();
        t.upsert_heartbeat("a@1", "127.0.0.1:9001");
        let mut mode = OperatingMode::AllToAll;
        let config = Config::default();
        let outcome = handle_command(&mut t, &mut mode, &config, Command::Switch);
        assert_eq!(mode, OperatingMode::Gossip);
        assert_eq!(t.get("a@1").unwrap().heartbeat_counter, 0);
        assert_eq!(outcome.outbound.len(), 1);
        assert_eq!(outcome.outbound[0].message.method, Method::Switch);
    }

    #[test]
    fn join__vm_mode_dials_hostname_built_from_node_and_port_tokens() {
        let mut t = table();
        let mut mode = OperatingMode::AllToAll;
        let config = Config {
            vm_mode: true,
            ..Config::default()
        };
        let outcome = handle_command(&mut t, &mut mode, &config, Command::Join("3 5000".into()));
        assert_eq!(outcome.outbound.len(), 1);
        assert_eq!(outcome.outbound[0].dest_addr, "fa20-cs425-g07-03.cs.illinois.edu:5000");
    }

    #[test]
    fn display_member__reports_current_mode_first() {
        let mut t = table();
        let mut mode = OperatingMode::Gossip;
        let config = Config::default();
        let outcome = handle_command(&mut t, &mut mode, &config, Command::DisplayMembers);
        assert_eq!(outcome.display[0], "Current Membership Mode: GOSSIP");
    }

    #[test]
    fn display_id__prints_self_id() {
        let mut t = table();
        let mut mode = OperatingMode::AllToAll;
        let config = Config::default();
        let outcome = handle_command(&mut t, &mut mode, &config, Command::DisplayId);
        assert_eq!(outcome.display, vec!["self@1".to_string()]);
    }
}
