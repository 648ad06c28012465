use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::Instant;

/// Exact, case-sensitive status vocabulary used both internally and on the
/// wire (`spec.md` §6, Status Vocabulary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "Running")]
    Running,
    #[serde(rename = "Left")]
    Left,
    #[serde(rename = "Failed")]
    Failed,
}

/// One entry in the membership table. `timestamp` is a monotonic instant so
/// that timeout math is immune to wall-clock adjustments and can be driven
/// deterministically under `tokio::time::pause` in tests.
#[derive(Debug, Clone)]
pub struct MemberRecord {
    pub id: String,
    pub addr: String,
    pub heartbeat_counter: u64,
    pub status: Status,
    pub timestamp: Instant,
}

impl MemberRecord {
    /// Creates the self record at startup: `RUNNING`, counter 0.
    pub fn new_self(id: impl Into<String>, addr: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            addr: addr.into(),
            heartbeat_counter: 0,
            status: Status::Running,
            timestamp: Instant::now(),
        }
    }

    /// Creates a freshly observed remote record (JOIN, gossip insert, first
    /// ping/pong): `RUNNING`, counter 1.
    pub fn new_remote(id: impl Into<String>, addr: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            addr: addr.into(),
            heartbeat_counter: 1,
            status: Status::Running,
            timestamp: Instant::now(),
        }
    }
}

/// Forms a peer identity as `"<low-six-digits-of-unix-seconds>@<host:port>"`.
/// Identity is immutable once assigned (`spec.md` §3, Peer Identity).
pub fn generate_identity(addr: &str) -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{}@{}", secs % 1_000_000, addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_identity__embeds_addr_and_six_digit_suffix() {
        let id = generate_identity("127.0.0.1:9001");
        let mut parts = id.splitn(2, '@');
        let suffix = parts.next().unwrap();
        let addr = parts.next().unwrap();
        assert_eq!(addr, "127.0.0.1:9001");
        assert!(suffix.len() <= 6);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn new_self__starts_running_with_zero_counter() {
        let m = MemberRecord::new_self("a@1", "1.2.3.4:1");
        assert_eq!(m.status, Status::Running);
        assert_eq!(m.heartbeat_counter, 0);
    }

    #[test]
    fn new_remote__starts_running_with_counter_one() {
        let m = MemberRecord::new_remote("b@1", "1.2.3.4:2");
        assert_eq!(m.status, Status::Running);
        assert_eq!(m.heartbeat_counter, 1);
    }
}
