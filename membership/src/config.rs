use tokio::time::Duration;

/// Tunable constants and run-time settings, consolidated in one struct
/// instead of the original source's package-level globals (`spec.md` §9:
/// "confine inside the Controller ... do not replicate the table across
/// components" — the same discipline applies to configuration).
#[derive(Debug, Clone)]
pub struct Config {
    pub heartbeat_period: Duration,
    pub all_to_all_timeout: Duration,
    pub gossip_timeout: Duration,
    pub cleanup_delay: Duration,
    pub gossip_fanout: usize,
    pub max_datagram_bytes: usize,
    pub idle_sleep: Duration,

    pub local_id: String,
    pub local_addr: String,
    pub introducer: bool,
    pub vm_mode: bool,
    pub debug: bool,
    pub gossip_mode: bool,
    pub loss_rate: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            heartbeat_period: Duration::from_secs(1),
            all_to_all_timeout: Duration::from_secs(5),
            gossip_timeout: Duration::from_secs(10),
            cleanup_delay: Duration::from_secs(600),
            gossip_fanout: 5,
            max_datagram_bytes: 4096,
            idle_sleep: Duration::from_millis(50),

            local_id: String::new(),
            local_addr: String::new(),
            introducer: false,
            vm_mode: false,
            debug: false,
            gossip_mode: false,
            loss_rate: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default__matches_spec_constants() {
        let c = Config::default();
        assert_eq!(c.heartbeat_period, Duration::from_secs(1));
        assert_eq!(c.all_to_all_timeout, Duration::from_secs(5));
        assert_eq!(c.gossip_timeout, Duration::from_secs(10));
        assert_eq!(c.cleanup_delay, Duration::from_secs(600));
        assert_eq!(c.gossip_fanout, 5);
        assert_eq!(c.max_datagram_bytes, 4096);
        assert_eq!(c.idle_sleep, Duration::from_millis(50));
    }
}
