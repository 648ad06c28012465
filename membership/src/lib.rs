pub mod codec;
pub mod commands;
pub mod config;
pub mod controller;
pub mod detector;
pub mod error;
pub mod member;
pub mod mode;
pub mod protocol;
pub mod table;
pub mod transport;

pub use config::Config;
pub use controller::Controller;
pub use error::{MembershipError, Result};
pub use member::{generate_identity, MemberRecord, Status};
pub use mode::OperatingMode;
pub use table::MembershipTable;
