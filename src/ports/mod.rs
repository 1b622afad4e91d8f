//! Port traits connecting the domain to the outside world.

pub mod config_port;
pub mod market_port;
pub mod notify_port;
pub mod report_port;
pub mod store_port;
