//! Port traits: the seams between the domain and its collaborators.

pub mod config_port;
pub mod holding_source;
pub mod report_port;
