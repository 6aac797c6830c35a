//! Concrete implementations of the port traits.

pub mod csv_feed;
pub mod file_config_adapter;
pub mod paper_broker;
pub mod replay;
