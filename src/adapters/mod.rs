//! Concrete adapter implementations for ports.

pub mod csv_bar_feed;
pub mod csv_order_journal;
pub mod file_config_adapter;
pub mod fixed_premium_adapter;
pub mod log_notifier;
