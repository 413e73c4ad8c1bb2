//! Port traits: the narrow interfaces the domain talks to.

pub mod bar_feed_port;
pub mod config_port;
pub mod notification_port;
pub mod order_port;
pub mod premium_port;
