//! Notification port trait.

use crate::domain::error::SniperError;

/// Fire-and-forget operator messages. Callers log failures and carry on.
pub trait NotificationPort {
    fn notify(&self, message: &str) -> Result<(), SniperError>;
}
