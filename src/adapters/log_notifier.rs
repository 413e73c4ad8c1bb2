//! Notification adapter that writes messages to the log.

use crate::domain::error::SniperError;
use crate::ports::notification_port::NotificationPort;
use tracing::info;

#[derive(Debug, Default)]
pub struct LogNotifier;

impl NotificationPort for LogNotifier {
    fn notify(&self, message: &str) -> Result<(), SniperError> {
        info!(target: "notify", "{}", message);
        Ok(())
    }
}
