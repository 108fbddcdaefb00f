//! Runtime options for a [`QueryConnection`](crate::QueryConnection).

use std::time::Duration;

/// Default read timeout for greetings and responses.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default pause before each command while flood protection is on.
pub const DEFAULT_FLOOD_INTERVAL: Duration = Duration::from_millis(500);

/// Default capacity of the event and message buffers.
pub const DEFAULT_BUFFER_LIMIT: usize = 1000;

/// Default time `stop_polling` waits for the poller to finish.
pub const DEFAULT_POLL_JOIN_TIMEOUT: Duration = Duration::from_secs(15);

/// Connection options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Timeout for the greeting and for each response.
    pub timeout: Duration,

    /// Sleep `flood_interval` before every command.
    pub flood_protection: bool,

    /// Pause applied by flood protection.
    pub flood_interval: Duration,

    /// Maximum buffered events.
    pub events_limit: usize,

    /// Maximum buffered messages.
    pub messages_limit: usize,

    /// How long `stop_polling` waits before giving up on the poller.
    pub poll_join_timeout: Duration,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            flood_protection: true,
            flood_interval: DEFAULT_FLOOD_INTERVAL,
            events_limit: DEFAULT_BUFFER_LIMIT,
            messages_limit: DEFAULT_BUFFER_LIMIT,
            poll_join_timeout: DEFAULT_POLL_JOIN_TIMEOUT,
        }
    }
}

impl ConnectionOptions {
    /// Builder: set the response timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder: toggle flood protection.
    pub fn with_flood_protection(mut self, enabled: bool) -> Self {
        self.flood_protection = enabled;
        self
    }

    /// Builder: set the flood protection interval.
    pub fn with_flood_interval(mut self, interval: Duration) -> Self {
        self.flood_interval = interval;
        self
    }

    /// Builder: set the event buffer limit.
    pub fn with_events_limit(mut self, limit: usize) -> Self {
        self.events_limit = limit;
        self
    }

    /// Builder: set the message buffer limit.
    pub fn with_messages_limit(mut self, limit: usize) -> Self {
        self.messages_limit = limit;
        self
    }

    /// Builder: set the poller join timeout.
    pub fn with_poll_join_timeout(mut self, timeout: Duration) -> Self {
        self.poll_join_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let options = ConnectionOptions::default();
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert!(options.flood_protection);
        assert_eq!(options.flood_interval, Duration::from_millis(500));
        assert_eq!(options.events_limit, 1000);
        assert_eq!(options.messages_limit, 1000);
        assert_eq!(options.poll_join_timeout, Duration::from_secs(15));
    }

    #[test]
    fn custom_options() {
        let options = ConnectionOptions::default()
            .with_timeout(Duration::from_secs(2))
            .with_flood_protection(false)
            .with_flood_interval(Duration::from_millis(50))
            .with_events_limit(10)
            .with_messages_limit(20)
            .with_poll_join_timeout(Duration::from_secs(1));

        assert_eq!(options.timeout, Duration::from_secs(2));
        assert!(!options.flood_protection);
        assert_eq!(options.flood_interval, Duration::from_millis(50));
        assert_eq!(options.events_limit, 10);
        assert_eq!(options.messages_limit, 20);
        assert_eq!(options.poll_join_timeout, Duration::from_secs(1));
    }
}
