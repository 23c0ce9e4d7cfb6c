//! Channel configuration for coordinator communication

/// Channel buffer configuration for coordinator communication
///
/// Workers report to the coordinator over an unbounded channel, so only the
/// caller-facing event buffer is sized here.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Event buffer size (coordinator -> caller), never zero
    event_buffer: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            event_buffer: 10_000,
        }
    }
}

impl ChannelConfig {
    /// Use a custom event buffer size
    ///
    /// Request events that do not fit are dropped; the final report always
    /// has a slot of its own.
    pub fn with_event_buffer(mut self, size: usize) -> Self {
        self.event_buffer = size.max(1);
        self
    }

    /// Event buffer size
    pub fn event_buffer(&self) -> usize {
        self.event_buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_config_default() {
        let config = ChannelConfig::default();
        assert_eq!(config.event_buffer(), 10_000);
    }

    #[test]
    fn test_channel_config_builder() {
        assert_eq!(ChannelConfig::default().with_event_buffer(64).event_buffer(), 64);
        assert_eq!(ChannelConfig::default().with_event_buffer(0).event_buffer(), 1);
    }
}
