use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Open,
    Closed,
}

/// What to do after the channel closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconnect {
    After(Duration),
    /// Retries are exhausted. The poller is the only update source from now on.
    GiveUp,
}

/// Lifecycle of the persistent channel with a bounded retry counter.
#[derive(Debug, Clone)]
pub struct Channel {
    state: ChannelState,
    attempts: u32,
    max_attempts: u32,
    delay: Duration,
    given_up: bool,
}

impl Channel {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            state: ChannelState::Disconnected,
            attempts: 0,
            max_attempts,
            delay,
            given_up: false,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ChannelState::Open
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn has_given_up(&self) -> bool {
        self.given_up
    }

    /// Starts a connection attempt. Returns `false` when the channel is
    /// already connecting or open, or retries are exhausted.
    pub fn connect(&mut self) -> bool {
        match self.state {
            ChannelState::Disconnected | ChannelState::Closed if !self.given_up => {
                self.state = ChannelState::Connecting;
                true
            }
            _ => false,
        }
    }

    pub fn opened(&mut self) {
        self.state = ChannelState::Open;
        self.attempts = 0;
    }

    /// Called when an open channel drops or an attempt fails.
    pub fn closed(&mut self) -> Reconnect {
        self.state = ChannelState::Closed;
        if self.given_up {
            return Reconnect::GiveUp;
        }
        if self.attempts < self.max_attempts {
            self.attempts += 1;
            Reconnect::After(self.delay)
        } else {
            self.given_up = true;
            Reconnect::GiveUp
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_secs(5);

    #[test]
    fn gives_up_after_five_failed_reconnects() {
        let mut channel = Channel::new(5, DELAY);
        assert!(channel.connect());
        // the first attempt fails
        assert_eq!(channel.closed(), Reconnect::After(DELAY));

        for attempt in 1..=5 {
            assert!(channel.connect());
            assert_eq!(channel.state(), ChannelState::Connecting);
            let next = channel.closed();
            if attempt < 5 {
                assert_eq!(next, Reconnect::After(DELAY));
            } else {
                assert_eq!(next, Reconnect::GiveUp);
            }
        }

        assert!(channel.has_given_up());
        assert!(!channel.connect());
        assert_eq!(channel.closed(), Reconnect::GiveUp);
    }

    #[test]
    fn open_resets_the_counter() {
        let mut channel = Channel::new(5, DELAY);
        for _ in 0..4 {
            channel.connect();
            channel.closed();
        }
        assert_eq!(channel.attempts(), 4);

        channel.connect();
        channel.opened();
        assert!(channel.is_open());
        assert_eq!(channel.attempts(), 0);
        assert!(!channel.connect());

        assert_eq!(channel.closed(), Reconnect::After(DELAY));
        assert_eq!(channel.attempts(), 1);
    }
}
