//! Events that drive the link monitor

use mixlink_protocol::ChangeStatus;

use crate::config::MonitorConfig;

/// What one loop iteration observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    /// Nothing happened
    NoEvent,
    /// User touched the screen
    UiInput,
    /// Host reported new mixer state
    Change,
    /// Poll failed, link recently alive
    SerialError,
    /// Poll failed and the link has been silent past the timeout
    SerialTimeout,
}

impl LinkEvent {
    /// Combine UI activity and a poll result into one event
    ///
    /// The poll result wins over UI input, except an unchanged poll which
    /// leaves it as is. `since_success_ms` is the liveness age at poll time.
    pub fn classify(
        ui_input: bool,
        poll: ChangeStatus,
        since_success_ms: u64,
        config: &MonitorConfig,
    ) -> Self {
        let event = if ui_input {
            LinkEvent::UiInput
        } else {
            LinkEvent::NoEvent
        };

        match poll {
            ChangeStatus::Changed => LinkEvent::Change,
            ChangeStatus::Unchanged => event,
            ChangeStatus::Failed if since_success_ms > u64::from(config.link_timeout_ms) => {
                LinkEvent::SerialTimeout
            }
            ChangeStatus::Failed => LinkEvent::SerialError,
        }
    }

    /// Check if this event comes from a failed poll
    pub fn is_link_failure(&self) -> bool {
        matches!(self, LinkEvent::SerialError | LinkEvent::SerialTimeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: MonitorConfig = MonitorConfig::DEFAULT;

    #[test]
    fn test_quiet_iteration() {
        let event = LinkEvent::classify(false, ChangeStatus::Unchanged, 0, &CONFIG);
        assert_eq!(event, LinkEvent::NoEvent);
    }

    #[test]
    fn test_ui_input_survives_unchanged_poll() {
        let event = LinkEvent::classify(true, ChangeStatus::Unchanged, 0, &CONFIG);
        assert_eq!(event, LinkEvent::UiInput);
    }

    #[test]
    fn test_change_overrides_ui_input() {
        assert_eq!(
            LinkEvent::classify(true, ChangeStatus::Changed, 0, &CONFIG),
            LinkEvent::Change
        );
        assert_eq!(
            LinkEvent::classify(false, ChangeStatus::Changed, 0, &CONFIG),
            LinkEvent::Change
        );
    }

    #[test]
    fn test_failure_overrides_ui_input() {
        let event = LinkEvent::classify(true, ChangeStatus::Failed, 1_000, &CONFIG);
        assert_eq!(event, LinkEvent::SerialError);
        assert!(event.is_link_failure());
    }

    #[test]
    fn test_timeout_boundary() {
        // Exactly at the timeout is still an error; past it is a timeout
        assert_eq!(
            LinkEvent::classify(false, ChangeStatus::Failed, 30_000, &CONFIG),
            LinkEvent::SerialError
        );
        assert_eq!(
            LinkEvent::classify(false, ChangeStatus::Failed, 30_001, &CONFIG),
            LinkEvent::SerialTimeout
        );
    }

    #[test]
    fn test_custom_timeout() {
        let config = MonitorConfig {
            link_timeout_ms: 500,
            ..MonitorConfig::DEFAULT
        };
        assert_eq!(
            LinkEvent::classify(false, ChangeStatus::Failed, 600, &config),
            LinkEvent::SerialTimeout
        );
    }
}
