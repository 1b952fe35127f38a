use std::fmt;

use serde::Serialize;

use super::error::HandoffError;

/// Consumer loop state machine.
///
/// ```text
/// Idle ⇄ Draining
///   ↓        ↓
///   Stopping → Terminated
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsumerState {
    Idle,
    Draining,
    Stopping,
    Terminated,
}

impl ConsumerState {
    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated)
    }

    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Draining => 1,
            Self::Stopping => 2,
            Self::Terminated => 3,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Draining,
            2 => Self::Stopping,
            _ => Self::Terminated,
        }
    }
}

impl fmt::Display for ConsumerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Draining => "draining",
            Self::Stopping => "stopping",
            Self::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Capture session state machine.
///
/// ```text
/// idle → opened → capturing → stopping → completed
///          ↓          ↓           ↓
///          └──────────┴─────→ failed
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Opened,
    Capturing,
    Stopping,
    Completed,
    Failed(HandoffError),
}

impl SessionState {
    pub fn is_capturing(&self) -> bool {
        matches!(self, Self::Capturing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumer_state_round_trips_through_u8() {
        for state in [
            ConsumerState::Idle,
            ConsumerState::Draining,
            ConsumerState::Stopping,
            ConsumerState::Terminated,
        ] {
            assert_eq!(ConsumerState::from_u8(state.as_u8()), state);
        }
    }

    #[test]
    fn only_completed_and_failed_are_terminal() {
        assert!(SessionState::Completed.is_terminal());
        assert!(SessionState::Failed(HandoffError::ConsumerPanicked).is_terminal());
        assert!(!SessionState::Stopping.is_terminal());
        assert!(!SessionState::Opened.is_terminal());
    }
}
