//! Recording state machine
//!
//! Defines the session states, the commands that drive them, and the pure
//! transition function between them. No I/O happens here; side effects are
//! the controller's job.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current state of a recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum RecordingState {
    /// No session in progress.
    Idle,
    /// Counting down before capture starts.
    #[serde(rename_all = "camelCase")]
    Delay {
        /// Whole seconds remaining until capture is attempted.
        remaining_seconds: u32,
    },
    /// The capture backend is actively writing.
    Recording,
    /// The capture backend is suspended.
    Paused,
}

impl RecordingState {
    /// True when no session is in progress.
    pub fn is_idle(&self) -> bool {
        *self == Self::Idle
    }

    /// True while the backend is actively writing.
    pub fn is_recording(&self) -> bool {
        *self == Self::Recording
    }

    /// True while the backend is suspended.
    pub fn is_paused(&self) -> bool {
        *self == Self::Paused
    }

    /// True during the pre-capture countdown.
    pub fn is_in_delay(&self) -> bool {
        matches!(self, Self::Delay { .. })
    }

    /// True while a session is underway, recording or paused.
    ///
    /// UI toggle buttons should treat this as "recording".
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Recording | Self::Paused)
    }
}

impl Default for RecordingState {
    fn default() -> Self {
        Self::Idle
    }
}

/// A command submitted to the session's serialized queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Begin a session, either via countdown or immediately.
    Start {
        /// Countdown length in whole seconds.
        delay_seconds: u32,
        /// Skip the countdown even when `delay_seconds` is positive.
        record_on_tap: bool,
    },
    /// One elapsed second of countdown.
    Tick,
    /// Abort the countdown before capture starts.
    Cancel,
    /// Suspend an active recording.
    Pause,
    /// Continue a suspended recording.
    Resume,
    /// End the session and produce the artifact.
    Stop,
}

/// Failure to apply a command to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The command is not legal in the current state. Nothing changed.
    #[error("command {command:?} is not valid in state {state:?}")]
    InvalidForState {
        /// State the session was in when the command arrived.
        state: RecordingState,
        /// The offending command.
        command: Command,
    },
}

/// Compute the state that applying `command` in `current` leads to.
///
/// Pure: performs no side effects and never mutates anything. Any pair not
/// covered by the transition table fails with
/// [`TransitionError::InvalidForState`], leaving the caller's state as-is.
pub fn transition(
    current: RecordingState,
    command: Command,
) -> Result<RecordingState, TransitionError> {
    use RecordingState::*;

    match (current, command) {
        (
            Idle,
            Command::Start {
                delay_seconds,
                record_on_tap,
            },
        ) => {
            if record_on_tap || delay_seconds == 0 {
                Ok(Recording)
            } else {
                Ok(Delay {
                    remaining_seconds: delay_seconds,
                })
            }
        }
        (Delay { remaining_seconds }, Command::Tick) if remaining_seconds > 1 => Ok(Delay {
            remaining_seconds: remaining_seconds - 1,
        }),
        // remaining <= 1: the countdown is exhausted, capture starts
        (Delay { .. }, Command::Tick) => Ok(Recording),
        (Delay { .. }, Command::Cancel) => Ok(Idle),
        (Recording, Command::Pause) => Ok(Paused),
        (Recording, Command::Stop) => Ok(Idle),
        (Paused, Command::Resume) => Ok(Recording),
        (Paused, Command::Stop) => Ok(Idle),
        (state, command) => Err(TransitionError::InvalidForState { state, command }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RecordingState::*;

    const START_DELAYED: Command = Command::Start {
        delay_seconds: 3,
        record_on_tap: false,
    };
    const START_NOW: Command = Command::Start {
        delay_seconds: 0,
        record_on_tap: false,
    };

    #[test]
    fn test_start_with_delay_enters_countdown() {
        assert_eq!(
            transition(Idle, START_DELAYED),
            Ok(Delay {
                remaining_seconds: 3
            })
        );
    }

    #[test]
    fn test_start_without_delay_records_immediately() {
        assert_eq!(transition(Idle, START_NOW), Ok(Recording));
    }

    #[test]
    fn test_record_on_tap_skips_delay() {
        let start = Command::Start {
            delay_seconds: 3,
            record_on_tap: true,
        };
        assert_eq!(transition(Idle, start), Ok(Recording));
    }

    #[test]
    fn test_countdown_decrements_and_never_goes_negative() {
        let mut state = transition(Idle, START_DELAYED).unwrap();
        assert_eq!(
            state,
            Delay {
                remaining_seconds: 3
            }
        );

        let mut previous = 3;
        while let Delay { remaining_seconds } = state {
            assert!(remaining_seconds > 0);
            state = transition(state, Command::Tick).unwrap();
            if let Delay {
                remaining_seconds: next,
            } = state
            {
                assert_eq!(next, previous - 1);
                previous = next;
            }
        }
        assert_eq!(state, Recording);
    }

    #[test]
    fn test_cancel_returns_to_idle_from_any_countdown_point() {
        for remaining in 1..=3 {
            let state = Delay {
                remaining_seconds: remaining,
            };
            assert_eq!(transition(state, Command::Cancel), Ok(Idle));
        }
    }

    #[test]
    fn test_pause_resume_stop_cycle() {
        assert_eq!(transition(Recording, Command::Pause), Ok(Paused));
        assert_eq!(transition(Paused, Command::Resume), Ok(Recording));
        assert_eq!(transition(Recording, Command::Stop), Ok(Idle));
        assert_eq!(transition(Paused, Command::Stop), Ok(Idle));
    }

    #[test]
    fn test_all_pairs_outside_table_are_invalid() {
        let states = [
            Idle,
            Delay {
                remaining_seconds: 2,
            },
            Recording,
            Paused,
        ];
        let commands = [
            START_DELAYED,
            Command::Tick,
            Command::Cancel,
            Command::Pause,
            Command::Resume,
            Command::Stop,
        ];

        for state in states {
            for command in commands {
                let in_table = matches!(
                    (state, command),
                    (Idle, Command::Start { .. })
                        | (Delay { .. }, Command::Tick)
                        | (Delay { .. }, Command::Cancel)
                        | (Recording, Command::Pause)
                        | (Recording, Command::Stop)
                        | (Paused, Command::Resume)
                        | (Paused, Command::Stop)
                );

                let result = transition(state, command);
                if in_table {
                    assert!(result.is_ok(), "{state:?} + {command:?} should be valid");
                } else {
                    assert_eq!(
                        result,
                        Err(TransitionError::InvalidForState { state, command }),
                        "{state:?} + {command:?} should be rejected"
                    );
                }
            }
        }
    }

    #[test]
    fn test_state_predicates() {
        assert!(Idle.is_idle());
        assert!(Recording.is_recording());
        assert!(Paused.is_paused());
        assert!(Delay {
            remaining_seconds: 1
        }
        .is_in_delay());

        assert!(Recording.is_active());
        assert!(Paused.is_active());
        assert!(!Idle.is_active());
        assert!(!Delay {
            remaining_seconds: 1
        }
        .is_active());
    }

    #[test]
    fn test_state_serializes_tagged() {
        let json = serde_json::to_value(Delay {
            remaining_seconds: 2,
        })
        .unwrap();
        assert_eq!(json["state"], "delay");
        assert_eq!(json["remainingSeconds"], 2);

        let json = serde_json::to_value(Recording).unwrap();
        assert_eq!(json["state"], "recording");
    }
}
