//! Notification bridge
//!
//! Translates committed session states into renderable notification
//! payloads and forwards them to an injected surface. The bridge is an
//! ordinary observer; the surface feeds user input back through its own
//! clone of the controller handle, so rendering never couples to the
//! controller or to other observers.

use serde::Serialize;

use crate::config::NotificationConfig;
use crate::recorder::observer::SessionObserver;
use crate::recorder::state::RecordingState;

/// An action button the notification surface may render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationAction {
    /// Suspend the recording (maps to `SessionController::pause`).
    Pause,
    /// Continue a paused recording (maps to `SessionController::resume`).
    Resume,
    /// End the session (maps to `SessionController::stop_recording`, or
    /// `cancel` while the countdown is still running).
    Stop,
}

/// Everything a notification surface needs to render one state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationUpdate {
    /// Title from [`NotificationConfig`].
    pub title: String,

    /// Description from [`NotificationConfig`].
    pub subtitle: String,

    /// Icon bitmap bytes, if configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Vec<u8>>,

    /// Human-readable label of the current state.
    pub state_label: String,

    /// Seconds left in the countdown, present only during the start delay.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u32>,

    /// Whether the surface should render an elapsed-time timer.
    pub show_timer: bool,

    /// Action buttons to offer, per the configured flags and current state.
    pub actions: Vec<NotificationAction>,
}

/// The external notification surface.
///
/// Owned by the embedding application; rendering and layout are entirely
/// its concern. Implementations hold a clone of the controller handle and
/// submit the command matching a pressed [`NotificationAction`].
pub trait NotificationSurface: Send {
    /// Render (or re-render) the notification for the given update.
    fn show(&mut self, update: NotificationUpdate);

    /// Remove the notification; the session has returned to idle.
    fn dismiss(&mut self);
}

/// Observer that keeps a [`NotificationSurface`] in sync with the session.
pub struct NotificationBridge {
    config: NotificationConfig,
    surface: Box<dyn NotificationSurface>,
}

impl NotificationBridge {
    /// Wrap `surface` with the notification settings it should render.
    pub fn new(config: NotificationConfig, surface: Box<dyn NotificationSurface>) -> Self {
        Self { config, surface }
    }

    /// Build the payload for `state`, or `None` when the notification
    /// should be dismissed.
    fn update_for(config: &NotificationConfig, state: &RecordingState) -> Option<NotificationUpdate> {
        let (state_label, remaining_seconds) = match state {
            RecordingState::Idle => return None,
            RecordingState::Delay { remaining_seconds } => (
                format!("Starting in {remaining_seconds}s"),
                Some(*remaining_seconds),
            ),
            RecordingState::Recording => ("Recording".to_string(), None),
            RecordingState::Paused => ("Paused".to_string(), None),
        };

        let mut actions = Vec::new();
        if config.show_pause {
            match state {
                RecordingState::Recording => actions.push(NotificationAction::Pause),
                RecordingState::Paused => actions.push(NotificationAction::Resume),
                _ => {}
            }
        }
        if config.show_stop {
            actions.push(NotificationAction::Stop);
        }

        Some(NotificationUpdate {
            title: config.title.clone(),
            subtitle: config.description.clone(),
            icon: config.icon.clone(),
            state_label,
            remaining_seconds,
            show_timer: config.show_timer,
            actions,
        })
    }
}

impl SessionObserver for NotificationBridge {
    fn on_state_change(&mut self, state: &RecordingState) {
        match Self::update_for(&self.config, state) {
            Some(update) => self.surface.show(update),
            None => self.surface.dismiss(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_actions() -> NotificationConfig {
        NotificationConfig {
            show_pause: true,
            show_stop: true,
            show_timer: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_idle_dismisses() {
        let update = NotificationBridge::update_for(&config_with_actions(), &RecordingState::Idle);
        assert!(update.is_none());
    }

    #[test]
    fn test_recording_offers_pause_and_stop() {
        let update =
            NotificationBridge::update_for(&config_with_actions(), &RecordingState::Recording)
                .unwrap();
        assert_eq!(update.state_label, "Recording");
        assert_eq!(
            update.actions,
            vec![NotificationAction::Pause, NotificationAction::Stop]
        );
        assert!(update.show_timer);
        assert!(update.remaining_seconds.is_none());
    }

    #[test]
    fn test_paused_offers_resume() {
        let update =
            NotificationBridge::update_for(&config_with_actions(), &RecordingState::Paused)
                .unwrap();
        assert_eq!(
            update.actions,
            vec![NotificationAction::Resume, NotificationAction::Stop]
        );
    }

    #[test]
    fn test_delay_carries_remaining_seconds() {
        let update = NotificationBridge::update_for(
            &config_with_actions(),
            &RecordingState::Delay {
                remaining_seconds: 2,
            },
        )
        .unwrap();
        assert_eq!(update.remaining_seconds, Some(2));
        assert_eq!(update.state_label, "Starting in 2s");
        assert_eq!(update.actions, vec![NotificationAction::Stop]);
    }

    #[test]
    fn test_flags_off_yields_no_actions() {
        let update = NotificationBridge::update_for(
            &NotificationConfig::default(),
            &RecordingState::Recording,
        )
        .unwrap();
        assert!(update.actions.is_empty());
        assert!(!update.show_timer);
    }
}
