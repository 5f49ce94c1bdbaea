//! Session configuration
//!
//! Immutable value objects describing video, storage, and notification
//! settings, combined into a single [`Options`] snapshot that is frozen
//! per recording session.

use chrono::Local;
use serde::{Deserialize, Serialize};

/// Configuration options for the video stream of a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConfig {
    /// Width of the recording frame in pixels.
    ///
    /// `None` lets the capture backend use the device default.
    pub width: Option<u32>,

    /// Height of the recording frame in pixels.
    ///
    /// `None` lets the capture backend use the device default.
    pub height: Option<u32>,

    /// Identifier of the video encoder to use (e.g. `"h264"`).
    pub encoder: String,

    /// Target encoding bitrate in bits per second.
    pub bitrate: u32,

    /// Target frame rate in frames per second.
    pub frame_rate: u32,

    /// Maximum recorded (non-paused) length in seconds.
    ///
    /// When positive, the session is stopped automatically once this much
    /// recording time has accumulated. Zero means unlimited.
    pub max_length_secs: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            encoder: "h264".to_string(),
            bitrate: 8_000_000,
            frame_rate: 60,
            max_length_secs: 0,
        }
    }
}

/// Configuration options for the storage of the output artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    /// Directory name for recordings, relative to app-owned storage.
    pub directory_name: String,
}

impl StorageConfig {
    /// Default file name (without extension) for a new recording,
    /// derived from the current local time.
    pub fn file_name(&self) -> String {
        Local::now().format("%m_%d_%Y_%H%M%S").to_string()
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory_name: "castkit".to_string(),
        }
    }
}

/// Configuration options for the notification channel presented
/// alongside the recording notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelConfig {
    /// Unique identifier of the notification channel.
    pub id: String,

    /// Display name of the notification channel.
    pub name: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            id: "1337".to_string(),
            name: "Recording Service".to_string(),
        }
    }
}

/// Configuration options for the recording notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationConfig {
    /// Title displayed in the notification.
    pub title: String,

    /// Message/description displayed in the notification.
    pub description: String,

    /// Icon bitmap displayed in the notification, as raw encoded bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Vec<u8>>,

    /// Unique identifier for the displayed notification.
    ///
    /// Must be stable and unique within the embedding application.
    pub id: u32,

    /// Whether to offer a stop action on the notification.
    pub show_stop: bool,

    /// Whether to offer a pause/resume action on the notification.
    ///
    /// The visible action depends on the current session state.
    pub show_pause: bool,

    /// Whether the notification should render an elapsed-time timer.
    pub show_timer: bool,

    /// Notification channel settings.
    pub channel: ChannelConfig,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title: "castkit".to_string(),
            description: "Recording in progress...".to_string(),
            icon: None,
            id: 101,
            show_stop: false,
            show_pause: false,
            show_timer: false,
            channel: ChannelConfig::default(),
        }
    }
}

/// The full configuration snapshot for a recording session.
///
/// Constructed once via [`Options::builder`] (or struct literal) and handed
/// to the controller; each `record()` call freezes the options configured at
/// that moment for the duration of the session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    /// Video stream settings.
    pub video: VideoConfig,

    /// Output storage settings.
    pub storage: StorageConfig,

    /// Notification settings.
    pub notification: NotificationConfig,

    /// If true, a plain start command begins capture immediately,
    /// skipping any configured start delay.
    pub record_on_tap: bool,

    /// Time in milliseconds to count down before capture starts.
    ///
    /// Zero skips the countdown entirely.
    pub start_delay_ms: u64,

    /// Whether a notification should be shown for the session.
    pub show_notification: bool,
}

impl Options {
    /// Start building an [`Options`] value.
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::default()
    }

    /// The configured start delay in whole seconds, rounded up. Delays
    /// beyond `u32::MAX` seconds saturate.
    pub fn delay_seconds(&self) -> u32 {
        u32::try_from(self.start_delay_ms.div_ceil(1000)).unwrap_or(u32::MAX)
    }
}

/// Staged builder for [`Options`].
///
/// Produces a single frozen value; no partially constructed configuration
/// is ever visible to the controller.
#[derive(Debug, Clone, Default)]
pub struct OptionsBuilder {
    options: Options,
}

impl OptionsBuilder {
    /// Set the video configuration.
    pub fn video(mut self, video: VideoConfig) -> Self {
        self.options.video = video;
        self
    }

    /// Set the storage configuration.
    pub fn storage(mut self, storage: StorageConfig) -> Self {
        self.options.storage = storage;
        self
    }

    /// Set the notification configuration.
    pub fn notification(mut self, notification: NotificationConfig) -> Self {
        self.options.notification = notification;
        self
    }

    /// Skip the start delay when a plain start command is issued.
    pub fn record_on_tap(mut self, record_on_tap: bool) -> Self {
        self.options.record_on_tap = record_on_tap;
        self
    }

    /// Delay capture start by the given number of milliseconds.
    pub fn start_delay_ms(mut self, delay_ms: u64) -> Self {
        self.options.start_delay_ms = delay_ms;
        self
    }

    /// Show a notification while the session is active.
    pub fn show_notification(mut self, show: bool) -> Self {
        self.options.show_notification = show;
        self
    }

    /// Freeze the configuration into an immutable [`Options`].
    pub fn build(self) -> Options {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_produces_frozen_snapshot() {
        let options = Options::builder()
            .video(VideoConfig {
                width: Some(1920),
                height: Some(1080),
                ..Default::default()
            })
            .start_delay_ms(3000)
            .show_notification(true)
            .build();

        assert_eq!(options.video.width, Some(1920));
        assert_eq!(options.start_delay_ms, 3000);
        assert!(options.show_notification);
        // Untouched sections keep their defaults
        assert_eq!(options.notification.id, 101);
        assert_eq!(options.notification.channel.id, "1337");
    }

    #[test]
    fn test_delay_seconds_rounds_up() {
        let mut options = Options::default();
        assert_eq!(options.delay_seconds(), 0);

        options.start_delay_ms = 1;
        assert_eq!(options.delay_seconds(), 1);

        options.start_delay_ms = 3000;
        assert_eq!(options.delay_seconds(), 3);

        options.start_delay_ms = 3001;
        assert_eq!(options.delay_seconds(), 4);

        options.start_delay_ms = u64::MAX;
        assert_eq!(options.delay_seconds(), u32::MAX);
    }

    #[test]
    fn test_file_name_is_nonempty() {
        let storage = StorageConfig::default();
        assert!(!storage.file_name().is_empty());
    }
}
