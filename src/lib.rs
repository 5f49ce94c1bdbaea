//! Screen recording session controller.
//!
//! Owns the finite state machine governing a capture session
//! (`Idle | Delay | Recording | Paused`): a countdown start delay,
//! pause/resume/stop controls, and exactly-once artifact delivery, with
//! every committed transition fanned out to registered observers (UI,
//! notification surface). All commands flow through one serialized queue,
//! so user input and countdown ticks can never race each other.
//!
//! The encoder itself stays opaque behind [`capture::CaptureBackend`];
//! this crate contains no platform capture code.
//!
//! ```no_run
//! use castkit::{Options, SessionController};
//! # async fn demo(backend: Box<dyn castkit::CaptureBackend>) -> castkit::SessionResult<()> {
//! let options = Options::builder().start_delay_ms(3000).build();
//! let controller = SessionController::new(backend, options);
//! controller.record().await?;
//! // ... later
//! controller.stop_recording().await?;
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod config;
pub mod error;
pub mod recorder;

pub use capture::{BackendError, BackendResult, CaptureBackend, CaptureHandle};
pub use config::{
    ChannelConfig, NotificationConfig, Options, OptionsBuilder, StorageConfig, VideoConfig,
};
pub use error::{SessionError, SessionResult};
pub use recorder::controller::{SessionController, SessionEvent};
pub use recorder::notification::{
    NotificationAction, NotificationBridge, NotificationSurface, NotificationUpdate,
};
pub use recorder::observer::SessionObserver;
pub use recorder::state::{transition, Command, RecordingState, TransitionError};
