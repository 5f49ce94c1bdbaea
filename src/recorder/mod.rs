//! Recording session module
//!
//! This module implements the session controller architecture:
//! - the pure state machine in `state`
//! - the serialized command queue and side effects in `controller`
//! - the start-delay tick scheduler in `countdown`
//! - observer fan-out in `observer`
//! - the notification surface bridge in `notification`

pub mod controller;
pub(crate) mod countdown;
pub mod notification;
pub mod observer;
pub mod state;

pub use controller::{SessionController, SessionEvent};
pub use notification::{NotificationAction, NotificationBridge, NotificationSurface, NotificationUpdate};
pub use observer::SessionObserver;
pub use state::{Command, RecordingState, TransitionError};
