//! Capture trait definitions
//!
//! Platform-agnostic interface to the encoder that actually writes the
//! recording. The session controller never talks to a physical encoder
//! directly; a backend implementing [`CaptureBackend`] is injected at
//! construction.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::Options;

/// Errors surfaced by a capture backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Capture or storage permission was not granted.
    #[error("capture permission denied: {0}")]
    PermissionDenied(String),

    /// The capture device is already in use.
    #[error("capture device busy: {0}")]
    DeviceBusy(String),

    /// The output location cannot be written.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The encoder failed while starting, running, or finalizing.
    #[error("encoder failure: {0}")]
    EncoderFailure(String),
}

/// Result type alias for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Opaque handle to one in-progress capture, issued by [`CaptureBackend::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaptureHandle(Uuid);

impl CaptureHandle {
    /// Mint a fresh handle for a new capture.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CaptureHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// The platform capture engine, driven by the session controller.
///
/// Implementations may block or take non-trivial time in any method; the
/// controller serializes calls, so at most one method runs at a time and
/// implementations never see overlapping operations on the same handle.
#[async_trait]
pub trait CaptureBackend: Send {
    /// Begin writing a capture configured by `options`.
    ///
    /// Returns a handle identifying the capture for subsequent calls.
    async fn start(&mut self, options: &Options) -> BackendResult<CaptureHandle>;

    /// Suspend the capture without finalizing it.
    async fn pause(&mut self, handle: CaptureHandle) -> BackendResult<()>;

    /// Continue a previously paused capture.
    async fn resume(&mut self, handle: CaptureHandle) -> BackendResult<()>;

    /// Finalize the capture and return the absolute path of the artifact.
    async fn stop(&mut self, handle: CaptureHandle) -> BackendResult<PathBuf>;
}
