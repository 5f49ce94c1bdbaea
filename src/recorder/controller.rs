//! Session controller
//!
//! Orchestrates the recording lifecycle: validates commands against the
//! state machine, drives the capture backend, and publishes committed
//! transitions to observers and the event stream.
//!
//! All commands (user calls, countdown ticks, auto-stop) are serialized
//! through one mpsc queue owned by a background task, so a state
//! read-then-write is always atomic and a late countdown tick can never
//! race a cancellation. State snapshots are served from a shared lock that
//! the task only holds for the instant of a commit, so `state()` readers
//! are never blocked behind a backend call.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

use crate::capture::{CaptureBackend, CaptureHandle};
use crate::config::Options;
use crate::error::{SessionError, SessionResult};
use crate::recorder::countdown::Countdown;
use crate::recorder::notification::{NotificationBridge, NotificationSurface};
use crate::recorder::observer::{ObserverRegistry, SessionObserver};
use crate::recorder::state::{transition, Command, RecordingState};

/// Events emitted during a recording session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A state transition was committed.
    StateChanged(RecordingState),
    /// A session produced its artifact. Sent exactly once per session,
    /// before the `Idle` state change that follows it.
    Finished(PathBuf),
    /// A command or backend operation failed.
    Error(SessionError),
}

type Reply = oneshot::Sender<SessionResult<()>>;

/// A request submitted to the session task.
pub(crate) enum SessionRequest {
    /// Start a session with a frozen options snapshot.
    Record { options: Box<Options>, reply: Reply },
    /// Apply a state machine command. Internal sources (countdown ticks,
    /// auto-stop) submit with no reply channel.
    Command {
        command: Command,
        reply: Option<Reply>,
    },
    /// Replace the stored options. Only legal while idle.
    UpdateOptions { options: Box<Options>, reply: Reply },
    /// Report accumulated recording time.
    Duration { reply: oneshot::Sender<Duration> },
}

/// Handle to a recording session.
///
/// Cheap to clone; all clones drive the same session. The session task
/// shuts down once every handle has been dropped.
#[derive(Clone)]
pub struct SessionController {
    requests: mpsc::Sender<SessionRequest>,
    state: Arc<RwLock<RecordingState>>,
    options: Arc<RwLock<Options>>,
    observers: Arc<Mutex<ObserverRegistry>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    /// Create a controller around an injected capture backend and an
    /// initial configuration, and spawn its session task.
    pub fn new(backend: Box<dyn CaptureBackend>, options: Options) -> Self {
        let (requests, request_rx) = mpsc::channel(64);
        let (events, _) = broadcast::channel(100);
        let state = Arc::new(RwLock::new(RecordingState::Idle));
        let options = Arc::new(RwLock::new(options));
        let observers = Arc::new(Mutex::new(ObserverRegistry::default()));

        let task = SessionTask {
            backend,
            state: state.clone(),
            options: options.clone(),
            observers: observers.clone(),
            events: events.clone(),
            requests: requests.downgrade(),
            session_options: Options::default(),
            countdown: None,
            capture: None,
            auto_stop: None,
            completed: Duration::ZERO,
            segment_started: None,
        };
        tokio::spawn(task.run(request_rx));

        Self {
            requests,
            state,
            options,
            observers,
            events,
        }
    }

    /// Start a recording session using the currently configured options,
    /// frozen at this call. With a positive start delay (and `record_on_tap`
    /// off) the session enters the countdown first; otherwise capture
    /// starts immediately.
    ///
    /// Valid only from `Idle`; anything else fails with `InvalidForState`.
    pub async fn record(&self) -> SessionResult<()> {
        let options = Box::new(self.options());
        let (reply, response) = oneshot::channel();
        self.submit(SessionRequest::Record { options, reply }, response)
            .await
    }

    /// Suspend an active recording. Valid only from `Recording`.
    pub async fn pause(&self) -> SessionResult<()> {
        self.command(Command::Pause).await
    }

    /// Continue a paused recording. Valid only from `Paused`.
    pub async fn resume(&self) -> SessionResult<()> {
        self.command(Command::Resume).await
    }

    /// End the session and deliver the artifact. Valid from `Recording` or
    /// `Paused`. Once this returns, no further countdown tick for the
    /// session will be applied.
    pub async fn stop_recording(&self) -> SessionResult<()> {
        self.command(Command::Stop).await
    }

    /// Abort the start-delay countdown and return to `Idle`. Valid only
    /// during the countdown; once this returns, no further tick for the
    /// session will be applied.
    pub async fn cancel(&self) -> SessionResult<()> {
        self.command(Command::Cancel).await
    }

    /// Replace the stored configuration for subsequent sessions.
    ///
    /// Fails with [`SessionError::SessionBusy`] while a session (countdown
    /// included) is underway, leaving the stored options untouched.
    pub async fn update_options(&self, options: Options) -> SessionResult<()> {
        let (reply, response) = oneshot::channel();
        self.submit(
            SessionRequest::UpdateOptions {
                options: Box::new(options),
                reply,
            },
            response,
        )
        .await
    }

    /// Snapshot of the current state. Pure read; never blocked behind a
    /// backend call.
    pub fn state(&self) -> RecordingState {
        *self.state.read()
    }

    /// True while a session is underway, recording or paused. This is the
    /// value UI toggle buttons should key off.
    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    /// Snapshot of the currently configured options.
    pub fn options(&self) -> Options {
        self.options.read().clone()
    }

    /// Accumulated recording time for the current session, excluding
    /// countdown and paused periods.
    pub async fn duration(&self) -> Duration {
        let (reply, response) = oneshot::channel();
        if self
            .requests
            .send(SessionRequest::Duration { reply })
            .await
            .is_err()
        {
            return Duration::ZERO;
        }
        response.await.unwrap_or(Duration::ZERO)
    }

    /// Register an observer, invoked after all earlier registrations on
    /// every committed transition. With `emit_current` the observer
    /// immediately receives the current state.
    ///
    /// Must not be called from inside an observer callback; the registry
    /// lock held during dispatch is not reentrant. See [`SessionObserver`].
    pub fn add_observer(&self, observer: Box<dyn SessionObserver>, emit_current: bool) {
        let mut registry = self.observers.lock();
        let current = self.state();
        registry.add(observer, emit_current.then_some(&current));
    }

    /// Subscribe to the session event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Wire a notification surface to the session, if notifications are
    /// enabled in the current options. The surface immediately receives
    /// either the current state or a dismiss.
    pub fn attach_notification_surface(&self, surface: Box<dyn NotificationSurface>) {
        let options = self.options();
        if !options.show_notification {
            tracing::debug!("notifications disabled; surface not attached");
            return;
        }
        let bridge = NotificationBridge::new(options.notification, surface);
        self.add_observer(Box::new(bridge), true);
    }

    async fn command(&self, command: Command) -> SessionResult<()> {
        let (reply, response) = oneshot::channel();
        self.submit(
            SessionRequest::Command {
                command,
                reply: Some(reply),
            },
            response,
        )
        .await
    }

    async fn submit(
        &self,
        request: SessionRequest,
        response: oneshot::Receiver<SessionResult<()>>,
    ) -> SessionResult<()> {
        self.requests
            .send(request)
            .await
            .map_err(|_| SessionError::Terminated)?;
        response.await.map_err(|_| SessionError::Terminated)?
    }
}

/// The background task owning the session: backend, frozen options, and
/// every side effect. Single consumer of the request queue.
struct SessionTask {
    backend: Box<dyn CaptureBackend>,
    state: Arc<RwLock<RecordingState>>,
    options: Arc<RwLock<Options>>,
    observers: Arc<Mutex<ObserverRegistry>>,
    events: broadcast::Sender<SessionEvent>,
    /// Weak so the task itself never keeps the queue alive.
    requests: mpsc::WeakSender<SessionRequest>,
    /// Options frozen at the `record()` call for the running session.
    session_options: Options,
    countdown: Option<Countdown>,
    capture: Option<CaptureHandle>,
    auto_stop: Option<JoinHandle<()>>,
    /// Recording time accumulated over finished segments.
    completed: Duration,
    /// Start of the current recording segment, while in `Recording`.
    segment_started: Option<Instant>,
}

impl SessionTask {
    async fn run(mut self, mut requests: mpsc::Receiver<SessionRequest>) {
        while let Some(request) = requests.recv().await {
            match request {
                SessionRequest::Record { options, reply } => {
                    let result = self.handle_record(*options).await;
                    self.reply_and_report(reply, result);
                }
                SessionRequest::Command {
                    command,
                    reply: Some(reply),
                } => {
                    let result = self.apply(command).await;
                    self.reply_and_report(reply, result);
                }
                SessionRequest::Command {
                    command,
                    reply: None,
                } => {
                    // Internal source: a countdown tick or the auto-stop
                    // watchdog. A stale tick arriving after a cancel lands
                    // here and is rejected without a state change; backend
                    // failures still reach the observers.
                    if let Err(error) = self.apply(command).await {
                        match &error {
                            SessionError::Transition(_) => {
                                tracing::debug!("internal command {command:?} dropped: {error}");
                            }
                            _ => {
                                self.observers.lock().notify_error(&error);
                                let _ = self.events.send(SessionEvent::Error(error.clone()));
                            }
                        }
                    }
                }
                SessionRequest::UpdateOptions { options, reply } => {
                    let result = self.handle_update_options(*options);
                    self.reply_and_report(reply, result);
                }
                SessionRequest::Duration { reply } => {
                    let _ = reply.send(self.duration());
                }
            }
        }
        tracing::debug!("all session handles dropped; controller task exiting");
    }

    /// Deliver a failure to observers and the event stream, then answer
    /// the caller either way.
    fn reply_and_report(&mut self, reply: Reply, result: SessionResult<()>) {
        if let Err(error) = &result {
            self.observers.lock().notify_error(error);
            let _ = self.events.send(SessionEvent::Error(error.clone()));
        }
        let _ = reply.send(result);
    }

    async fn handle_record(&mut self, options: Options) -> SessionResult<()> {
        let command = Command::Start {
            delay_seconds: options.delay_seconds(),
            record_on_tap: options.record_on_tap,
        };
        // Validate before freezing the snapshot, so a rejected record()
        // cannot clobber the options of a running session.
        transition(*self.state.read(), command)?;

        tracing::info!(
            delay_ms = options.start_delay_ms,
            "starting recording session"
        );
        self.session_options = options;
        self.completed = Duration::ZERO;
        self.segment_started = None;
        self.apply(command).await
    }

    fn handle_update_options(&mut self, options: Options) -> SessionResult<()> {
        if !self.state.read().is_idle() {
            return Err(SessionError::SessionBusy);
        }
        *self.options.write() = options;
        Ok(())
    }

    /// Apply one command: run the transition function, perform the side
    /// effect the transition implies, and commit the new state. On any
    /// failure the visible state is exactly what the error policy dictates
    /// (unchanged for pause/resume, `Idle` for start/stop failures).
    async fn apply(&mut self, command: Command) -> SessionResult<()> {
        let current = *self.state.read();
        let next = transition(current, command)?;

        use RecordingState::*;
        match (current, next) {
            (Idle, Delay { remaining_seconds }) => {
                self.countdown = Some(Countdown::start(remaining_seconds, self.requests.clone()));
                self.commit(next);
                Ok(())
            }
            (Idle, Recording) => self.start_capture().await,
            (Delay { .. }, Delay { .. }) => {
                self.commit(next);
                Ok(())
            }
            (Delay { .. }, Recording) => {
                // Countdown exhausted; its task has already finished.
                self.countdown = None;
                self.start_capture().await
            }
            (Delay { .. }, Idle) => {
                self.stop_countdown();
                self.commit(Idle);
                tracing::info!("countdown cancelled");
                Ok(())
            }
            (Recording, Paused) => {
                let handle = self.capture_handle()?;
                self.backend.pause(handle).await?;
                self.pause_clock();
                self.disarm_auto_stop();
                self.commit(Paused);
                tracing::info!("recording paused");
                Ok(())
            }
            (Paused, Recording) => {
                let handle = self.capture_handle()?;
                self.backend.resume(handle).await?;
                self.segment_started = Some(Instant::now());
                self.commit(Recording);
                self.arm_auto_stop();
                tracing::info!("recording resumed");
                Ok(())
            }
            (Recording, Idle) | (Paused, Idle) => self.stop_capture().await,
            // The transition table admits no other pairs.
            (from, to) => {
                tracing::error!("unexpected transition {from:?} -> {to:?}");
                Ok(())
            }
        }
    }

    /// Invoke backend start and commit `Recording`; on failure roll back
    /// to `Idle` and surface the error.
    async fn start_capture(&mut self) -> SessionResult<()> {
        match self.backend.start(&self.session_options).await {
            Ok(handle) => {
                self.capture = Some(handle);
                self.segment_started = Some(Instant::now());
                self.commit(RecordingState::Recording);
                self.arm_auto_stop();
                tracing::info!("recording started");
                Ok(())
            }
            Err(error) => {
                tracing::warn!("backend start failed: {error}");
                self.capture = None;
                // From a countdown this is a visible Delay -> Idle change;
                // from a direct start the state is already Idle.
                if !self.state.read().is_idle() {
                    self.commit(RecordingState::Idle);
                }
                Err(error.into())
            }
        }
    }

    /// Invoke backend stop, emit the finished artifact exactly once, then
    /// commit `Idle`. The finished event precedes the `Idle` state event so
    /// observers can react to the artifact before any UI reset.
    async fn stop_capture(&mut self) -> SessionResult<()> {
        self.disarm_auto_stop();
        self.pause_clock();
        let handle = self.capture_handle()?;
        self.capture = None;

        match self.backend.stop(handle).await {
            Ok(artifact) => {
                *self.state.write() = RecordingState::Idle;
                self.observers.lock().notify_finished(&artifact);
                let _ = self.events.send(SessionEvent::Finished(artifact.clone()));
                self.notify_state(RecordingState::Idle);
                tracing::info!("recording stopped, artifact at {}", artifact.display());
                Ok(())
            }
            Err(error) => {
                tracing::error!("backend stop failed: {error}");
                // The session is over either way: no artifact, error only.
                self.commit(RecordingState::Idle);
                Err(error.into())
            }
        }
    }

    /// Write the shared snapshot, then fan out to observers and the event
    /// stream. The state lock is released before dispatch.
    fn commit(&mut self, next: RecordingState) {
        *self.state.write() = next;
        self.notify_state(next);
    }

    fn notify_state(&mut self, state: RecordingState) {
        tracing::debug!("state -> {state:?}");
        self.observers.lock().notify_state(&state);
        let _ = self.events.send(SessionEvent::StateChanged(state));
    }

    fn capture_handle(&self) -> SessionResult<CaptureHandle> {
        self.capture.ok_or_else(|| {
            crate::capture::BackendError::EncoderFailure("no active capture handle".to_string())
                .into()
        })
    }

    fn stop_countdown(&mut self) {
        if let Some(countdown) = self.countdown.take() {
            countdown.cancel();
        }
    }

    fn pause_clock(&mut self) {
        if let Some(started) = self.segment_started.take() {
            self.completed += started.elapsed();
        }
    }

    fn duration(&self) -> Duration {
        let current = self
            .segment_started
            .map(|started| started.elapsed())
            .unwrap_or(Duration::ZERO);
        self.completed + current
    }

    /// Schedule a stop once the configured maximum length is reached.
    /// Paused time does not count: the watchdog is disarmed on pause and
    /// rearmed with the remaining allowance on resume.
    fn arm_auto_stop(&mut self) {
        let max_secs = self.session_options.video.max_length_secs;
        if max_secs == 0 {
            return;
        }
        let limit = Duration::from_secs(u64::from(max_secs));
        let remaining = limit.saturating_sub(self.duration());
        let requests = self.requests.clone();

        self.auto_stop = Some(tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            if let Some(tx) = requests.upgrade() {
                tracing::info!("maximum recording length reached; stopping");
                let _ = tx
                    .send(SessionRequest::Command {
                        command: Command::Stop,
                        reply: None,
                    })
                    .await;
            }
        }));
    }

    fn disarm_auto_stop(&mut self) {
        if let Some(task) = self.auto_stop.take() {
            task.abort();
        }
    }
}
