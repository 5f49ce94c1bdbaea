//! Countdown scheduler
//!
//! Drives the start-delay state: one tick per elapsed second, submitted as
//! a command into the controller's queue rather than mutating state
//! directly. The task holds only a weak sender, so an abandoned controller
//! is never kept alive by a pending countdown.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::recorder::controller::SessionRequest;
use crate::recorder::state::Command;

/// A running countdown for one session's start delay.
pub(crate) struct Countdown {
    task: JoinHandle<()>,
}

impl Countdown {
    /// Spawn a task emitting `seconds` tick commands, one per second, then
    /// exiting. Timer starvation is handled by bursting the owed ticks; the
    /// transition function clamps the remaining count, so a burst can only
    /// reach the start boundary, never cross it.
    pub fn start(seconds: u32, requests: mpsc::WeakSender<SessionRequest>) -> Self {
        let task = tokio::spawn(async move {
            let mut timer = interval(Duration::from_secs(1));
            timer.set_missed_tick_behavior(MissedTickBehavior::Burst);
            // The first interval tick completes immediately; skip it so the
            // first command arrives one second from now.
            timer.tick().await;

            for _ in 0..seconds {
                timer.tick().await;
                let Some(tx) = requests.upgrade() else { break };
                let sent = tx
                    .send(SessionRequest::Command {
                        command: Command::Tick,
                        reply: None,
                    })
                    .await;
                if sent.is_err() {
                    break;
                }
            }
        });

        Self { task }
    }

    /// Abort the countdown. Ticks already queued behind a cancel command
    /// are rejected by the state machine, so cancellation is observed at
    /// most once.
    pub fn cancel(&self) {
        self.task.abort();
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test(start_paused = true)]
    async fn test_emits_exactly_the_requested_number_of_ticks() {
        let (tx, mut rx) = mpsc::channel(16);
        let _countdown = Countdown::start(3, tx.downgrade());

        for _ in 0..3 {
            let request = timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("tick should arrive")
                .expect("channel open");
            assert!(matches!(
                request,
                SessionRequest::Command {
                    command: Command::Tick,
                    reply: None,
                }
            ));
        }

        // No fourth tick
        assert!(timeout(Duration::from_secs(5), rx.recv()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_further_ticks() {
        let (tx, mut rx) = mpsc::channel(16);
        let countdown = Countdown::start(10, tx.downgrade());

        let first = timeout(Duration::from_secs(5), rx.recv()).await;
        assert!(first.is_ok());

        countdown.cancel();
        assert!(timeout(Duration::from_secs(30), rx.recv()).await.is_err());
    }
}
