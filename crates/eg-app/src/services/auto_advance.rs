//! Unattended advancement: one countdown that asks the queue to move on.
//!
//! The countdown is an explicitly owned component instance, not module
//! state, so tests can build as many independent timers as they like while
//! each instance still enforces the singleton discipline: arming always
//! cancels whatever countdown was live before.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use eg_core::ports::{AdvancePort, ClockPort};
use eg_core::settings::model::DEFAULT_INTERVAL_MINUTES;
use eg_core::DisplaySettings;

/// Countdown status for shells that render a "next in …" display.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TimerStatus {
    pub enabled: bool,
    pub interval_minutes: u32,
    /// Whether a countdown is currently pending.
    pub is_armed: bool,
    /// When the live countdown was started, epoch milliseconds.
    pub started_at_ms: Option<i64>,
}

struct TimerState {
    enabled: bool,
    interval_minutes: u32,
    /// Ownership of the at-most-one live countdown.
    countdown: Option<AbortHandle>,
    started_at_ms: Option<i64>,
    /// Bumped on every arm/disarm. A countdown task may only act while its
    /// own generation is still current, so cancelled or superseded tasks
    /// can never fire or reschedule.
    generation: u64,
}

struct TimerInner {
    advance: Arc<dyn AdvancePort>,
    clock: Arc<dyn ClockPort>,
    state: Mutex<TimerState>,
    status_tx: watch::Sender<TimerStatus>,
}

/// Handle to the auto-advance timer. Cheap to clone; all clones share the
/// same countdown. Arming requires a running Tokio runtime.
#[derive(Clone)]
pub struct AutoAdvanceTimer {
    inner: Arc<TimerInner>,
}

impl AutoAdvanceTimer {
    pub fn new(advance: Arc<dyn AdvancePort>, clock: Arc<dyn ClockPort>) -> Self {
        let (status_tx, _) = watch::channel(TimerStatus {
            enabled: false,
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            is_armed: false,
            started_at_ms: None,
        });

        Self {
            inner: Arc::new(TimerInner {
                advance,
                clock,
                state: Mutex::new(TimerState {
                    enabled: false,
                    interval_minutes: DEFAULT_INTERVAL_MINUTES,
                    countdown: None,
                    started_at_ms: None,
                    generation: 0,
                }),
                status_tx,
            }),
        }
    }

    /// Apply externally controlled settings.
    ///
    /// Any pending countdown is cancelled first; a fresh full-interval one
    /// starts only for an enabled, in-bounds configuration. An out-of-bounds
    /// interval falls back to the default and leaves the timer disarmed
    /// until a corrected update or the next reset.
    pub fn update_settings(&self, settings: &DisplaySettings) {
        let mut state = self.lock();
        state.enabled = settings.auto_advance_enabled;

        if settings.interval_is_valid() {
            state.interval_minutes = settings.auto_advance_interval_minutes;
            self.disarm_locked(&mut state);
            if state.enabled {
                self.arm_locked(&mut state);
            }
        } else {
            warn!(
                interval_minutes = settings.auto_advance_interval_minutes,
                fallback = DEFAULT_INTERVAL_MINUTES,
                "auto-advance interval out of bounds; using default, not arming"
            );
            state.interval_minutes = DEFAULT_INTERVAL_MINUTES;
            self.disarm_locked(&mut state);
        }
        self.publish(&state);
    }

    /// Restart the countdown at the full interval.
    ///
    /// Called whenever the displayed item changes, whatever actor caused the
    /// change; this is what keeps the timer from firing right after a
    /// manual advance. No-op while disabled.
    pub fn reset(&self) {
        let mut state = self.lock();
        if !state.enabled {
            return;
        }
        self.arm_locked(&mut state);
        self.publish(&state);
    }

    /// Cancel any pending countdown, e.g. on logout. Settings are kept; a
    /// later `update_settings` or `reset` re-arms.
    pub fn stop(&self) {
        let mut state = self.lock();
        self.disarm_locked(&mut state);
        self.publish(&state);
    }

    pub fn status(&self) -> TimerStatus {
        self.inner.status_tx.borrow().clone()
    }

    /// Observe status changes. The receiver immediately sees the latest one.
    pub fn subscribe(&self) -> watch::Receiver<TimerStatus> {
        self.inner.status_tx.subscribe()
    }

    fn disarm_locked(&self, state: &mut TimerState) {
        state.generation += 1;
        if let Some(handle) = state.countdown.take() {
            handle.abort();
        }
        state.started_at_ms = None;
    }

    /// Start a full-interval countdown, cancelling any live one first.
    fn arm_locked(&self, state: &mut TimerState) {
        if let Some(handle) = state.countdown.take() {
            handle.abort();
        }
        state.generation += 1;
        let generation = state.generation;
        let interval = Duration::from_secs(u64::from(state.interval_minutes) * 60);
        state.started_at_ms = Some(self.inner.clock.now_ms());

        let timer = self.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            timer.fire(generation).await;
        });
        state.countdown = Some(task.abort_handle());
    }

    /// Countdown elapsed: drive one advance, then start the next cycle.
    async fn fire(&self, generation: u64) {
        {
            let mut state = self.lock();
            if state.generation != generation || !state.enabled {
                // A newer countdown owns the cycle.
                return;
            }
            state.countdown = None;
            state.started_at_ms = None;
            self.publish(&state);
        }

        debug!("auto-advance countdown elapsed");
        if let Err(err) = self.inner.advance.advance().await {
            // The unattended cycle keeps going; a transient failure only
            // skips one window.
            warn!(error = %err, "auto-advance failed");
        }

        let mut state = self.lock();
        if state.enabled && state.generation == generation {
            // The advance did not change the displayed item (so no reset
            // arrived); start the next full window ourselves.
            self.arm_locked(&mut state);
            self.publish(&state);
        }
    }

    fn lock(&self) -> MutexGuard<'_, TimerState> {
        self.inner.state.lock().expect("timer state lock poisoned")
    }

    fn publish(&self, state: &TimerState) {
        self.inner.status_tx.send_replace(TimerStatus {
            enabled: state.enabled,
            interval_minutes: state.interval_minutes,
            is_armed: state.countdown.is_some(),
            started_at_ms: state.started_at_ms,
        });
    }
}
