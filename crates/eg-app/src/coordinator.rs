//! Composition glue for the display pipeline.
//!
//! Wires preference changes and session transitions into the timer, routes
//! the timer's fire into the queue, and forwards every displayed-item event
//! back into the timer. Everything goes through the core ports, so neither
//! stateful component references the other. This layer holds no state of its
//! own beyond the wiring.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tracing::{info_span, warn, Instrument};

use eg_core::ports::{
    AdvancePort, ClockPort, ContentSourceError, ContentSourcePort, DisplayEventPort,
    NoticeKind, NotifierPort, PreferencesPort,
};
use eg_core::{DisplaySettings, Epigram, EpigramDraft, EpigramId, EpigramPatch};

use crate::services::auto_advance::AutoAdvanceTimer;
use crate::services::queue::{EpigramQueue, QueueConfig};

/// Forwards displayed-item events from the queue to the timer.
///
/// The slot is filled right after construction; events arriving before that
/// (there are none in practice) would be dropped, not buffered.
struct TimerResetHook {
    timer: OnceLock<AutoAdvanceTimer>,
}

impl DisplayEventPort for TimerResetHook {
    fn item_displayed(&self) {
        if let Some(timer) = self.timer.get() {
            timer.reset();
        }
    }
}

/// Forwards the timer's fire to the queue.
struct QueueAdvanceTarget {
    queue: EpigramQueue,
}

#[async_trait]
impl AdvancePort for QueueAdvanceTarget {
    async fn advance(&self) -> anyhow::Result<()> {
        self.queue.advance().await?;
        Ok(())
    }
}

/// Owns the assembled pipeline and translates operation outcomes into user
/// notices.
pub struct DisplayCoordinator {
    queue: EpigramQueue,
    timer: AutoAdvanceTimer,
    source: Arc<dyn ContentSourcePort>,
    preferences: Arc<dyn PreferencesPort>,
    notifier: Arc<dyn NotifierPort>,
}

impl DisplayCoordinator {
    pub fn new(
        source: Arc<dyn ContentSourcePort>,
        preferences: Arc<dyn PreferencesPort>,
        notifier: Arc<dyn NotifierPort>,
        clock: Arc<dyn ClockPort>,
        config: QueueConfig,
    ) -> Self {
        let hook = Arc::new(TimerResetHook {
            timer: OnceLock::new(),
        });
        let queue = EpigramQueue::new(source.clone(), clock.clone(), hook.clone(), config);
        let timer = AutoAdvanceTimer::new(
            Arc::new(QueueAdvanceTarget {
                queue: queue.clone(),
            }),
            clock,
        );
        hook.timer
            .set(timer.clone())
            .unwrap_or_else(|_| unreachable!("display hook wired twice"));

        Self {
            queue,
            timer,
            source,
            preferences,
            notifier,
        }
    }

    pub fn queue(&self) -> &EpigramQueue {
        &self.queue
    }

    pub fn timer(&self) -> &AutoAdvanceTimer {
        &self.timer
    }

    /// A changed preference record flows one-way into the timer.
    pub fn apply_display_settings(&self, settings: &DisplaySettings) {
        self.timer.update_settings(settings);
    }

    /// Forward preference-store change notifications into the timer until
    /// the stream ends. Meant to run as a background task next to the shell.
    pub async fn watch_preferences(&self) -> anyhow::Result<()> {
        let mut changes = self.preferences.subscribe_changes().await?;
        while let Some(settings) = changes.recv().await {
            self.timer.update_settings(&settings);
        }
        Ok(())
    }

    /// Persist new display settings, then apply the stored record.
    pub async fn update_display_settings(
        &self,
        settings: DisplaySettings,
    ) -> anyhow::Result<DisplaySettings> {
        let span = info_span!("coordinator.update_display_settings");
        async {
            match self.preferences.save(&settings).await {
                Ok(stored) => {
                    self.timer.update_settings(&stored);
                    Ok(stored)
                }
                Err(err) => {
                    self.notifier
                        .notify(NoticeKind::Error, "Failed to save settings", None)
                        .await;
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Login: reload preferences and re-arm the timer from them.
    pub async fn handle_login(&self) {
        match self.preferences.load().await {
            Ok(settings) => self.timer.update_settings(&settings),
            Err(err) => {
                warn!(error = %err, "failed to load display settings after login");
            }
        }
    }

    /// Logout: no unattended advances for a signed-out session.
    pub fn handle_logout(&self) {
        self.timer.stop();
    }

    /// Submit a draft and surface the outcome to the user. A conflict gets
    /// its own message so the user knows to change the text rather than
    /// retry.
    pub async fn submit(&self, draft: EpigramDraft) -> Result<Epigram, ContentSourceError> {
        match self.queue.submit(draft).await {
            Ok(created) => {
                self.notifier
                    .notify(NoticeKind::Success, "Epigram submitted successfully", None)
                    .await;
                Ok(created)
            }
            Err(err @ ContentSourceError::Conflict) => {
                self.notifier
                    .notify(NoticeKind::Error, "This epigram already exists", None)
                    .await;
                Err(err)
            }
            Err(err) => {
                self.notifier
                    .notify(NoticeKind::Error, "Failed to submit epigram", None)
                    .await;
                Err(err)
            }
        }
    }

    /// Delete one of the user's epigrams and reconcile the display so a
    /// removed item never lingers on screen.
    pub async fn delete(&self, id: EpigramId) -> Result<(), ContentSourceError> {
        match self.source.delete(id).await {
            Ok(()) => {
                if let Err(err) = self.queue.handle_external_deletion(id).await {
                    warn!(error = %err, "failed to advance past deleted epigram");
                }
                self.notifier
                    .notify(NoticeKind::Success, "Epigram deleted successfully", None)
                    .await;
                Ok(())
            }
            Err(err) => {
                self.notifier
                    .notify(NoticeKind::Error, "Failed to delete epigram", None)
                    .await;
                Err(err)
            }
        }
    }

    /// Edit one of the user's epigrams and propagate the new record into
    /// every client-side copy.
    pub async fn update(
        &self,
        id: EpigramId,
        patch: EpigramPatch,
    ) -> Result<Epigram, ContentSourceError> {
        match self.source.update(id, &patch).await {
            Ok(updated) => {
                self.queue.update_in_place(updated.clone());
                self.notifier
                    .notify(NoticeKind::Success, "Epigram updated successfully", None)
                    .await;
                Ok(updated)
            }
            Err(err) => {
                self.notifier
                    .notify(NoticeKind::Error, "Failed to update epigram", None)
                    .await;
                Err(err)
            }
        }
    }
}
