use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::settings::model::DisplaySettings;

/// Persisted per-user display preferences.
#[async_trait]
pub trait PreferencesPort: Send + Sync {
    async fn load(&self) -> anyhow::Result<DisplaySettings>;

    /// Persist new settings and return the record as stored.
    async fn save(&self, settings: &DisplaySettings) -> anyhow::Result<DisplaySettings>;

    /// Stream of settings records as the store sees them change.
    ///
    /// Implementations emit a record whenever it differs from the previously
    /// observed one; the stream ends when the receiver is dropped or the
    /// store goes away.
    async fn subscribe_changes(&self) -> anyhow::Result<mpsc::Receiver<DisplaySettings>>;
}
