use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Method;
use tokio::sync::mpsc;
use tracing::debug;

use eg_core::ports::PreferencesPort;
use eg_core::DisplaySettings;

use super::client::{ApiClient, ApiConfig};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Preference store backed by the backend's `/users/settings` routes.
///
/// `DisplaySettings` already speaks the backend's wire vocabulary, so the
/// records pass through without a mapping layer; unknown fields on the
/// stored record are ignored. The backend pushes nothing, so change
/// notifications are produced by polling the record and emitting it when it
/// differs from the previously observed one.
pub struct HttpPreferences {
    api: ApiClient,
    poll_interval: Duration,
}

impl HttpPreferences {
    pub fn new(config: ApiConfig) -> anyhow::Result<Self> {
        Ok(Self {
            api: ApiClient::new(config)?,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

async fn fetch_settings(api: &ApiClient) -> anyhow::Result<DisplaySettings> {
    let response = api
        .request(Method::GET, "/users/settings")
        .send()
        .await
        .context("user settings request failed")?
        .error_for_status()
        .context("user settings request rejected")?;

    response
        .json()
        .await
        .context("failed to decode user settings")
}

#[async_trait]
impl PreferencesPort for HttpPreferences {
    async fn load(&self) -> anyhow::Result<DisplaySettings> {
        fetch_settings(&self.api).await
    }

    async fn save(&self, settings: &DisplaySettings) -> anyhow::Result<DisplaySettings> {
        let response = self
            .api
            .request(Method::PUT, "/users/settings")
            .json(settings)
            .send()
            .await
            .context("user settings update failed")?
            .error_for_status()
            .context("user settings update rejected")?;

        response
            .json()
            .await
            .context("failed to decode stored user settings")
    }

    async fn subscribe_changes(&self) -> anyhow::Result<mpsc::Receiver<DisplaySettings>> {
        let (tx, rx) = mpsc::channel(8);
        let api = self.api.clone();
        let poll_interval = self.poll_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            let mut last: Option<DisplaySettings> = None;

            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    break;
                }

                match fetch_settings(&api).await {
                    Ok(settings) => {
                        if last.as_ref() == Some(&settings) {
                            continue;
                        }
                        if tx.send(settings.clone()).await.is_err() {
                            break;
                        }
                        last = Some(settings);
                    }
                    Err(err) => {
                        // Polling is best-effort; the stale record stands
                        // until the next round succeeds.
                        debug!(error = %err, "user settings poll failed");
                    }
                }
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn load_parses_the_backend_record() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/users/settings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "user_id": 7,
                    "auto_reload_enabled": true,
                    "auto_reload_interval_minutes": 15
                }"#,
            )
            .create_async()
            .await;

        let preferences = HttpPreferences::new(ApiConfig::new(server.url())).unwrap();
        let settings = preferences.load().await.unwrap();

        assert!(settings.auto_advance_enabled);
        assert_eq!(settings.auto_advance_interval_minutes, 15);
    }

    #[tokio::test]
    async fn save_round_trips_the_stored_record() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/users/settings")
            .match_body(Matcher::JsonString(
                r#"{"auto_reload_enabled": true, "auto_reload_interval_minutes": 30}"#.into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"auto_reload_enabled": true, "auto_reload_interval_minutes": 30}"#)
            .create_async()
            .await;

        let preferences = HttpPreferences::new(ApiConfig::new(server.url())).unwrap();
        let stored = preferences
            .save(&DisplaySettings {
                auto_advance_enabled: true,
                auto_advance_interval_minutes: 30,
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(stored.auto_advance_interval_minutes, 30);
    }

    #[tokio::test]
    async fn load_failure_is_an_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/users/settings")
            .with_status(503)
            .create_async()
            .await;

        let preferences = HttpPreferences::new(ApiConfig::new(server.url())).unwrap();
        assert!(preferences.load().await.is_err());
    }

    #[tokio::test]
    async fn subscribe_emits_the_record_and_skips_unchanged_polls() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/users/settings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"auto_reload_enabled": true, "auto_reload_interval_minutes": 10}"#)
            .create_async()
            .await;

        let preferences = HttpPreferences::new(ApiConfig::new(server.url()))
            .unwrap()
            .with_poll_interval(Duration::from_millis(20));

        let mut changes = preferences.subscribe_changes().await.unwrap();
        let first = tokio::time::timeout(Duration::from_secs(5), changes.recv())
            .await
            .expect("first change within the timeout")
            .expect("stream still open");
        assert_eq!(first.auto_advance_interval_minutes, 10);

        // Give the poller a few more rounds; the unchanged record must not
        // be emitted again.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(changes.try_recv().is_err());
    }
}
