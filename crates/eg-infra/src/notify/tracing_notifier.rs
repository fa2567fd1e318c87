use async_trait::async_trait;
use tracing::{error, info, warn};

use eg_core::ports::{NoticeKind, NotifierPort};

/// Notifier that lands notices in the log stream.
///
/// For headless shells and tests; a UI shell backs the port with its own
/// toast stack instead.
pub struct TracingNotifier;

#[async_trait]
impl NotifierPort for TracingNotifier {
    async fn notify(&self, kind: NoticeKind, title: &str, message: Option<&str>) {
        match kind {
            NoticeKind::Success | NoticeKind::Info => {
                info!(%title, message = message.unwrap_or_default(), "user notice");
            }
            NoticeKind::Warning => {
                warn!(%title, message = message.unwrap_or_default(), "user notice");
            }
            NoticeKind::Error => {
                error!(%title, message = message.unwrap_or_default(), "user notice");
            }
        }
    }
}
