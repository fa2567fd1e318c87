use async_trait::async_trait;

/// Visual weight of a user notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Info,
    Warning,
}

/// Fire-and-forget presentation of a message to the user.
///
/// The pipeline owns no rendering; a UI shell backs this with its toast
/// stack, headless consumers with a log sink.
#[async_trait]
pub trait NotifierPort: Send + Sync {
    async fn notify(&self, kind: NoticeKind, title: &str, message: Option<&str>);
}
