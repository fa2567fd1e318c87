use async_trait::async_trait;

/// Hook fired in the same task that changes the displayed item, before that
/// task suspends again.
///
/// # Behavior
/// - Called on every change of the current item, whatever actor caused it
///   (manual navigation, initial load, unattended advance).
/// - Must be cheap and must not call back into the queue.
pub trait DisplayEventPort: Send + Sync {
    fn item_displayed(&self);
}

/// Target the countdown drives when it fires.
#[async_trait]
pub trait AdvancePort: Send + Sync {
    async fn advance(&self) -> anyhow::Result<()>;
}
