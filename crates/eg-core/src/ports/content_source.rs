use async_trait::async_trait;

use crate::epigram::{Epigram, EpigramDraft, EpigramId, EpigramPatch};

#[derive(Debug, Clone, thiserror::Error)]
pub enum ContentSourceError {
    /// Equivalent content already exists server-side. The caller must change
    /// the input; retrying as-is cannot succeed.
    #[error("equivalent content already exists")]
    Conflict,

    /// Transient transport or server failure. Retrying the same operation
    /// is a valid recovery.
    #[error("content source unavailable: {0}")]
    Unavailable(String),
}

/// Backend content operations the pipeline depends on.
#[async_trait]
pub trait ContentSourcePort: Send + Sync {
    /// Fetch up to `count` random approved epigrams.
    ///
    /// `exclude` is a best-effort hint only; the source may still return
    /// that id, and it never excludes anything else already queued
    /// client-side. May return fewer than `count` items, including none;
    /// an empty batch is a valid outcome, not an error.
    async fn fetch_random_batch(
        &self,
        count: usize,
        exclude: Option<EpigramId>,
    ) -> Result<Vec<Epigram>, ContentSourceError>;

    /// Create a new epigram from the draft.
    async fn create(&self, draft: &EpigramDraft) -> Result<Epigram, ContentSourceError>;

    /// Apply a partial update to an existing epigram.
    async fn update(
        &self,
        id: EpigramId,
        patch: &EpigramPatch,
    ) -> Result<Epigram, ContentSourceError>;

    /// Delete an epigram by id.
    async fn delete(&self, id: EpigramId) -> Result<(), ContentSourceError>;

    /// Epigrams submitted by the current user, newest first.
    async fn list_mine(&self) -> Result<Vec<Epigram>, ContentSourceError>;
}
