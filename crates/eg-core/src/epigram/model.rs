use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned numeric identity of an epigram.
///
/// Identity is the only field the client compares when deduplicating; two
/// records with the same id are the same epigram regardless of payload.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EpigramId(pub i64);

impl std::fmt::Display for EpigramId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for EpigramId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

/// Moderation state of an epigram. Encoded as an integer on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum EpigramStatus {
    Pending,
    Approved,
    Rejected,
}

impl From<EpigramStatus> for u8 {
    fn from(status: EpigramStatus) -> Self {
        match status {
            EpigramStatus::Pending => 0,
            EpigramStatus::Approved => 1,
            EpigramStatus::Rejected => 2,
        }
    }
}

impl TryFrom<u8> for EpigramStatus {
    type Error = String;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(EpigramStatus::Pending),
            1 => Ok(EpigramStatus::Approved),
            2 => Ok(EpigramStatus::Rejected),
            other => Err(format!("unknown epigram status: {}", other)),
        }
    }
}

/// A single content record as served by the backend.
///
/// Immutable from the client's perspective: the pipeline never edits an
/// epigram in place, it only swaps whole records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Epigram {
    pub id: EpigramId,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub status: EpigramStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a new epigram.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpigramDraft {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Partial update applied to an existing epigram.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EpigramPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}
