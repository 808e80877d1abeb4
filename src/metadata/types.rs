use serde::{Deserialize, Serialize};

/// Title used when nothing at all can be derived from a URL.
pub const UNTITLED: &str = "Untitled Link";
pub const YOUTUBE_TITLE: &str = "YouTube Video";

/// Attached to a result when every relay failed and only defaults are shown.
pub const RESTRICTED_ACCESS: &str = "restricted-access: default information only";
/// Attached to a result when the full phase faulted.
pub const METADATA_UNAVAILABLE: &str = "metadata unavailable";

/// Outcome of one extraction phase. Never persisted, only used to pre-fill
/// the editable fields of a new link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionResult {
    pub fn has_error(&self) -> bool {
        self.error.as_deref().is_some_and(|e| !e.is_empty())
    }

    pub(crate) fn unavailable() -> Self {
        Self {
            title: Some(UNTITLED.to_string()),
            error: Some(METADATA_UNAVAILABLE.to_string()),
            ..Default::default()
        }
    }
}

/// Social preview fields found in a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl PageMeta {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.image.is_none()
    }
}

/// Extraction progress. Ordered, so callers can wait for "at least" a phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    QuickReturned,
    Fetching,
    Parsed,
    FetchFailed,
    Settled,
}

/// Failure of a single relay attempt. Only ever logged.
#[derive(thiserror::Error, Debug)]
pub enum RelayError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("response is not json: {0}")]
    NotJson(String),

    #[error("response has neither `contents` nor `body`")]
    MissingContent,

    #[error("response is larger than {0} bytes")]
    TooLarge(u64),
}

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("page could not be fetched through any relay ({attempts} tried)")]
    Exhausted { attempts: usize },
}
