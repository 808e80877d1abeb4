use std::{
    fmt::Display,
    io::{self, ErrorKind},
    ops::Deref,
    sync::Arc,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{metadata::normalize_url, storage::StorageManager};

/// Storage key of the persisted collection.
pub const LINKS_KEY: &str = "saved-links.json";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(String);

impl LinkId {
    #[inline]
    pub fn new() -> LinkId {
        LinkId(rusty_ulid::generate_ulid_string())
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LinkId {
    fn from(id: &str) -> Self {
        LinkId(id.to_string())
    }
}

impl From<String> for LinkId {
    fn from(id: String) -> Self {
        LinkId(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: LinkId,
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub added_at: DateTime<Utc>,
}

/// What the add form submits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCreate {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Link {
    /// Normalize and validate a submission. The title falls back to the URL.
    pub fn from_create(create: LinkCreate, now: DateTime<Utc>) -> Result<Link, StoreError> {
        let raw = create.url.trim();
        if raw.is_empty() {
            return Err(StoreError::InvalidUrl("url is empty".to_string()));
        }

        let url = normalize_url(raw);
        let parsed = Url::parse(&url).map_err(|err| StoreError::InvalidUrl(format!("{url}: {err}")))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(StoreError::InvalidUrl(url));
        }

        let title = non_blank(create.title).unwrap_or_else(|| url.clone());

        Ok(Link {
            id: LinkId::new(),
            title,
            url,
            description: non_blank(create.description),
            thumbnail: non_blank(create.thumbnail),
            added_at: now,
        })
    }
}

/// Immutable view of the collection, newest first. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct Snapshot(Arc<Vec<Link>>);

impl Snapshot {
    pub fn get(&self, id: &LinkId) -> Option<&Link> {
        self.0.iter().find(|link| &link.id == id)
    }
}

impl Deref for Snapshot {
    type Target = [Link];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Link>> for Snapshot {
    fn from(links: Vec<Link>) -> Self {
        Snapshot(Arc::new(links))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("link {0} not found")]
    NotFound(String),

    #[error("storage error: {0}")]
    Io(#[from] io::Error),

    #[error("could not serialize links: {0}")]
    Serde(#[from] serde_json::Error),
}

/// The saved links, kept as one keyed storage entry.
#[derive(Clone)]
pub struct LinkStore {
    storage: Arc<dyn StorageManager>,
}

impl LinkStore {
    pub fn new(storage: Arc<dyn StorageManager>) -> Self {
        Self { storage }
    }

    /// Never fails. A missing entry is an empty collection, so is an
    /// unreadable one.
    pub fn load(&self) -> Snapshot {
        Snapshot::from(self.read_links())
    }

    fn read_links(&self) -> Vec<Link> {
        let data = match self.storage.read(LINKS_KEY) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return vec![],
            Err(err) => {
                log::error!("could not read {LINKS_KEY}: {err}");
                return vec![];
            }
        };

        match serde_json::from_slice::<Vec<Link>>(&data) {
            Ok(links) => links,
            Err(err) => {
                log::error!("{LINKS_KEY} is corrupt, starting empty: {err}");
                vec![]
            }
        }
    }

    fn persist(&self, links: &[Link]) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(links)?;
        self.storage.write(LINKS_KEY, &data)?;
        Ok(())
    }

    pub fn add(&self, create: LinkCreate) -> Result<(Snapshot, Link), StoreError> {
        let mut link = Link::from_create(create, Utc::now())?;

        let _lock = self.storage.lock_exclusive()?;
        let mut links = self.read_links();

        while links.iter().any(|existing| existing.id == link.id) {
            link.id = LinkId::new();
        }

        links.insert(0, link.clone());
        self.persist(&links)?;

        log::info!("added link {} {}", link.id, link.url);
        Ok((Snapshot::from(links), link))
    }

    pub fn delete(&self, id: &LinkId) -> Result<Snapshot, StoreError> {
        let _lock = self.storage.lock_exclusive()?;
        let mut links = self.read_links();

        let idx = links
            .iter()
            .position(|link| &link.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let removed = links.remove(idx);
        self.persist(&links)?;

        log::info!("deleted link {} {}", removed.id, removed.url);
        Ok(Snapshot::from(links))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::BackendMemory;

    fn now() -> DateTime<Utc> {
        "2026-03-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_from_create_normalizes() {
        let link = Link::from_create(
            LinkCreate {
                url: "  example.com/page ".into(),
                title: Some("   ".into()),
                description: Some("".into()),
                thumbnail: Some(" https://img.example.com/a.png ".into()),
            },
            now(),
        )
        .unwrap();

        assert_eq!(link.url, "https://example.com/page");
        assert_eq!(link.title, "https://example.com/page");
        assert_eq!(link.description, None);
        assert_eq!(link.thumbnail.as_deref(), Some("https://img.example.com/a.png"));
        assert_eq!(link.added_at, now());
    }

    #[test]
    fn test_from_create_rejects() {
        for url in ["", "   ", "http://", "https://exa mple.com"] {
            let result = Link::from_create(
                LinkCreate {
                    url: url.into(),
                    ..Default::default()
                },
                now(),
            );
            assert!(
                matches!(result, Err(StoreError::InvalidUrl(_))),
                "{url:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_serialized_field_names() {
        let link = Link {
            id: "01HZX".into(),
            title: "t".into(),
            url: "https://example.com".into(),
            description: None,
            thumbnail: None,
            added_at: now(),
        };
        let json = serde_json::to_value(&link).unwrap();
        assert_eq!(json["addedAt"], "2026-03-01T12:00:00Z");
        assert_eq!(json["id"], "01HZX");
        assert!(json.get("description").is_none());
        assert!(json.get("thumbnail").is_none());
    }

    #[test]
    fn test_memory_store() {
        let store = LinkStore::new(Arc::new(BackendMemory::new()));
        assert!(store.load().is_empty());

        let (snapshot, first) = store
            .add(LinkCreate {
                url: "https://one.example".into(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get(&first.id), Some(&first));

        let snapshot = store.delete(&first.id).unwrap();
        assert!(snapshot.is_empty());
        assert!(store.load().is_empty());
    }
}
