use std::{sync::Arc, time::Duration};

use anyhow::Context;
use chrono::Utc;

use crate::{
    card::LinkCard,
    config::{self, Config},
    links::{Link, LinkCreate, LinkId, LinkStore, Snapshot, StoreError},
    metadata::{Extractor, RelayChain},
    preview::PreviewSession,
    storage::BackendLocal,
};

/// Everything the surfaces need: configuration, the saved links and the
/// metadata extractor. Shared by the CLI and the daemon.
pub struct App {
    config: Config,
    store: LinkStore,
    extractor: Arc<Extractor>,
}

impl App {
    /// Open the data directory, creating it and its config if needed.
    pub fn open() -> anyhow::Result<Self> {
        let base_path = config::base_path()?;
        let config = Config::load_with(&base_path)
            .with_context(|| format!("could not load config from {base_path}"))?;

        let storage = BackendLocal::new(&base_path)
            .with_context(|| format!("could not open data directory {base_path}"))?;
        let fetcher = RelayChain::from_config(&config)?;

        log::debug!(
            "opened {base_path} with {} relay(s): {}",
            fetcher.len(),
            config
                .relays
                .iter()
                .map(|relay| relay.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self::with_parts(
            config,
            LinkStore::new(Arc::new(storage)),
            Arc::new(Extractor::new(fetcher)),
        ))
    }

    pub fn with_parts(config: Config, store: LinkStore, extractor: Arc<Extractor>) -> Self {
        Self {
            config,
            store,
            extractor,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn extractor(&self) -> &Arc<Extractor> {
        &self.extractor
    }

    pub fn links(&self) -> Snapshot {
        self.store.load()
    }

    pub fn cards(&self) -> Vec<LinkCard> {
        let now = Utc::now();
        self.links()
            .iter()
            .map(|link| LinkCard::from_link(link, now))
            .collect()
    }

    pub fn add(&self, create: LinkCreate) -> Result<Link, StoreError> {
        let (_, link) = self.store.add(create)?;
        Ok(link)
    }

    pub fn delete(&self, id: &LinkId) -> Result<Snapshot, StoreError> {
        self.store.delete(id)
    }

    pub fn preview_session(&self) -> PreviewSession {
        self.preview_session_with(self.config.debounce())
    }

    pub fn preview_session_with(&self, debounce: Duration) -> PreviewSession {
        PreviewSession::new(self.extractor.clone(), debounce)
    }
}
