use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use crate::{
    app::App,
    config::Config,
    links::LinkStore,
    metadata::{Extractor, Relay, RelayChain, RelayError},
    storage,
};

/// Always answers with the same page.
pub struct StaticRelay {
    name: String,
    html: String,
}

impl StaticRelay {
    pub fn new(name: &str, html: &str) -> Self {
        Self {
            name: name.to_string(),
            html: html.to_string(),
        }
    }
}

impl Relay for StaticRelay {
    fn fetch(&self, _target: &str) -> Result<String, RelayError> {
        Ok(self.html.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

enum Failure {
    Network,
    NotJson,
    Status(u16),
}

/// Always fails the way a broken relay would.
pub struct FailingRelay {
    name: String,
    failure: Failure,
}

impl FailingRelay {
    pub fn network(name: &str) -> Self {
        Self {
            name: name.to_string(),
            failure: Failure::Network,
        }
    }

    pub fn not_json(name: &str) -> Self {
        Self {
            name: name.to_string(),
            failure: Failure::NotJson,
        }
    }

    pub fn status(name: &str, code: u16) -> Self {
        Self {
            name: name.to_string(),
            failure: Failure::Status(code),
        }
    }
}

impl Relay for FailingRelay {
    fn fetch(&self, _target: &str) -> Result<String, RelayError> {
        Err(match self.failure {
            Failure::Network => RelayError::Request("connection refused".to_string()),
            Failure::NotJson => RelayError::NotJson("expected value at line 1 column 1".to_string()),
            Failure::Status(code) => RelayError::Status(code),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

pub struct PanickingRelay;

impl Relay for PanickingRelay {
    fn fetch(&self, target: &str) -> Result<String, RelayError> {
        panic!("relay blew up on {target}");
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

/// Static page that counts how often it was asked for.
pub struct CountingRelay {
    inner: StaticRelay,
    calls: Arc<AtomicUsize>,
}

impl CountingRelay {
    pub fn new(name: &str, html: &str) -> Self {
        Self {
            inner: StaticRelay::new(name, html),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl Relay for CountingRelay {
    fn fetch(&self, target: &str) -> Result<String, RelayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(target)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Serves a different page per target, each after its own delay.
pub struct SlowRelay {
    name: String,
    pages: HashMap<String, (String, Duration)>,
}

impl SlowRelay {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            pages: HashMap::new(),
        }
    }

    pub fn page(mut self, target: &str, html: &str, delay: Duration) -> Self {
        self.pages
            .insert(target.to_string(), (html.to_string(), delay));
        self
    }
}

impl Relay for SlowRelay {
    fn fetch(&self, target: &str) -> Result<String, RelayError> {
        let (html, delay) = self
            .pages
            .get(target)
            .ok_or_else(|| RelayError::Status(404))?;
        std::thread::sleep(*delay);
        Ok(html.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

pub fn extractor_with(relays: Vec<Box<dyn Relay>>) -> Arc<Extractor> {
    Arc::new(Extractor::new(RelayChain::new(relays)))
}

/// App over a fresh temp directory whose relays never touch the network.
pub fn temp_app(relays: Vec<Box<dyn Relay>>) -> (App, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let base_path = tmp.path().to_str().unwrap().to_string();

    let config = Config::load_with(&base_path).expect("failed to load config");
    let storage = Arc::new(storage::BackendLocal::new(&base_path).expect("failed to create storage"));

    let app = App::with_parts(config, LinkStore::new(storage), extractor_with(relays));
    (app, tmp)
}
