use std::time::Duration;

use anyhow::{bail, Context};
use homedir::my_home;
use serde::{Deserialize, Serialize};

use crate::storage::{self, StorageManager};

const CONFIG_FILE: &str = "config.yaml";

/// Per relay attempt
const DEFAULT_RELAY_TIMEOUT_SECS: u64 = 8;
/// Quiet period after the last keystroke before extraction starts
const DEFAULT_DEBOUNCE_MS: u64 = 500;
const DEFAULT_LISTEN: &str = "127.0.0.1:8080";
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0";

/// A relay service that fetches pages on our behalf.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    pub name: String,
    /// Request template. `{url}` is replaced by the percent-encoded target,
    /// `{raw_url}` by the target verbatim.
    pub endpoint: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Tried in order until one returns the page.
    #[serde(default = "default_relays")]
    pub relays: Vec<RelayConfig>,

    #[serde(default = "default_relay_timeout_secs")]
    pub relay_timeout_secs: u64,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Address the daemon binds to
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            relays: default_relays(),
            relay_timeout_secs: DEFAULT_RELAY_TIMEOUT_SECS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            listen: DEFAULT_LISTEN.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            base_path: String::new(),
        }
    }
}

fn default_relays() -> Vec<RelayConfig> {
    [
        ("allorigins", "https://api.allorigins.win/get?url={url}"),
        ("corsproxy", "https://corsproxy.io/?{url}"),
        ("cors-anywhere", "https://cors-anywhere.herokuapp.com/{raw_url}"),
    ]
    .into_iter()
    .map(|(name, endpoint)| RelayConfig {
        name: name.to_string(),
        endpoint: endpoint.to_string(),
    })
    .collect()
}

fn default_relay_timeout_secs() -> u64 {
    DEFAULT_RELAY_TIMEOUT_SECS
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Data directory: `$LINKSHELF_BASE_PATH`, or `~/.local/share/linkshelf`.
pub fn base_path() -> anyhow::Result<String> {
    if let Ok(base_path) = std::env::var("LINKSHELF_BASE_PATH") {
        return Ok(base_path);
    }

    let home = my_home()
        .context("could not determine home directory")?
        .context("home directory path is empty")?;

    Ok(format!("{}/.local/share/linkshelf", home.to_string_lossy()))
}

impl Config {
    fn validate(&self) -> anyhow::Result<()> {
        if self.relays.is_empty() {
            bail!("at least one relay must be configured");
        }

        for (idx, relay) in self.relays.iter().enumerate() {
            let idx = idx + 1;
            if relay.name.trim().is_empty() {
                bail!("relay #{idx} has no name");
            }
            if !relay.endpoint.contains("{url}") && !relay.endpoint.contains("{raw_url}") {
                bail!(
                    "relay #{idx} ({}) endpoint must contain {{url}} or {{raw_url}}",
                    relay.name
                );
            }
        }

        if self.relay_timeout_secs == 0 {
            bail!("relay_timeout_secs must be greater than 0");
        }

        Ok(())
    }

    pub fn load_with(base_path: &str) -> anyhow::Result<Self> {
        let store = storage::BackendLocal::new(base_path)?;

        // create new if does not exist
        if !store.exists(CONFIG_FILE) {
            store.write(CONFIG_FILE, serde_yml::to_string(&Self::default())?.as_bytes())?;
        }

        let config_str =
            String::from_utf8(store.read(CONFIG_FILE)?).context("config file is not valid utf8")?;
        let mut config: Self = serde_yml::from_str(&config_str).context("config is malformed")?;

        config.base_path = base_path.to_string();

        config.validate()?;

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config)? {
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let store = storage::BackendLocal::new(&self.base_path)?;

        let config_str = serde_yml::to_string(&self)?;
        store.write(CONFIG_FILE, config_str.as_bytes())?;
        Ok(())
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn relay_timeout(&self) -> Duration {
        Duration::from_secs(self.relay_timeout_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Upper bound for a full extraction: every relay timing out in turn.
    pub fn settle_timeout(&self) -> Duration {
        let relays = u32::try_from(self.relays.len()).unwrap_or(u32::MAX);
        self.relay_timeout()
            .saturating_mul(relays)
            .saturating_add(self.debounce())
            .saturating_add(Duration::from_secs(2))
    }
}
