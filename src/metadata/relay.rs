use std::{
    error::Error,
    io::Read,
    time::Instant,
};

use reqwest::header::ACCEPT;
use serde_json::Value;

use crate::config::{Config, RelayConfig};

use super::types::{FetchError, RelayError};

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Relays wrap whole pages in JSON, anything past this is not worth parsing.
const MAX_RELAY_BYTES: u64 = 5 * 1024 * 1024;

/// Response fields a relay may put the proxied page under, in lookup order.
const CONTENT_FIELDS: [&str; 2] = ["contents", "body"];

/// A service that fetches a page on our behalf and hands back its HTML.
pub trait Relay: Send + Sync {
    fn fetch(&self, target: &str) -> Result<String, RelayError>;

    /// Name used in logs.
    fn name(&self) -> &str;
}

/// Relay reached over HTTP GET. `endpoint` is a template where `{url}` is
/// replaced by the percent-encoded target and `{raw_url}` by the target as is.
pub struct HttpRelay {
    name: String,
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpRelay {
    pub fn new(relay: &RelayConfig, client: reqwest::blocking::Client) -> Self {
        Self {
            name: relay.name.clone(),
            endpoint: relay.endpoint.clone(),
            client,
        }
    }

    pub fn request_url(&self, target: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
        self.endpoint
            .replace("{url}", &encoded)
            .replace("{raw_url}", target)
    }
}

fn get_error(error: &reqwest::Error) -> String {
    match error.source() {
        Some(e) => match e.source() {
            Some(e) => e.to_string(),
            None => e.to_string(),
        },
        None => error.to_string(),
    }
}

impl Relay for HttpRelay {
    fn fetch(&self, target: &str) -> Result<String, RelayError> {
        let request_url = self.request_url(target);
        log::debug!("{}: requesting {request_url}", self.name);

        let resp = self
            .client
            .get(&request_url)
            .header(ACCEPT, ACCEPT_HTML)
            .send()
            .map_err(|err| RelayError::Request(get_error(&err)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RelayError::Status(status.as_u16()));
        }

        if resp.content_length().is_some_and(|len| len > MAX_RELAY_BYTES) {
            return Err(RelayError::TooLarge(MAX_RELAY_BYTES));
        }
        let body = read_capped(resp, MAX_RELAY_BYTES)?;

        extract_contents(&body)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// reads at most `limit + 1` bytes whatever the content-length says
fn read_capped(reader: impl Read, limit: u64) -> Result<String, RelayError> {
    let mut body = Vec::new();
    reader
        .take(limit + 1)
        .read_to_end(&mut body)
        .map_err(|err| RelayError::Request(err.to_string()))?;

    if body.len() as u64 > limit {
        return Err(RelayError::TooLarge(limit));
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Pull the proxied HTML out of a relay's JSON envelope.
pub fn extract_contents(body: &str) -> Result<String, RelayError> {
    let value: Value =
        serde_json::from_str(body).map_err(|err| RelayError::NotJson(err.to_string()))?;

    CONTENT_FIELDS
        .iter()
        .find_map(|field| {
            value
                .get(field)
                .and_then(Value::as_str)
                .filter(|contents| !contents.trim().is_empty())
        })
        .map(str::to_owned)
        .ok_or(RelayError::MissingContent)
}

/// Ordered relays, tried one at a time until one of them returns a page.
pub struct RelayChain {
    relays: Vec<Box<dyn Relay>>,
}

impl RelayChain {
    pub fn new(relays: Vec<Box<dyn Relay>>) -> Self {
        Self { relays }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.relay_timeout())
            .build()?;

        let relays = config
            .relays
            .iter()
            .map(|relay| Box::new(HttpRelay::new(relay, client.clone())) as Box<dyn Relay>)
            .collect();

        Ok(Self::new(relays))
    }

    pub fn len(&self) -> usize {
        self.relays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relays.is_empty()
    }

    /// Relay errors are logged and skipped, only exhaustion reaches the caller.
    pub fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let attempts = self.relays.len();
        if self.is_empty() {
            log::warn!("no relays configured, {url} cannot be fetched");
        }

        for (idx, relay) in self.relays.iter().enumerate() {
            let name = relay.name();
            let started = Instant::now();

            match relay.fetch(url) {
                Ok(html) => {
                    log::info!(
                        "relay={name} outcome=success bytes={} took={}ms",
                        html.len(),
                        started.elapsed().as_millis()
                    );
                    return Ok(html);
                }
                Err(err) => {
                    log::warn!(
                        "relay={name} outcome=error attempt={}/{attempts} err={err}",
                        idx + 1
                    );
                }
            }
        }

        Err(FetchError::Exhausted { attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::support::{FailingRelay, StaticRelay};
    use std::time::Duration;

    #[test]
    fn test_extract_contents_prefers_contents() {
        let body = r#"{"contents": "<html>a</html>", "body": "<html>b</html>"}"#;
        assert_eq!(extract_contents(body).unwrap(), "<html>a</html>");
    }

    #[test]
    fn test_extract_contents_falls_back_to_body() {
        let body = r#"{"status": {"http_code": 200}, "body": "<html>b</html>"}"#;
        assert_eq!(extract_contents(body).unwrap(), "<html>b</html>");

        let body = r#"{"contents": "", "body": "<html>b</html>"}"#;
        assert_eq!(extract_contents(body).unwrap(), "<html>b</html>");
    }

    #[test]
    fn test_read_capped() {
        let body = br#"{"contents": "<html></html>"}"#;
        assert_eq!(
            read_capped(&body[..], body.len() as u64).unwrap(),
            r#"{"contents": "<html></html>"}"#
        );
        assert!(matches!(
            read_capped(std::io::Cursor::new(vec![b'x'; 65]), 64),
            Err(RelayError::TooLarge(64))
        ));
    }

    #[test]
    fn test_extract_contents_failures() {
        assert!(matches!(
            extract_contents("<html>not json</html>"),
            Err(RelayError::NotJson(_))
        ));
        assert!(matches!(
            extract_contents(r#"{"status": "ok"}"#),
            Err(RelayError::MissingContent)
        ));
        assert!(matches!(
            extract_contents(r#"{"contents": 42}"#),
            Err(RelayError::MissingContent)
        ));
    }

    #[test]
    fn test_request_url_template() {
        let client = reqwest::blocking::Client::new();
        let encoded = HttpRelay::new(
            &RelayConfig {
                name: "encoded".into(),
                endpoint: "https://relay.example/get?url={url}".into(),
            },
            client.clone(),
        );
        assert_eq!(
            encoded.request_url("https://example.com/a?b=c"),
            "https://relay.example/get?url=https%3A%2F%2Fexample.com%2Fa%3Fb%3Dc"
        );

        let raw = HttpRelay::new(
            &RelayConfig {
                name: "raw".into(),
                endpoint: "https://relay.example/{raw_url}".into(),
            },
            client,
        );
        assert_eq!(
            raw.request_url("https://example.com/a"),
            "https://relay.example/https://example.com/a"
        );
    }

    #[test]
    fn test_chain_advances_until_success() {
        let chain = RelayChain::new(vec![
            Box::new(FailingRelay::network("first")),
            Box::new(FailingRelay::not_json("second")),
            Box::new(StaticRelay::new("third", "<title>ok</title>")),
            Box::new(StaticRelay::new("fourth", "<title>never</title>")),
        ]);

        assert_eq!(chain.fetch_page("https://example.com").unwrap(), "<title>ok</title>");
    }

    #[test]
    fn test_chain_exhausted() {
        let chain = RelayChain::new(vec![
            Box::new(FailingRelay::network("a")),
            Box::new(FailingRelay::status("b", 503)),
            Box::new(FailingRelay::not_json("c")),
        ]);

        match chain.fetch_page("https://example.com") {
            Err(FetchError::Exhausted { attempts }) => assert_eq!(attempts, 3),
            Ok(_) => panic!("expected exhaustion"),
        }
    }

    #[test]
    fn test_empty_chain_is_exhausted() {
        let chain = RelayChain::new(vec![]);
        assert!(chain.is_empty());
        assert!(chain.fetch_page("https://example.com").is_err());
    }

    #[test]
    fn test_unreachable_http_relays_are_exhausted() {
        // nothing listens on the discard port locally, connections are refused
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        let relays = ["one", "two", "three"]
            .into_iter()
            .map(|name| {
                Box::new(HttpRelay::new(
                    &RelayConfig {
                        name: name.into(),
                        endpoint: "http://127.0.0.1:9/get?url={url}".into(),
                    },
                    client.clone(),
                )) as Box<dyn Relay>
            })
            .collect();
        let chain = RelayChain::new(relays);

        assert_eq!(chain.len(), 3);
        assert!(matches!(
            chain.fetch_page("https://example.com"),
            Err(FetchError::Exhausted { attempts: 3 })
        ));
    }
}
