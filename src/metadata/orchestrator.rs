use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread::JoinHandle,
};

use anyhow::Context;
use url::Url;

use super::{
    classify::{classify, normalize_url, UrlKind},
    defaults::{default_thumbnail, default_title, youtube_thumbnail, ThumbnailQuality},
    html::parse_page_meta,
    relay::RelayChain,
    types::{ExtractionResult, Phase, RESTRICTED_ACCESS, YOUTUBE_TITLE},
};

/// Two-phase metadata extraction: an instant guess from the URL, then a
/// network-backed pass through the relay chain.
pub struct Extractor {
    fetcher: RelayChain,
}

/// Quick result plus the full phase still running in the background.
pub struct PendingExtraction {
    pub url: String,
    pub quick: ExtractionResult,
    handle: JoinHandle<ExtractionResult>,
}

impl PendingExtraction {
    pub fn wait(self) -> ExtractionResult {
        self.handle
            .join()
            .unwrap_or_else(|_| ExtractionResult::unavailable())
    }
}

fn transition(url: &str, from: Phase, to: Phase) {
    log::debug!("{url}: {from:?} -> {to:?}");
}

impl Extractor {
    pub fn new(fetcher: RelayChain) -> Self {
        Self { fetcher }
    }

    /// Return the quick result right away and run the full phase on its own
    /// thread.
    pub fn extract(self: &Arc<Self>, url: &str) -> PendingExtraction {
        let url = normalize_url(url);
        let quick = self.quick(&url);

        let handle = std::thread::spawn({
            let extractor = self.clone();
            let url = url.clone();
            move || extractor.full(&url)
        });

        PendingExtraction { url, quick, handle }
    }

    /// No I/O, always succeeds.
    pub fn quick(&self, url: &str) -> ExtractionResult {
        let url = normalize_url(url);

        let result = match classify(&url) {
            UrlKind::YouTube { video_id } => ExtractionResult {
                title: Some(YOUTUBE_TITLE.to_string()),
                thumbnail: Some(youtube_thumbnail(&video_id, ThumbnailQuality::High)),
                ..Default::default()
            },
            UrlKind::Generic => ExtractionResult {
                title: Some(default_title(&url)),
                thumbnail: default_thumbnail(&url),
                ..Default::default()
            },
        };

        transition(&url, Phase::Idle, Phase::QuickReturned);
        result
    }

    /// Network-backed extraction. Never fails: relay exhaustion degrades to
    /// the heuristic defaults, anything else to an "unavailable" result.
    pub fn full(&self, url: &str) -> ExtractionResult {
        let url = normalize_url(url);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_full(&url)));
        let result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                log::error!("{url}: metadata extraction failed: {err:#}");
                ExtractionResult::unavailable()
            }
            Err(_) => {
                log::error!("{url}: metadata extraction panicked");
                ExtractionResult::unavailable()
            }
        };

        transition(&url, Phase::QuickReturned, Phase::Settled);
        result
    }

    fn run_full(&self, url: &str) -> anyhow::Result<ExtractionResult> {
        let page_url = Url::parse(url).with_context(|| format!("invalid url {url:?}"))?;

        if let UrlKind::YouTube { video_id } = classify(url) {
            log::debug!("{url}: youtube video {video_id}, nothing to fetch");
            return Ok(self.quick(url));
        }

        transition(url, Phase::QuickReturned, Phase::Fetching);

        let html = match self.fetcher.fetch_page(url) {
            Ok(html) => html,
            Err(err) => {
                log::warn!("{url}: {err}, using defaults");
                transition(url, Phase::Fetching, Phase::FetchFailed);
                return Ok(ExtractionResult {
                    title: Some(default_title(url)),
                    thumbnail: default_thumbnail(url),
                    error: Some(RESTRICTED_ACCESS.to_string()),
                    ..Default::default()
                });
            }
        };

        let page = parse_page_meta(&html);
        if page.is_empty() {
            log::debug!("{url}: no preview tags found");
        }
        transition(url, Phase::Fetching, Phase::Parsed);

        Ok(ExtractionResult {
            title: page.title.or_else(|| Some(default_title(url))),
            description: page.description,
            thumbnail: page
                .image
                .map(|image| resolve_image(&page_url, image))
                .or_else(|| default_thumbnail(url)),
            error: None,
        })
    }
}

// relative og:image values are resolved against the page they came from
fn resolve_image(page_url: &Url, image: String) -> String {
    if Url::parse(&image).is_ok() {
        return image;
    }
    page_url
        .join(&image)
        .map(|resolved| resolved.to_string())
        .unwrap_or(image)
}
