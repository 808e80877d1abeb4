//! Offline guesses for a link's title and thumbnail, derived from the URL
//! alone. Used as the quick preview and as the fallback for every failure
//! further down the extraction pipeline.

use serde::{Deserialize, Serialize};
use url::Url;

use super::classify::{classify, domain, strip_www, UrlKind};
use super::types::UNTITLED;

const YOUTUBE_THUMBNAIL_BASE: &str = "https://img.youtube.com/vi";

const BLOG_PLACEHOLDER: &str =
    "https://images.unsplash.com/photo-1455390582262-044cdead277a?w=400&h=200&fit=crop";
const NEWS_PLACEHOLDER: &str =
    "https://images.unsplash.com/photo-1504711434969-e33886168f5c?w=400&h=200&fit=crop";
const COMMERCE_PLACEHOLDER: &str =
    "https://images.unsplash.com/photo-1556742049-0cfed4f6a45d?w=400&h=200&fit=crop";

/// Well-known domains and their placeholder image. Order matters for the
/// substring pass.
const DOMAIN_THUMBNAILS: &[(&str, &str)] = &[
    (
        "github.com",
        "https://images.unsplash.com/photo-1618401471353-b98afee0b2eb?w=400&h=200&fit=crop",
    ),
    ("medium.com", BLOG_PLACEHOLDER),
    (
        "dev.to",
        "https://images.unsplash.com/photo-1555066931-4365d14bab8c?w=400&h=200&fit=crop",
    ),
    (
        "stackoverflow.com",
        "https://images.unsplash.com/photo-1516321318423-f06f85e504b3?w=400&h=200&fit=crop",
    ),
    (
        "reddit.com",
        "https://images.unsplash.com/photo-1611262588024-d12430b98920?w=400&h=200&fit=crop",
    ),
    (
        "twitter.com",
        "https://images.unsplash.com/photo-1611605698335-8b1569810432?w=400&h=200&fit=crop",
    ),
    (
        "x.com",
        "https://images.unsplash.com/photo-1611605698335-8b1569810432?w=400&h=200&fit=crop",
    ),
    (
        "linkedin.com",
        "https://images.unsplash.com/photo-1586953208448-b95a79798f07?w=400&h=200&fit=crop",
    ),
    (
        "instagram.com",
        "https://images.unsplash.com/photo-1611262588024-d12430b98920?w=400&h=200&fit=crop",
    ),
    (
        "tiktok.com",
        "https://images.unsplash.com/photo-1611605698335-8b1569810432?w=400&h=200&fit=crop",
    ),
];

const CATEGORY_THUMBNAILS: &[(&[&str], &str)] = &[
    (&["blog", "medium", "substack"], BLOG_PLACEHOLDER),
    (&["news", "times", "post"], NEWS_PLACEHOLDER),
    (&["shop", "store", "market"], COMMERCE_PLACEHOLDER),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailQuality {
    Max,
    #[default]
    High,
    Medium,
}

impl ThumbnailQuality {
    fn file_name(self) -> &'static str {
        match self {
            ThumbnailQuality::Max => "maxresdefault",
            ThumbnailQuality::High => "hqdefault",
            ThumbnailQuality::Medium => "mqdefault",
        }
    }
}

pub fn youtube_thumbnail(video_id: &str, quality: ThumbnailQuality) -> String {
    format!("{YOUTUBE_THUMBNAIL_BASE}/{video_id}/{}.jpg", quality.file_name())
}

/// `"<host> - <last path segment>"`, or the capitalized host for bare domains.
pub fn default_title(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return UNTITLED.to_string();
    };
    let Some(host) = parsed.host_str() else {
        return UNTITLED.to_string();
    };
    let host = strip_www(host);

    let last_segment = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last());

    if let Some(segment) = last_segment {
        return format!("{host} - {}", segment.replace(['-', '_'], " "));
    }

    let mut chars = host.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => UNTITLED.to_string(),
    }
}

/// YouTube thumbnail for videos, otherwise the domain placeholder.
pub fn default_thumbnail(url: &str) -> Option<String> {
    match classify(url) {
        UrlKind::YouTube { video_id } => {
            Some(youtube_thumbnail(&video_id, ThumbnailQuality::default()))
        }
        UrlKind::Generic => domain_thumbnail(url),
    }
}

/// Placeholder image for a domain: exact table match, then substring match,
/// then category keywords.
pub fn domain_thumbnail(url: &str) -> Option<String> {
    let domain = domain(url)?;

    let matched = DOMAIN_THUMBNAILS
        .iter()
        .find(|(key, _)| *key == domain)
        .or_else(|| DOMAIN_THUMBNAILS.iter().find(|(key, _)| domain.contains(key)));
    if let Some((_, thumbnail)) = matched {
        return Some(thumbnail.to_string());
    }

    CATEGORY_THUMBNAILS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| domain.contains(k)))
        .map(|(_, thumbnail)| thumbnail.to_string())
}
