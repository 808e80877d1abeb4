use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlKind {
    YouTube { video_id: String },
    Generic,
}

/// Prepend `https://` unless the input already carries an http(s) scheme.
///
/// Idempotent: normalizing an already normalized URL returns it unchanged.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if has_http_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

fn has_http_scheme(url: &str) -> bool {
    ["http://", "https://"].into_iter().any(|scheme| {
        url.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

/// Whether typed input is worth extracting metadata for yet.
pub fn looks_like_url(raw: &str) -> bool {
    let raw = raw.trim();
    raw.contains('.') || raw.starts_with("http")
}

pub fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Lowercased host without a leading `www.`, the per-domain identity of a URL.
pub fn domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    Some(strip_www(&host).to_string())
}

/// Any page on a YouTube host, video or not.
pub fn is_youtube_domain(url: &str) -> bool {
    matches!(
        domain(url).as_deref(),
        Some("youtube.com" | "m.youtube.com" | "youtu.be")
    )
}

pub fn classify(url: &str) -> UrlKind {
    match youtube_video_id(url) {
        Some(video_id) => UrlKind::YouTube { video_id },
        None => UrlKind::Generic,
    }
}

/// Video id of a YouTube watch or short link. Never fails, malformed input is
/// simply not a video.
pub fn youtube_video_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();

    let video_id = match strip_www(&host) {
        "youtube.com" | "m.youtube.com" if parsed.path() == "/watch" => parsed
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned()),
        "youtu.be" => parsed
            .path_segments()
            .and_then(|mut segments| segments.next())
            .map(str::to_string),
        _ => None,
    };

    video_id.filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_prepends_https() {
        assert_eq!(normalize_url("example.com/page"), "https://example.com/page");
        assert_eq!(normalize_url("  example.com  "), "https://example.com");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in ["example.com", "http://example.com", "HTTPS://Example.com/a"] {
            let once = normalize_url(input);
            assert_eq!(normalize_url(&once), once);
        }
        assert_eq!(normalize_url("http://example.com"), "http://example.com");
        assert_eq!(normalize_url("HTTPS://Example.com/a"), "HTTPS://Example.com/a");
    }

    #[test]
    fn test_normalize_non_ascii_input() {
        assert_eq!(normalize_url("día.example"), "https://día.example");
    }

    #[test]
    fn test_youtube_watch() {
        assert_eq!(
            youtube_video_id("https://www.youtube.com/watch?v=abc123").as_deref(),
            Some("abc123")
        );
        assert_eq!(
            youtube_video_id("https://m.youtube.com/watch?feature=share&v=xyz").as_deref(),
            Some("xyz")
        );
        assert_eq!(
            youtube_video_id("https://WWW.YouTube.com/watch?v=Mixed").as_deref(),
            Some("Mixed")
        );
    }

    #[test]
    fn test_youtube_short_link() {
        assert_eq!(
            youtube_video_id("https://youtu.be/abc123").as_deref(),
            Some("abc123")
        );
        assert_eq!(
            youtube_video_id("https://youtu.be/abc123/extra?t=10").as_deref(),
            Some("abc123")
        );
        assert_eq!(youtube_video_id("https://youtu.be/"), None);
    }

    #[test]
    fn test_not_youtube() {
        assert_eq!(youtube_video_id("https://example.com/watch?v=abc"), None);
        assert_eq!(youtube_video_id("https://www.youtube.com/channel/abc"), None);
        assert_eq!(youtube_video_id("https://www.youtube.com/watch"), None);
        assert_eq!(youtube_video_id("not a url"), None);
        assert_eq!(classify("not a url"), UrlKind::Generic);
    }

    #[test]
    fn test_classify_kind() {
        assert_eq!(
            classify("https://youtu.be/abc123"),
            UrlKind::YouTube {
                video_id: "abc123".to_string()
            }
        );
        assert_eq!(classify("https://github.com/foo"), UrlKind::Generic);
        // a channel page is on youtube but is not a video
        assert_eq!(classify("https://www.youtube.com/channel/UC123"), UrlKind::Generic);
    }

    #[test]
    fn test_domain_identity() {
        assert_eq!(domain("https://WWW.Example.com/a").as_deref(), Some("example.com"));
        assert_eq!(domain("https://blog.example.com").as_deref(), Some("blog.example.com"));
        assert_eq!(domain("garbage"), None);
    }

    #[test]
    fn test_youtube_domain() {
        assert!(is_youtube_domain("https://www.youtube.com/channel/UC123"));
        assert!(is_youtube_domain("https://m.youtube.com/@someone"));
        assert!(is_youtube_domain("https://youtu.be/dQw4w9WgXcQ"));
        assert!(!is_youtube_domain("https://notyoutube.com/watch?v=abc"));
        assert!(!is_youtube_domain("youtube.com"));
    }

    #[test]
    fn test_looks_like_url() {
        assert!(looks_like_url("example.com"));
        assert!(looks_like_url("http"));
        assert!(!looks_like_url("exam"));
        assert!(!looks_like_url("   "));
    }
}
