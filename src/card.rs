use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    links::{Link, LinkId},
    metadata::{
        classify::{domain, is_youtube_domain},
        defaults::default_thumbnail,
    },
};

/// One row of the saved links list, ready to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkCard {
    pub id: LinkId,
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub domain: String,
    pub is_youtube: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub age: String,
    pub added_at: DateTime<Utc>,
}

impl LinkCard {
    pub fn from_link(link: &Link, now: DateTime<Utc>) -> Self {
        LinkCard {
            id: link.id.clone(),
            title: link.title.clone(),
            url: link.url.clone(),
            description: link.description.clone(),
            domain: domain(&link.url).unwrap_or_else(|| link.url.clone()),
            is_youtube: is_youtube_domain(&link.url),
            thumbnail: link
                .thumbnail
                .clone()
                .or_else(|| default_thumbnail(&link.url)),
            age: relative_age(link.added_at, now),
            added_at: link.added_at,
        }
    }
}

pub fn relative_age(added_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(added_at);
    let hours = elapsed.num_hours();

    if hours < 1 {
        "just now".to_string()
    } else if hours < 24 {
        plural(hours, "hour")
    } else if elapsed.num_days() < 7 {
        plural(elapsed.num_days(), "day")
    } else {
        added_at.format("%b %-d, %Y").to_string()
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        "2026-03-10T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_relative_age() {
        let now = now();
        assert_eq!(relative_age(now, now), "just now");
        assert_eq!(relative_age(now - Duration::minutes(59), now), "just now");
        assert_eq!(relative_age(now - Duration::hours(1), now), "1 hour ago");
        assert_eq!(relative_age(now - Duration::hours(23), now), "23 hours ago");
        assert_eq!(relative_age(now - Duration::hours(24), now), "1 day ago");
        assert_eq!(relative_age(now - Duration::days(6), now), "6 days ago");
        assert_eq!(relative_age(now - Duration::days(7), now), "Mar 3, 2026");
        assert_eq!(relative_age(now - Duration::days(40), now), "Jan 29, 2026");
    }

    // clock skew puts addedAt slightly in the future
    #[test]
    fn test_future_timestamp_is_just_now() {
        let now = now();
        assert_eq!(relative_age(now + Duration::minutes(5), now), "just now");
    }

    #[test]
    fn test_card_fields() {
        let link = Link {
            id: "a".into(),
            title: "Rust".into(),
            url: "https://www.github.com/rust-lang/rust".into(),
            description: Some("compiler".into()),
            thumbnail: None,
            added_at: now() - Duration::hours(3),
        };
        let card = LinkCard::from_link(&link, now());

        assert_eq!(card.domain, "github.com");
        assert!(!card.is_youtube);
        assert_eq!(card.age, "3 hours ago");
        assert_eq!(card.thumbnail, default_thumbnail(&link.url));
        assert!(card.thumbnail.is_some());
    }

    #[test]
    fn test_card_youtube_and_own_thumbnail() {
        let link = Link {
            id: "b".into(),
            title: "video".into(),
            url: "https://youtu.be/dQw4w9WgXcQ".into(),
            description: None,
            thumbnail: Some("https://example.com/own.jpg".into()),
            added_at: now(),
        };
        let card = LinkCard::from_link(&link, now());

        assert!(card.is_youtube);
        assert_eq!(card.domain, "youtu.be");
        assert_eq!(card.thumbnail.as_deref(), Some("https://example.com/own.jpg"));
    }

    #[test]
    fn test_card_youtube_channel_has_badge() {
        let link = Link {
            id: "d".into(),
            title: "channel".into(),
            url: "https://www.youtube.com/channel/UC123".into(),
            description: None,
            thumbnail: None,
            added_at: now(),
        };
        let card = LinkCard::from_link(&link, now());

        assert!(card.is_youtube);
        assert_eq!(card.domain, "youtube.com");
    }

    #[test]
    fn test_card_unparseable_url_domain() {
        let link = Link {
            id: "c".into(),
            title: "broken".into(),
            url: "not a url".into(),
            description: None,
            thumbnail: None,
            added_at: now(),
        };
        let card = LinkCard::from_link(&link, now());
        assert_eq!(card.domain, "not a url");
        assert_eq!(card.thumbnail, None);
    }
}
