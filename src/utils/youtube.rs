// src/utils/youtube.rs

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::AppError;

/// Length of every YouTube video id.
pub const VIDEO_ID_LEN: usize = 11;

static YOUTUBE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(https?://)?(www\.)?(youtube\.com/watch\?v=|youtu\.be/)([A-Za-z0-9_-]{11})(\S*)?$",
    )
    .expect("YouTube link pattern is valid")
});

const INVALID_LINK: &str = "Please provide a valid YouTube link.";
const INVALID_ID: &str =
    "Please provide a valid YouTube link. Make sure your link contains a valid video ID.";

/// Validates a YouTube link and extracts its 11-character video id.
///
/// Accepts `youtube.com/watch?v=<id>` and `youtu.be/<id>`, with or without
/// scheme and `www.`. The id is read from the `v` query parameter or the
/// short-link path, so trailing characters glued onto the id are rejected.
pub fn validate_youtube_link(link: &str) -> Result<String, AppError> {
    let link = link.trim();
    if link.is_empty() {
        return Err(AppError::BadRequest("Please provide a YouTube URL".to_string()));
    }

    let captures = YOUTUBE_LINK.captures(link).ok_or_else(|| {
        tracing::debug!("Rejected YouTube link: {}", link);
        AppError::BadRequest(INVALID_LINK.to_string())
    })?;

    let video_id = match captures.get(3).map(|m| m.as_str()) {
        Some("youtu.be/") => short_link_id(link),
        _ => watch_link_id(link),
    };

    match video_id {
        Some(id) if id.chars().count() == VIDEO_ID_LEN => Ok(id),
        _ => Err(AppError::BadRequest(INVALID_ID.to_string())),
    }
}

/// Reads the `v` query parameter of a `youtube.com/watch` link.
fn watch_link_id(link: &str) -> Option<String> {
    let parsed = Url::parse(link)
        .or_else(|_| Url::parse(&format!("https://{}", link)))
        .ok()?;

    parsed
        .query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
}

/// Reads the path segment of a `youtu.be/<id>` link, up to any query string.
fn short_link_id(link: &str) -> Option<String> {
    let rest = link.split("youtu.be/").nth(1)?;
    let id = rest.split(['?', '#']).next()?;
    Some(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_canonical_watch_links() {
        for link in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "http://youtube.com/watch?v=dQw4w9WgXcQ",
            "www.youtube.com/watch?v=dQw4w9WgXcQ",
            "youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s",
        ] {
            assert_eq!(validate_youtube_link(link).unwrap(), "dQw4w9WgXcQ", "{}", link);
        }
    }

    #[test]
    fn accepts_short_links() {
        assert_eq!(
            validate_youtube_link("https://youtu.be/a-b_c1234XY").unwrap(),
            "a-b_c1234XY"
        );
        assert_eq!(
            validate_youtube_link("youtu.be/dQw4w9WgXcQ?si=tracking").unwrap(),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn rejects_other_hosts_and_shapes() {
        for link in [
            "https://vimeo.com/123456789",
            "https://www.youtube.com/channel/UC38IQsAvIsxxjztdMZQtwHA",
            "https://www.youtube.com/watch?x=dQw4w9WgXcQ",
            "not a link at all",
            "https://youtu.be/",
        ] {
            assert!(validate_youtube_link(link).is_err(), "{}", link);
        }
    }

    #[test]
    fn rejects_ids_that_are_not_eleven_characters() {
        assert!(validate_youtube_link("https://youtu.be/dQw4w9WgX").is_err());
        assert!(validate_youtube_link("https://youtu.be/dQw4w9WgXcQQ").is_err());
        assert!(validate_youtube_link("https://www.youtube.com/watch?v=dQw4w9WgXcQQ").is_err());
    }

    #[test]
    fn empty_input_asks_for_a_url() {
        match validate_youtube_link("   ") {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Please provide a YouTube URL"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
