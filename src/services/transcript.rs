// src/services/transcript.rs

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::{config::Config, error::AppError};

/// Metadata of a video. Both fields are best-effort.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoDetails {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "channelTitle")]
    pub channel_title: Option<String>,
}

/// Source of subtitles and metadata for YouTube videos.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch_transcript(&self, video_id: &str) -> Result<String, AppError>;

    async fn fetch_details(&self, video_id: &str) -> Result<VideoDetails, AppError>;
}

/// Client for the `yt-api` RapidAPI service.
#[derive(Clone, Debug)]
pub struct RapidApiClient {
    api_key: String,
    host: String,
    base_url: String,
    http: reqwest::Client,
}

impl RapidApiClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        Ok(Self {
            api_key: config.rapid_api_key.clone(),
            host: config.rapid_api_host.clone(),
            base_url: config.rapid_api_base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn get_json(&self, path: &str, video_id: &str) -> Result<Value, AppError> {
        let resp = self
            .http
            .get(format!("{}/{}", self.base_url, path))
            .query(&[("id", video_id)])
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", &self.host)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!("Subtitle service returned {} for {}: {}", status, path, body);
            return Err(AppError::Upstream(format!(
                "Subtitle service returned {}",
                status.as_u16()
            )));
        }

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl TranscriptSource for RapidApiClient {
    #[instrument(skip(self))]
    async fn fetch_transcript(&self, video_id: &str) -> Result<String, AppError> {
        let payload = self.get_json("subtitles", video_id).await?;
        let transcript = flatten_transcript(&payload);

        if transcript.is_empty() {
            return Err(AppError::Upstream(
                "No subtitles available for this video".to_string(),
            ));
        }

        tracing::debug!("Fetched transcript of {} chars", transcript.len());
        Ok(transcript)
    }

    #[instrument(skip(self))]
    async fn fetch_details(&self, video_id: &str) -> Result<VideoDetails, AppError> {
        let payload = self.get_json("video/info", video_id).await?;
        serde_json::from_value(payload)
            .map_err(|e| AppError::Upstream(format!("Unexpected video info payload: {}", e)))
    }
}

/// Members that may hold the cue list in a subtitle payload.
const CUE_CONTAINERS: [&str; 4] = ["subtitles", "transcript", "segments", "captions"];

/// Reduces a subtitle payload to plain text.
///
/// Strings are kept as-is, arrays are joined with spaces, and objects
/// contribute their `text` member or the first cue container found.
pub fn flatten_transcript(payload: &Value) -> String {
    let mut parts = Vec::new();
    collect_text(payload, &mut parts);
    parts.join(" ")
}

fn collect_text(value: &Value, parts: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if !s.is_empty() {
                parts.push(s.to_string());
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_text(item, parts);
            }
        }
        Value::Object(map) => {
            if let Some(text) = map.get("text") {
                collect_text(text, parts);
            } else if let Some(inner) = CUE_CONTAINERS.iter().find_map(|k| map.get(*k)) {
                collect_text(inner, parts);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_string_payload() {
        assert_eq!(flatten_transcript(&json!("  hello world ")), "hello world");
    }

    #[test]
    fn cue_list_is_joined() {
        let payload = json!({
            "subtitles": [
                { "start": 0.0, "dur": 1.2, "text": "Welcome back" },
                { "start": 1.2, "dur": 2.0, "text": "to the show" },
                { "start": 3.2, "dur": 0.5, "text": "" }
            ]
        });
        assert_eq!(flatten_transcript(&payload), "Welcome back to the show");
    }

    #[test]
    fn nested_containers_and_noise() {
        let payload = json!({
            "lang": "en",
            "transcript": { "segments": [ { "text": "one" }, 42, null, { "text": "two" } ] }
        });
        assert_eq!(flatten_transcript(&payload), "one two");
    }

    #[test]
    fn empty_payload_yields_nothing() {
        assert!(flatten_transcript(&json!({ "subtitles": [] })).is_empty());
        assert!(flatten_transcript(&json!(null)).is_empty());
    }

    #[test]
    fn video_details_tolerate_missing_fields() {
        let details: VideoDetails =
            serde_json::from_value(json!({ "id": "dQw4w9WgXcQ", "title": "Intro to Rust" }))
                .unwrap();
        assert_eq!(details.title.as_deref(), Some("Intro to Rust"));
        assert!(details.channel_title.is_none());
    }
}
