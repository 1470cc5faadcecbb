//! HTTP fetch gateway for the feed server's REST API.

use crate::config::FeedConfig;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use mediafeed_core::{
    Cursor, FeedError, FeedResult, FetchGateway, HasMorePolicy, Item, Page, Section,
    SectionCatalog, SummaryStats, Timestamp,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Serialize)]
struct VideosQuery<'a> {
    section: &'a str,
    offset: u64,
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    videos: Vec<VideoRecord>,
    #[serde(default)]
    total: u64,
    has_more: bool,
}

/// A video as stored by the server; optional text columns may be null.
#[derive(Debug, Deserialize)]
struct VideoRecord {
    id: String,
    title: String,
    description: Option<String>,
    thumbnail_url: Option<String>,
    channel_id: String,
    channel_title: String,
    section: Section,
    published_at: DateTime<Utc>,
}

impl From<VideoRecord> for Item {
    fn from(record: VideoRecord) -> Self {
        Item {
            id: record.id,
            title: record.title,
            description: record.description.unwrap_or_default(),
            thumbnail_url: record.thumbnail_url.unwrap_or_default(),
            channel_id: record.channel_id,
            channel_title: record.channel_title,
            section: record.section,
            published_at: record.published_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SectionsResponse {
    sections: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    video_count: u64,
    channel_count: u64,
    oldest_video: Option<String>,
    newest_video: Option<String>,
    last_update: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

// ============================================================================
// GATEWAY
// ============================================================================

#[derive(Clone)]
pub struct RestGateway {
    client: reqwest::Client,
    base_url: String,
    policy: HasMorePolicy,
}

impl RestGateway {
    pub fn new(config: &FeedConfig) -> FeedResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| FeedError::transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, &config.api_base_url, config.has_more_policy))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str, policy: HasMorePolicy) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            policy,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T, Q>(&self, path: &str, query: Option<&Q>) -> FeedResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(&url);
        if let Some(query) = query {
            request = request.query(query);
        }
        let response = request.send().await.map_err(transport_error)?;
        parse_response(response).await
    }
}

#[async_trait]
impl FetchGateway for RestGateway {
    async fn fetch_page(
        &self,
        section: &Section,
        cursor: Option<&Cursor>,
        page_size: usize,
    ) -> FeedResult<Page> {
        let offset = match cursor {
            None => 0,
            Some(Cursor::Offset(offset)) => *offset,
            Some(Cursor::Token(token)) => {
                return Err(FeedError::Decode {
                    reason: format!("offset-paged server cannot resume from token {}", token),
                })
            }
        };
        let query = VideosQuery {
            section: section.as_str(),
            offset,
            limit: page_size,
        };
        let response: VideosResponse = self.get_json("/api/videos", Some(&query)).await?;
        Ok(into_page(response, offset, page_size, self.policy))
    }

    async fn fetch_section_catalog(&self) -> FeedResult<Option<SectionCatalog>> {
        let response: SectionsResponse = self.get_json::<_, ()>("/api/sections", None).await?;
        Ok(Some(SectionCatalog {
            sections: response.sections.into_iter().map(Section::new).collect(),
        }))
    }

    async fn fetch_summary_stats(&self) -> FeedResult<Option<SummaryStats>> {
        let response: StatsResponse = self.get_json::<_, ()>("/api/stats", None).await?;
        Ok(Some(SummaryStats {
            item_count: response.video_count,
            source_count: response.channel_count,
            oldest: parse_stat_date(response.oldest_video.as_deref()),
            newest: parse_stat_date(response.newest_video.as_deref()),
            last_update: parse_stat_date(response.last_update.as_deref()),
        }))
    }

    fn has_more_policy(&self) -> HasMorePolicy {
        self.policy
    }
}

fn into_page(
    response: VideosResponse,
    offset: u64,
    page_size: usize,
    policy: HasMorePolicy,
) -> Page {
    let items: Vec<Item> = response.videos.into_iter().map(Item::from).collect();
    let next_cursor = policy
        .continues(response.has_more, items.len(), page_size)
        .then(|| Cursor::Offset(offset + items.len() as u64));
    tracing::trace!(
        offset,
        items = items.len(),
        total = response.total,
        has_more = response.has_more,
        "Decoded video page"
    );
    Page::new(items, next_cursor, response.has_more)
}

fn transport_error(err: reqwest::Error) -> FeedError {
    if err.is_timeout() {
        FeedError::transport(format!("request timed out: {}", err))
    } else {
        FeedError::transport(err.to_string())
    }
}

async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> FeedResult<T> {
    let status = response.status();
    let body = response.bytes().await.map_err(transport_error)?;
    if status.is_success() {
        Ok(serde_json::from_slice::<T>(&body)?)
    } else {
        Err(FeedError::server(
            status.as_u16(),
            error_message(&String::from_utf8_lossy(&body)),
        ))
    }
}

/// Pull the `detail` out of a JSON error body, or fall back to the raw text.
fn error_message(text: &str) -> String {
    match serde_json::from_str::<ErrorBody>(text) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => text.trim().to_string(),
    }
}

/// Stats dates are free-form: RFC 3339, SQLite timestamps, or placeholders
/// such as `"N/A"` and `"Never"`.
fn parse_stat_date(value: Option<&str>) -> Option<Timestamp> {
    let value = value?.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}
