//! 此模块实现了基于 Spotify Web API 的 `SearchProvider`。
//! API 文档见 <https://developer.spotify.com/documentation/web-api/reference/search>

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::RETRY_AFTER};
use tracing::{debug, instrument, warn};

use crate::{
    error::{MatchingError, Result},
    model::track::Candidate,
    providers::SearchProvider,
};

pub mod models;

const API_BASE_URL_SPOTIFY: &str = "https://api.spotify.com/v1";

/// Spotify 搜索客户端。
///
/// 只负责曲目搜索，访问令牌由调用方通过 OAuth 流程获取后传入。
/// 客户端本身不设请求超时，超时由 `MatchingOptions::timeout_ms` 统一控制。
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    access_token: String,
    api_base: String,
    http_client: Client,
}

impl SpotifyClient {
    /// 使用访问令牌创建一个新的 `SpotifyClient`。
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        Self::with_api_base(access_token, API_BASE_URL_SPOTIFY)
    }

    /// 使用自定义的 API 地址创建客户端，主要用于代理或测试。
    pub fn with_api_base(
        access_token: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Result<Self> {
        let api_base: String = api_base.into();
        let http_client = Client::builder().build()?;
        Ok(Self {
            access_token: access_token.into(),
            api_base: api_base.trim_end_matches('/').to_string(),
            http_client,
        })
    }
}

#[async_trait]
impl SearchProvider for SpotifyClient {
    fn name(&self) -> &'static str {
        "spotify"
    }

    fn has_credentials(&self) -> bool {
        !self.access_token.trim().is_empty()
    }

    #[instrument(skip(self))]
    async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<Candidate>> {
        let url = format!("{}/search", self.api_base);
        let limit_str = limit.to_string();

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("q", query), ("type", "track"), ("limit", limit_str.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.text().await.unwrap_or_default();
            let err = error_for_status(status, retry_after.as_deref(), &body);
            warn!("Spotify 搜索失败 (查询: {query}): {err}");
            return Err(err);
        }

        let data: models::SearchResponse = response.json().await?;
        debug!(
            "Spotify 返回 {} 条结果 (共 {} 条)。",
            data.tracks.items.len(),
            data.tracks.total
        );
        Ok(data.tracks.items.into_iter().map(Candidate::from).collect())
    }
}

/// 将非成功的 HTTP 响应转换为对应的错误。
///
/// 429 转换为 `RateLimited`，其余转换为带状态码的 `ApiError`。
fn error_for_status(status: StatusCode, retry_after: Option<&str>, body: &str) -> MatchingError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        let msg = match retry_after {
            Some(secs) => format!("Spotify API 请求过于频繁，请在 {secs} 秒后重试"),
            None => "Spotify API 请求过于频繁".to_string(),
        };
        return MatchingError::RateLimited(msg);
    }

    let message = serde_json::from_str::<models::ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("未知错误")
                .to_string()
        });

    MatchingError::ApiError {
        status: status.as_u16(),
        message,
    }
}
