#![warn(missing_docs)]

//! # CommonStream Matcher
//!
//! 将 AI 推荐的歌曲（艺术家 + 标题）与 Spotify 等平台上的真实曲目进行匹配的 Rust 库。
//!
//! ## 主要功能
//!
//! - **多策略搜索**: 依次尝试 `exact`、`fuzzy`、`partial`、`artist_only` 四种查询方式，
//!   找到高置信度匹配后立即停止。
//! - **置信度评分**: 基于忽略大小写的 Levenshtein 相似度，对艺术家和标题加权打分。
//! - **容错**: 单首歌曲的搜索失败只会降级该歌曲，不会让整批匹配失败。
//!
//! ## 匹配歌曲
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use commonstream_matcher::providers::spotify::SpotifyClient;
//! use commonstream_matcher::{SuggestedTrack, TrackMatcher};
//!
//! async {
//!     let client = SpotifyClient::new("<access token>").unwrap();
//!     let matcher = TrackMatcher::new(Arc::new(client));
//!
//!     let tracks = vec![
//!         SuggestedTrack::new("Queen", "Bohemian Rhapsody"),
//!         SuggestedTrack::new("The Weeknd", "Blinding Lights"),
//!     ];
//!     let response = matcher.match_tracks(&tracks).await;
//!     if response.success {
//!         for m in &response.matches {
//!             println!("{} -> {:?} ({})", m.suggested.title, m.status, m.confidence);
//!         }
//!     } else {
//!         eprintln!("匹配失败: {:?}", response.error);
//!     }
//! };
//! ```
pub mod config;
pub mod error;
pub mod model;
pub mod providers;
pub mod search;

use std::{sync::Arc, time::Instant};

use tracing::{error, warn};

pub use crate::{
    config::{MatchingOptions, RateLimitPolicy},
    error::{MatchingError, Result},
    model::{
        stats::{MatchingMetrics, MatchingStats},
        strategy::SearchStrategy,
        track::{
            Candidate, MatchStatus, MatchSummary, SuggestedTrack, TrackMatch,
            TrackMatchingResponse,
        },
    },
};

use crate::providers::{SearchProvider, spotify::SpotifyClient};

// ==========================================================
//  顶层 API
// ==========================================================

/// 顶层匹配客户端，封装了搜索提供商和匹配配置。
///
/// 这是与本库交互的主要入口点。
pub struct TrackMatcher {
    provider: Arc<dyn SearchProvider>,
    options: MatchingOptions,
}

impl TrackMatcher {
    /// 使用指定的搜索提供商和默认配置创建匹配器。
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self {
            provider,
            options: MatchingOptions::default(),
        }
    }

    /// 使用 Spotify 访问令牌创建匹配器。
    pub fn spotify(access_token: impl Into<String>) -> Result<Self> {
        Ok(Self::new(Arc::new(SpotifyClient::new(access_token)?)))
    }

    /// 替换默认的匹配配置。
    #[must_use]
    pub fn with_options(mut self, options: MatchingOptions) -> Self {
        self.options = options;
        self
    }

    /// 当前使用的匹配配置。
    pub fn options(&self) -> &MatchingOptions {
        &self.options
    }

    /// 使用当前配置匹配一组推荐歌曲。
    ///
    /// # 返回
    /// 一个 `TrackMatchingResponse`。成功时 `matches` 与输入一一对应；
    /// 失败时 `success` 为 `false`，`matches` 为空，并带有错误代码。
    pub async fn match_tracks(&self, tracks: &[SuggestedTrack]) -> TrackMatchingResponse {
        self.match_tracks_with(tracks, &self.options).await
    }

    /// 使用指定配置匹配一组推荐歌曲。
    pub async fn match_tracks_with(
        &self,
        tracks: &[SuggestedTrack],
        options: &MatchingOptions,
    ) -> TrackMatchingResponse {
        let started = Instant::now();

        match search::match_tracks(self.provider.as_ref(), tracks, options).await {
            Ok(outcome) => {
                let metrics = MatchingMetrics::compute(
                    &outcome.matches,
                    started.elapsed(),
                    outcome.api_calls,
                );
                TrackMatchingResponse::succeeded(outcome.matches, metrics)
            }
            Err(e) => {
                error!("[Matcher] 歌曲匹配失败 ({}): {}", e.code(), e);
                TrackMatchingResponse::failed(&e)
            }
        }
    }

    /// 用一次最小的搜索请求检查提供商是否可用。
    pub async fn test_connection(&self) -> bool {
        match self.provider.search_tracks("test", 1).await {
            Ok(_) => true,
            Err(e) => {
                warn!(
                    "[Matcher] 提供商 '{}' 连接测试失败: {}",
                    self.provider.name(),
                    e
                );
                false
            }
        }
    }
}
