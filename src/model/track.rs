//! 定义了与歌曲匹配功能相关的核心数据结构，包括推荐输入、候选曲目和匹配结果。

use serde::{Deserialize, Serialize};

use crate::model::{stats::MatchingMetrics, strategy::SearchStrategy};

/// 代表一首由外部推荐流程（通常是 LLM）给出的歌曲。
///
/// 这是匹配函数的输入，匹配过程中不会被修改。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedTrack {
    /// 艺术家名。
    pub artist: String,
    /// 歌曲标题。
    pub title: String,
    /// 推荐理由。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl SuggestedTrack {
    /// 创建一个不带推荐理由的 `SuggestedTrack`。
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            reasoning: None,
        }
    }
}

/// 代表搜索提供商针对某个查询返回的一条真实曲目。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// 在其所在平台的唯一 ID。
    pub id: String,
    /// 曲目标题。
    pub title: String,
    /// 第一位（主）艺术家的名字。
    pub primary_artist_name: String,
    /// 平台给出的热度，范围 0..=100。
    pub popularity: u8,
    /// 平台的资源 URI，例如 `spotify:track:...`。
    pub external_uri: String,
}

/// 单首歌曲的匹配状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// 找到了可信的匹配。
    Found,
    /// 没有找到任何匹配。
    NotFound,
    /// 有多个结果，且最佳结果的置信度不足以排除其它候选。
    MultipleMatches,
    /// 最佳结果的置信度低于阈值。
    LowConfidence,
}

/// 一首推荐歌曲的匹配结果。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackMatch {
    /// 原始的推荐歌曲。
    pub suggested: SuggestedTrack,
    /// 选中的候选曲目，`NotFound` 时为 `None`。
    pub matched_candidate: Option<Candidate>,
    /// 置信度，范围 0..=100。
    pub confidence: u8,
    /// 匹配状态。
    pub status: MatchStatus,
    /// 产生该结果的查询字符串。
    pub search_query: String,
    /// 人类可读的匹配说明。
    pub reasoning: String,
    /// 产生该结果的搜索策略。
    pub strategy: Option<SearchStrategy>,
    /// 备选曲目，最多 3 个，不包含 `matched_candidate`。
    #[serde(default)]
    pub alternatives: Vec<Candidate>,
}

impl TrackMatch {
    /// 构造一个未找到的匹配结果。
    pub(crate) fn not_found(
        suggested: SuggestedTrack,
        search_query: String,
        reasoning: String,
    ) -> Self {
        Self {
            suggested,
            matched_candidate: None,
            confidence: 0,
            status: MatchStatus::NotFound,
            search_query,
            reasoning,
            strategy: None,
            alternatives: Vec::new(),
        }
    }
}

/// 一批匹配结果的汇总计数。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    /// 总数。
    pub total: usize,
    /// 状态为 `Found` 的数量。
    pub found: usize,
    /// 状态为 `NotFound` 的数量。
    pub not_found: usize,
    /// 状态为 `LowConfidence` 的数量。
    pub low_confidence: usize,
}

impl MatchSummary {
    /// 统计一组匹配结果。
    pub fn from_matches(matches: &[TrackMatch]) -> Self {
        let count = |status: MatchStatus| matches.iter().filter(|m| m.status == status).count();
        Self {
            total: matches.len(),
            found: count(MatchStatus::Found),
            not_found: count(MatchStatus::NotFound),
            low_confidence: count(MatchStatus::LowConfidence),
        }
    }
}

/// 一次批量匹配的最终结果。
///
/// 成功时 `matches` 与输入一一对应且顺序一致；失败时 `matches` 为空，
/// 并在 `error` / `error_code` 中给出原因。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackMatchingResponse {
    /// 整批操作是否成功。
    pub success: bool,
    /// 每首推荐歌曲的匹配结果。
    pub matches: Vec<TrackMatch>,
    /// 汇总计数。
    pub summary: MatchSummary,
    /// 本次匹配的运行指标，失败时为 `None`。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MatchingMetrics>,
    /// 错误描述。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// 错误代码，例如 `NO_TRACKS`。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl TrackMatchingResponse {
    /// 构造一个成功的响应。
    pub(crate) fn succeeded(matches: Vec<TrackMatch>, metrics: MatchingMetrics) -> Self {
        Self {
            success: true,
            summary: MatchSummary::from_matches(&matches),
            matches,
            metrics: Some(metrics),
            error: None,
            error_code: None,
        }
    }

    /// 构造一个整批失败的响应。
    pub(crate) fn failed(error: &crate::error::MatchingError) -> Self {
        Self {
            success: false,
            matches: Vec::new(),
            summary: MatchSummary::default(),
            metrics: None,
            error: Some(error.to_string()),
            error_code: Some(error.code().to_string()),
        }
    }
}
