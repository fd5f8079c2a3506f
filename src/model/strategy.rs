//! 搜索策略及其对应的查询字符串构造。

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::model::track::SuggestedTrack;

/// 构造搜索查询的方式。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// 同时限定标题和艺术家字段。
    Exact,
    /// 标题和艺术家的自由文本。
    Fuzzy,
    /// 只取标题和艺术家的第一个词。
    Partial,
    /// 只限定艺术家。
    ArtistOnly,
    /// 只限定标题，不在默认的尝试顺序里。
    TitleOnly,
}

/// 默认的策略尝试顺序。
pub const ACTIVE_STRATEGIES: [SearchStrategy; 4] = [
    SearchStrategy::Exact,
    SearchStrategy::Fuzzy,
    SearchStrategy::Partial,
    SearchStrategy::ArtistOnly,
];

impl SearchStrategy {
    /// 根据推荐歌曲构造该策略的查询字符串。
    #[must_use]
    pub fn build_query(self, track: &SuggestedTrack) -> String {
        let SuggestedTrack { artist, title, .. } = track;
        match self {
            Self::Exact => format!("track:\"{title}\" artist:\"{artist}\""),
            Self::Fuzzy => format!("{title} {artist}"),
            Self::Partial => format!(
                "track:{} artist:{}",
                first_word(title),
                first_word(artist)
            ),
            Self::ArtistOnly => format!("artist:\"{artist}\""),
            Self::TitleOnly => format!("track:\"{title}\""),
        }
    }

    /// 该策略是否依赖模糊查询。
    ///
    /// 关闭 `fuzzy_search` 时这些策略会被跳过。
    #[must_use]
    pub fn is_fuzzy(self) -> bool {
        matches!(self, Self::Fuzzy | Self::Partial)
    }
}

/// 按单个空格切分后的第一个片段。
fn first_word(s: &str) -> &str {
    s.split(' ').next().unwrap_or_default()
}

/// 根据配置返回要依次尝试的策略。
pub(crate) fn strategies_for(fuzzy_search: bool) -> impl Iterator<Item = SearchStrategy> {
    ACTIVE_STRATEGIES
        .into_iter()
        .filter(move |s| fuzzy_search || !s.is_fuzzy())
}
