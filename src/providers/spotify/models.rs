//! 此模块定义了用于反序列化 Spotify Web API 搜索响应的 `struct` 数据结构。

use serde::Deserialize;

use crate::model::track::Candidate;

// =================================================================
// 搜索接口 (`/v1/search?type=track`) 的模型
// =================================================================

/// 搜索 API 的顶层响应结构。
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    /// 曲目搜索结果的分页容器。
    pub tracks: TrackPage,
}

/// 曲目的分页数据。
#[derive(Debug, Deserialize)]
pub struct TrackPage {
    /// 当前页的曲目。
    pub items: Vec<Track>,
    /// 匹配到的曲目总数。
    #[serde(default)]
    pub total: u32,
    /// 本页的条数上限。
    #[serde(default)]
    pub limit: u32,
    /// 本页的起始偏移。
    #[serde(default)]
    pub offset: u32,
    /// 下一页的链接。
    pub next: Option<String>,
}

/// 单条曲目。
#[derive(Debug, Deserialize)]
pub struct Track {
    /// 曲目 ID。
    pub id: String,
    /// 曲目名。
    pub name: String,
    /// `spotify:track:...` 形式的 URI。
    pub uri: String,
    /// 艺术家列表，第一位为主艺术家。
    #[serde(default)]
    pub artists: Vec<Artist>,
    /// 所属专辑。
    pub album: Option<Album>,
    /// 时长（毫秒）。
    #[serde(default)]
    pub duration_ms: u64,
    /// 热度，0..=100。
    #[serde(default)]
    pub popularity: u8,
    /// 是否为显式内容。
    #[serde(default)]
    pub explicit: bool,
}

/// 艺术家。
#[derive(Debug, Deserialize)]
pub struct Artist {
    /// 艺术家 ID。
    pub id: String,
    /// 艺术家名。
    pub name: String,
}

/// 专辑。
#[derive(Debug, Deserialize)]
pub struct Album {
    /// 专辑 ID。
    pub id: String,
    /// 专辑名。
    pub name: String,
}

/// Spotify 出错时返回的错误信封。
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    /// 错误详情。
    pub error: ErrorBody,
}

/// 错误详情。
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    /// HTTP 状态码。
    pub status: u16,
    /// 错误描述。
    pub message: String,
}

impl From<Track> for Candidate {
    fn from(track: Track) -> Self {
        let primary_artist_name = track
            .artists
            .into_iter()
            .next()
            .map(|a| a.name)
            .unwrap_or_default();
        Self {
            id: track.id,
            title: track.name,
            primary_artist_name,
            popularity: track.popularity.min(100),
            external_uri: track.uri,
        }
    }
}
