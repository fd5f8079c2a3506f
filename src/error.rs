//! 定义了整个 `commonstream-matcher` 库的错误类型 `MatchingError`。

use std::io;
use thiserror::Error;

/// `commonstream-matcher` 库的通用错误枚举。
#[derive(Error, Debug)]
pub enum MatchingError {
    /// 网络请求失败 (源自 `reqwest::Error`)
    #[error("网络请求失败: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// JSON 解析失败 (源自 `serde_json::Error`)
    #[error("JSON 解析失败: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// I/O 错误 (源自 `io::Error`)
    #[error("I/O 错误: {0}")]
    Io(#[from] io::Error),

    /// 没有提供任何待匹配的歌曲
    #[error("没有提供任何待匹配的歌曲")]
    NoTracks,

    /// 缺少访问令牌或令牌无效
    #[error("匹配歌曲需要有效的访问令牌")]
    InvalidToken,

    /// 某首推荐歌曲缺少必填字段
    #[error("第 {index} 首推荐歌曲的 `{field}` 字段为空")]
    InvalidTrack {
        /// 该歌曲在输入列表中的下标。
        index: usize,
        /// 为空的字段名。
        field: &'static str,
    },

    /// API 请求被限流
    #[error("API 请求被限流: {0}")]
    RateLimited(String),

    /// API 返回了非成功的状态码
    #[error("搜索 API 请求失败 ({status}): {message}")]
    ApiError {
        /// HTTP 状态码。
        status: u16,
        /// 错误描述。
        message: String,
    },

    /// 更通用的网络层错误
    #[error("网络错误: {0}")]
    Network(String),

    /// 单次搜索请求超时
    #[error("搜索请求在 {0} 毫秒后超时")]
    Timeout(u64),

    /// 无效的匹配配置
    #[error("无效的匹配配置: {0}")]
    InvalidOptions(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),
}

impl MatchingError {
    /// 返回该错误对应的、供下游使用的错误代码。
    ///
    /// 未归类的错误统一返回 `UNKNOWN_ERROR`。
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoTracks => "NO_TRACKS",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::InvalidTrack { .. } => "INVALID_TRACK",
            Self::RateLimited(_) => "RATE_LIMIT",
            Self::ApiError { .. } | Self::JsonParse(_) => "API_ERROR",
            Self::Network(_) | Self::Reqwest(_) => "NETWORK_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::InvalidOptions(_) => "INVALID_OPTIONS",
            Self::Io(_) | Self::Internal(_) => "UNKNOWN_ERROR",
        }
    }

    /// 判断该错误是否为限流信号。
    #[must_use]
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

/// `MatchingError` 的 `Result` 类型别名，方便在函数签名中使用。
pub type Result<T> = std::result::Result<T, MatchingError>;
