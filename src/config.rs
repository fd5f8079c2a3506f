//! 匹配配置，以及配置文件的持久化。

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{MatchingError, Result};

const OPTIONS_FILE_NAME: &str = "matching_options.json";

/// Spotify 搜索接口单页允许的最大条数。
pub const MAX_RESULTS_LIMIT: u32 = 50;

/// 搜索提供商返回限流错误时的处理方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitPolicy {
    /// 视为该策略没有结果，继续尝试下一个策略。
    #[default]
    Absorb,
    /// 立即终止整批匹配，返回 `RATE_LIMIT`。
    AbortBatch,
}

/// 控制匹配行为的配置项。
///
/// 反序列化时缺失的字段会使用默认值，因此调用方只需提供想覆盖的部分。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchingOptions {
    /// 每次搜索请求的结果条数。
    pub max_results: u32,
    /// 判定为找到的最低置信度，范围 0..=100。
    pub min_confidence: u8,
    /// 是否附带备选曲目。
    pub include_alternatives: bool,
    /// 是否尝试 `fuzzy` 和 `partial` 策略。
    pub fuzzy_search: bool,
    /// 单次搜索请求的超时（毫秒），`0` 表示不限制。
    #[serde(rename = "timeout")]
    pub timeout_ms: u64,
    /// 顺序匹配时两首歌之间的等待时间（毫秒）。
    pub inter_track_delay_ms: u64,
    /// 同时匹配的歌曲数量上限。
    pub concurrency: usize,
    /// 限流错误的处理方式。
    pub rate_limit_policy: RateLimitPolicy,
}

impl Default for MatchingOptions {
    fn default() -> Self {
        Self {
            max_results: 5,
            min_confidence: 70,
            include_alternatives: true,
            fuzzy_search: true,
            timeout_ms: 10_000,
            inter_track_delay_ms: 100,
            concurrency: 1,
            rate_limit_policy: RateLimitPolicy::Absorb,
        }
    }
}

impl MatchingOptions {
    /// 检查并规整配置。
    ///
    /// `max_results` 为 0 时返回错误；超出平台上限的值会被截断，
    /// `min_confidence` 被截断到 100，`concurrency` 至少为 1。
    pub fn validate(mut self) -> Result<Self> {
        if self.max_results == 0 {
            return Err(MatchingError::InvalidOptions(
                "maxResults 必须大于 0".to_string(),
            ));
        }
        self.max_results = self.max_results.min(MAX_RESULTS_LIMIT);
        self.min_confidence = self.min_confidence.min(100);
        self.concurrency = self.concurrency.max(1);
        Ok(self)
    }

    /// 单次搜索请求的超时时间。
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    /// 顺序匹配时两首歌之间的等待时间。
    #[must_use]
    pub fn inter_track_delay(&self) -> Duration {
        Duration::from_millis(self.inter_track_delay_ms)
    }
}

/// 获取应用配置目录下指定文件的完整路径。
///
/// # 参数
/// * `filename` - 目标配置文件的名称，例如 "matching_options.json"。
pub(crate) fn get_config_file_path(filename: &str) -> Result<PathBuf> {
    let mut config_dir = dirs::config_dir()
        .ok_or_else(|| MatchingError::Internal("无法找到用户配置目录".to_string()))?;
    config_dir.push("commonstream");
    fs::create_dir_all(&config_dir)?;
    config_dir.push(filename);
    Ok(config_dir)
}

/// 从用户配置目录加载匹配配置，文件不存在时返回默认配置。
pub fn load_options() -> Result<MatchingOptions> {
    load_options_from(&get_config_file_path(OPTIONS_FILE_NAME)?)
}

/// 将匹配配置保存到用户配置目录。
pub fn save_options(options: &MatchingOptions) -> Result<()> {
    save_options_to(&get_config_file_path(OPTIONS_FILE_NAME)?, options)
}

/// 从指定文件加载匹配配置。
pub fn load_options_from(path: &Path) -> Result<MatchingOptions> {
    match fs::read_to_string(path) {
        Ok(content) => {
            let options: MatchingOptions = serde_json::from_str(&content)?;
            info!("已从 {:?} 加载匹配配置。", path);
            options.validate()
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("匹配配置文件不存在，将使用默认配置。");
            Ok(MatchingOptions::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// 将匹配配置序列化为 JSON 并保存到指定文件。
pub fn save_options_to(path: &Path, options: &MatchingOptions) -> Result<()> {
    let content = serde_json::to_string_pretty(options)?;
    fs::write(path, content)?;
    info!("匹配配置已保存到 {:?}。", path);
    Ok(())
}
