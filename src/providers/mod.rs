//! 提供商模块
//!
//! 该模块定义了匹配引擎所依赖的搜索能力的抽象。

use async_trait::async_trait;

use crate::{error::Result, model::track::Candidate};

pub mod spotify;

/// 定义了所有曲目搜索提供商需要实现的通用接口。
///
/// 匹配引擎只依赖这一个能力：给定查询字符串，返回候选曲目列表。
/// 鉴权、基础 URL、响应信封的解析等细节都由实现者自行处理。
#[async_trait]
pub trait SearchProvider: Send + Sync {
    ///
    /// 返回提供商的唯一名称。
    ///
    /// 一个全小写的静态字符串，例如 `"spotify"`。
    ///
    fn name(&self) -> &'static str;

    ///
    /// 提供商是否持有可用的凭据。
    ///
    /// 返回 `false` 时整批匹配会以 `INVALID_TOKEN` 失败，不会发出任何请求。
    ///
    fn has_credentials(&self) -> bool {
        true
    }

    ///
    /// 根据查询字符串搜索曲目。
    ///
    /// # 参数
    /// * `query` - 查询字符串，可能包含 `track:` / `artist:` 等字段限定。
    /// * `limit` - 最多返回的条数。
    ///
    /// # 返回
    /// 一个 `Result`，成功时包含按平台相关度排序的候选曲目。
    /// 限流时应返回 `MatchingError::RateLimited`。
    ///
    async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<Candidate>>;
}
