//! 匹配模块
//!
//! 对每首推荐歌曲依次尝试多种搜索策略，为候选曲目打分，
//! 并给出带置信度的最佳匹配和备选曲目。

use std::collections::HashSet;

use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, error, info, warn};

use crate::{
    config::{MatchingOptions, RateLimitPolicy},
    error::{MatchingError, Result},
    model::{
        strategy::{SearchStrategy, strategies_for},
        track::{Candidate, SuggestedTrack, TrackMatch},
    },
    providers::SearchProvider,
};

pub mod matcher;
use matcher::{HIGH_CONFIDENCE, evaluate_candidates};

/// 备选曲目的数量上限，同时也是每个策略贡献给备选列表的条数。
pub const MAX_ALTERNATIVES: usize = 3;

const NO_MATCH_REASONING: &str = "No matches found with any search strategy";

/// 一次批量匹配的结果。
#[derive(Debug, Clone)]
pub struct MatchingOutcome {
    /// 与输入顺序一致的匹配结果。
    pub matches: Vec<TrackMatch>,
    /// 实际发起的搜索请求次数。
    pub api_calls: usize,
}

/// 单首歌曲的匹配结果和它消耗的请求次数。
struct TrackOutcome {
    track_match: TrackMatch,
    api_calls: usize,
}

/// 为一组推荐歌曲寻找对应的真实曲目。
///
/// # 参数
/// * `provider` - 一个实现了 `SearchProvider` trait 的动态引用。
/// * `tracks` - 推荐歌曲列表，不能为空，且每首歌的艺术家和标题都不能为空。
/// * `options` - 匹配配置。
///
/// # 返回
/// 一个 `Result`，成功时包含与输入一一对应的匹配结果。
/// 单首歌曲的搜索失败只会把该歌曲降级为 `NotFound`，不会让整批失败；
/// 只有输入无效，或在 `RateLimitPolicy::AbortBatch` 下遇到限流时才返回错误。
pub async fn match_tracks(
    provider: &dyn SearchProvider,
    tracks: &[SuggestedTrack],
    options: &MatchingOptions,
) -> Result<MatchingOutcome> {
    validate_input(provider, tracks)?;
    let options = options.clone().validate()?;

    info!(
        "开始匹配 {} 首歌曲 (提供商: {}, 并发: {})",
        tracks.len(),
        provider.name(),
        options.concurrency
    );

    let outcomes: Vec<TrackOutcome> = if options.concurrency > 1 {
        stream::iter(tracks.iter().enumerate())
            .map(|(index, track)| match_single_track(provider, track, &options, index))
            .buffered(options.concurrency)
            .try_collect()
            .await?
    } else {
        let delay = options.inter_track_delay();
        let mut outcomes = Vec::with_capacity(tracks.len());
        for (index, track) in tracks.iter().enumerate() {
            outcomes.push(match_single_track(provider, track, &options, index).await?);

            if index + 1 < tracks.len() && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        outcomes
    };

    let api_calls = outcomes.iter().map(|o| o.api_calls).sum();
    let matches: Vec<TrackMatch> = outcomes.into_iter().map(|o| o.track_match).collect();

    info!(
        "匹配完毕，{} 首歌曲中找到 {} 首，共发起 {} 次搜索。",
        matches.len(),
        matches
            .iter()
            .filter(|m| m.matched_candidate.is_some())
            .count(),
        api_calls
    );

    Ok(MatchingOutcome { matches, api_calls })
}

/// 检查凭据和输入。
fn validate_input(provider: &dyn SearchProvider, tracks: &[SuggestedTrack]) -> Result<()> {
    if !provider.has_credentials() {
        return Err(MatchingError::InvalidToken);
    }
    if tracks.is_empty() {
        return Err(MatchingError::NoTracks);
    }
    for (index, track) in tracks.iter().enumerate() {
        if track.artist.trim().is_empty() {
            return Err(MatchingError::InvalidTrack {
                index,
                field: "artist",
            });
        }
        if track.title.trim().is_empty() {
            return Err(MatchingError::InvalidTrack {
                index,
                field: "title",
            });
        }
    }
    Ok(())
}

/// 为单首推荐歌曲依次尝试各个搜索策略。
///
/// 某个策略失败只会被记录并跳过；一旦某个策略的最佳结果达到
/// `HIGH_CONFIDENCE`，就不再尝试后续策略。
async fn match_single_track(
    provider: &dyn SearchProvider,
    track: &SuggestedTrack,
    options: &MatchingOptions,
    index: usize,
) -> Result<TrackOutcome> {
    debug!(
        "正在匹配第 {} 首: '{}' by '{}'",
        index, track.title, track.artist
    );

    let mut best_match: Option<TrackMatch> = None;
    let mut seen: Vec<Candidate> = Vec::new();
    let mut api_calls = 0;
    let mut failures = 0;
    let mut last_error: Option<MatchingError> = None;

    for strategy in strategies_for(options.fuzzy_search) {
        let query = strategy.build_query(track);
        api_calls += 1;

        let results = match search_with_timeout(provider, &query, options).await {
            Ok(results) => results,
            Err(e)
                if e.is_rate_limit()
                    && options.rate_limit_policy == RateLimitPolicy::AbortBatch =>
            {
                error!("第 {index} 首歌曲的搜索被限流，终止整批匹配: {e}");
                return Err(e);
            }
            Err(e) => {
                warn!(
                    "第 {index} 首歌曲的 {strategy} 策略执行失败 (查询: {query})，错误: {e}。继续执行下一策略。"
                );
                failures += 1;
                last_error = Some(e);
                continue;
            }
        };

        if results.is_empty() {
            debug!("{strategy} 策略没有结果 (查询: {query})");
            continue;
        }

        debug!("{strategy} 策略命中，找到 {} 个结果。", results.len());
        let candidate_match =
            evaluate_candidates(track, &results, strategy, &query, options.min_confidence);
        seen.extend(results.into_iter().take(MAX_ALTERNATIVES));

        let confident = candidate_match.confidence >= HIGH_CONFIDENCE;
        if best_match
            .as_ref()
            .is_none_or(|best| candidate_match.confidence > best.confidence)
        {
            best_match = Some(candidate_match);
        }

        if confident {
            debug!("{strategy} 策略找到高置信度匹配，跳过剩余策略。");
            break;
        }
    }

    let Some(mut track_match) = best_match else {
        let reasoning = match last_error {
            Some(e) if failures == api_calls => e.to_string(),
            _ => NO_MATCH_REASONING.to_string(),
        };
        info!("第 {index} 首歌曲 '{}' 未找到匹配: {reasoning}", track.title);
        return Ok(TrackOutcome {
            track_match: TrackMatch::not_found(
                track.clone(),
                SearchStrategy::Exact.build_query(track),
                reasoning,
            ),
            api_calls,
        });
    };

    if options.include_alternatives {
        let matched_id = track_match.matched_candidate.as_ref().map(|c| c.id.as_str());
        track_match.alternatives = select_alternatives(seen, matched_id);
    }

    info!(
        "第 {index} 首歌曲 '{}' 匹配完成: {:?}, 置信度 {}",
        track.title, track_match.status, track_match.confidence
    );
    Ok(TrackOutcome {
        track_match,
        api_calls,
    })
}

/// 在配置了超时的情况下执行一次搜索。
async fn search_with_timeout(
    provider: &dyn SearchProvider,
    query: &str,
    options: &MatchingOptions,
) -> Result<Vec<Candidate>> {
    let search = provider.search_tracks(query, options.max_results);
    match options.timeout() {
        Some(limit) => tokio::time::timeout(limit, search)
            .await
            .map_err(|_| MatchingError::Timeout(options.timeout_ms))?,
        None => search.await,
    }
}

/// 按 ID 去重（保留首次出现的顺序），排除已选中的曲目，最多保留 `MAX_ALTERNATIVES` 个。
fn select_alternatives(candidates: Vec<Candidate>, matched_id: Option<&str>) -> Vec<Candidate> {
    let mut seen_ids = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen_ids.insert(c.id.clone()))
        .filter(|c| Some(c.id.as_str()) != matched_id)
        .take(MAX_ALTERNATIVES)
        .collect()
}
