//! 匹配结果的统计与运行指标。

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::track::{MatchStatus, TrackMatch};

/// 按置信度区间统计的数量。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceBreakdown {
    /// 80..=100
    pub high: usize,
    /// 60..=79
    pub medium: usize,
    /// 40..=59
    pub low: usize,
    /// 0..=39
    pub very_low: usize,
}

/// 按匹配状态统计的数量。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBreakdown {
    /// `Found`
    pub found: usize,
    /// `NotFound`
    pub not_found: usize,
    /// `MultipleMatches`
    pub multiple_matches: usize,
    /// `LowConfidence`
    pub low_confidence: usize,
}

/// 一批匹配结果的分布统计。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingStats {
    /// 按置信度区间。
    pub by_confidence: ConfidenceBreakdown,
    /// 按状态。
    pub by_status: StatusBreakdown,
}

impl MatchingStats {
    /// 统计一组匹配结果。
    pub fn from_matches(matches: &[TrackMatch]) -> Self {
        let mut stats = Self::default();
        for m in matches {
            let band = &mut stats.by_confidence;
            match m.confidence {
                80.. => band.high += 1,
                60..=79 => band.medium += 1,
                40..=59 => band.low += 1,
                _ => band.very_low += 1,
            }

            let status = &mut stats.by_status;
            match m.status {
                MatchStatus::Found => status.found += 1,
                MatchStatus::NotFound => status.not_found += 1,
                MatchStatus::MultipleMatches => status.multiple_matches += 1,
                MatchStatus::LowConfidence => status.low_confidence += 1,
            }
        }
        stats
    }
}

/// 一次批量匹配的运行指标。
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingMetrics {
    /// 所有结果置信度的平均值。
    pub average_confidence: f64,
    /// 状态为 `Found` 的歌曲所占比例，范围 0.0..=1.0。
    pub match_rate: f64,
    /// 整批匹配的耗时（毫秒）。
    pub total_processing_time_ms: u64,
    /// 实际发起的搜索请求次数。
    pub api_calls_used: usize,
}

impl MatchingMetrics {
    /// 根据匹配结果、耗时和请求次数计算指标。
    pub fn compute(matches: &[TrackMatch], elapsed: Duration, api_calls_used: usize) -> Self {
        let total = matches.len();
        if total == 0 {
            return Self {
                total_processing_time_ms: elapsed.as_millis() as u64,
                api_calls_used,
                ..Self::default()
            };
        }

        let confidence_sum: u64 = matches.iter().map(|m| u64::from(m.confidence)).sum();
        let found = matches
            .iter()
            .filter(|m| m.status == MatchStatus::Found)
            .count();

        Self {
            average_confidence: confidence_sum as f64 / total as f64,
            match_rate: found as f64 / total as f64,
            total_processing_time_ms: elapsed.as_millis() as u64,
            api_calls_used,
        }
    }
}
