//! 匹配算法模块：字符串相似度、置信度评分与状态判定。

use strsim::normalized_levenshtein;

use crate::model::{
    strategy::SearchStrategy,
    track::{Candidate, MatchStatus, SuggestedTrack, TrackMatch},
};

/// 置信度达到此值即认为匹配可靠，不再尝试后续策略。
pub const HIGH_CONFIDENCE: u8 = 90;

const ARTIST_WEIGHT: f64 = 0.4;
const TITLE_WEIGHT: f64 = 0.5;
const POPULARITY_WEIGHT: f64 = 0.1;
const POPULARITY_CAP: f64 = 0.1;
const EXACT_BONUS_THRESHOLD: f64 = 0.8;
const EXACT_BONUS: f64 = 0.1;

/// 忽略大小写的 Levenshtein 相似度，范围 0.0..=1.0。
///
/// 计算方式为 `1 - 编辑距离 / 较长字符串的长度`，两个空串的相似度为 1。
pub fn string_similarity(a: &str, b: &str) -> f64 {
    normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

/// 计算候选曲目与推荐歌曲之间的置信度，范围 0..=100。
///
/// 艺术家相似度占 40%，标题相似度占 50%，热度最多贡献 0.01；
/// `exact` 策略下若加权和已超过 0.8，再额外加 0.1。
pub fn calculate_confidence(
    suggested: &SuggestedTrack,
    candidate: &Candidate,
    strategy: SearchStrategy,
) -> u8 {
    let artist_similarity = string_similarity(&suggested.artist, &candidate.primary_artist_name);
    let title_similarity = string_similarity(&suggested.title, &candidate.title);
    let popularity_bonus = (f64::from(candidate.popularity) / 100.0).min(POPULARITY_CAP);

    let mut confidence = artist_similarity * ARTIST_WEIGHT
        + title_similarity * TITLE_WEIGHT
        + popularity_bonus * POPULARITY_WEIGHT;

    if strategy == SearchStrategy::Exact && confidence > EXACT_BONUS_THRESHOLD {
        confidence += EXACT_BONUS;
    }

    (confidence.min(1.0) * 100.0).round().clamp(0.0, 100.0) as u8
}

/// 根据置信度、阈值和结果数量判定匹配状态。
pub fn determine_match_status(
    confidence: u8,
    min_confidence: u8,
    result_count: usize,
) -> MatchStatus {
    if confidence == 0 {
        MatchStatus::NotFound
    } else if confidence < min_confidence {
        MatchStatus::LowConfidence
    } else if result_count > 1 && confidence < HIGH_CONFIDENCE {
        MatchStatus::MultipleMatches
    } else {
        MatchStatus::Found
    }
}

/// 生成人类可读的匹配说明。
pub fn generate_match_reasoning(
    suggested: &SuggestedTrack,
    candidate: Option<&Candidate>,
    confidence: u8,
    strategy: SearchStrategy,
) -> String {
    if candidate.is_none() {
        return format!(
            "No matching track found for \"{}\" by {}",
            suggested.title, suggested.artist
        );
    }

    match confidence {
        90.. => format!("High confidence match found using {strategy} search"),
        70..=89 => "Good match found, minor differences in artist/title".to_string(),
        50..=69 => "Possible match found, but low confidence due to name differences".to_string(),
        _ => "Low confidence match, may not be the intended track".to_string(),
    }
}

/// 对某个策略返回的全部候选曲目评分，选出其中最好的一条。
///
/// 并列时保留靠前的候选；所有候选都为 0 分时不选中任何曲目。
pub fn evaluate_candidates(
    suggested: &SuggestedTrack,
    candidates: &[Candidate],
    strategy: SearchStrategy,
    search_query: &str,
    min_confidence: u8,
) -> TrackMatch {
    let mut best: Option<&Candidate> = None;
    let mut best_confidence = 0;

    for candidate in candidates {
        let confidence = calculate_confidence(suggested, candidate, strategy);
        if confidence > best_confidence {
            best_confidence = confidence;
            best = Some(candidate);
        }
    }

    TrackMatch {
        suggested: suggested.clone(),
        matched_candidate: best.cloned(),
        confidence: best_confidence,
        status: determine_match_status(best_confidence, min_confidence, candidates.len()),
        search_query: search_query.to_string(),
        reasoning: generate_match_reasoning(suggested, best, best_confidence, strategy),
        strategy: Some(strategy),
        alternatives: Vec::new(),
    }
}
