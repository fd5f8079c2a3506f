use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use commonstream_matcher::{
    Candidate, MatchStatus, MatchingError, MatchingOptions, MatchingStats, Result,
    SuggestedTrack, TrackMatcher, TrackMatchingResponse, providers::SearchProvider,
};

type Responder = dyn Fn(&str) -> Result<Vec<Candidate>> + Send + Sync;

/// 由闭包决定返回内容，并按顺序记录每一次查询的 Mock 提供商。
struct ScriptedProvider {
    respond: Box<Responder>,
    latency: fn(&str) -> Duration,
    queries: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(respond: impl Fn(&str) -> Result<Vec<Candidate>> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            respond: Box::new(respond),
            latency: |_| Duration::ZERO,
            queries: Mutex::new(Vec::new()),
        })
    }

    fn with_latency(
        respond: impl Fn(&str) -> Result<Vec<Candidate>> + Send + Sync + 'static,
        latency: fn(&str) -> Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            respond: Box::new(respond),
            latency,
            queries: Mutex::new(Vec::new()),
        })
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn search_tracks(&self, query: &str, _limit: u32) -> Result<Vec<Candidate>> {
        self.queries.lock().unwrap().push(query.to_string());
        let latency = (self.latency)(query);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        (self.respond)(query)
    }
}

fn candidate(id: &str, title: &str, artist: &str, popularity: u8) -> Candidate {
    Candidate {
        id: id.to_string(),
        title: title.to_string(),
        primary_artist_name: artist.to_string(),
        popularity,
        external_uri: format!("spotify:track:{id}"),
    }
}

fn options() -> MatchingOptions {
    MatchingOptions {
        inter_track_delay_ms: 0,
        ..Default::default()
    }
}

fn matcher(provider: Arc<ScriptedProvider>, options: MatchingOptions) -> TrackMatcher {
    TrackMatcher::new(provider).with_options(options)
}

/// 检查每条匹配结果都满足的通用约束。
fn assert_invariants(tracks: &[SuggestedTrack], response: &TrackMatchingResponse) {
    assert!(response.success);
    assert_eq!(response.matches.len(), tracks.len());

    for (i, m) in response.matches.iter().enumerate() {
        assert_eq!(&m.suggested, &tracks[i], "第 {i} 条结果的顺序不正确");
        assert!(m.confidence <= 100);
        assert_eq!(
            m.status == MatchStatus::NotFound,
            m.matched_candidate.is_none(),
            "第 {i} 条结果的状态与候选不一致"
        );
        assert!(m.alternatives.len() <= 3);

        let ids: HashSet<_> = m.alternatives.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), m.alternatives.len(), "备选中有重复的 ID");
        if let Some(matched) = &m.matched_candidate {
            assert!(!ids.contains(matched.id.as_str()), "备选中包含已选中的曲目");
        }
    }
}

#[test_log::test(tokio::test)]
async fn test_exact_match_stops_after_first_strategy() {
    let provider = ScriptedProvider::new(|query| {
        if query == r#"track:"Bohemian Rhapsody" artist:"Queen""# {
            Ok(vec![candidate("bohemian", "Bohemian Rhapsody", "Queen", 90)])
        } else {
            Ok(vec![])
        }
    });
    let tracks = vec![SuggestedTrack::new("Queen", "Bohemian Rhapsody")];

    let response = matcher(provider.clone(), options()).match_tracks(&tracks).await;

    assert_invariants(&tracks, &response);
    let m = &response.matches[0];
    assert!(m.confidence >= 90);
    assert_eq!(m.status, MatchStatus::Found);
    assert_eq!(m.matched_candidate.as_ref().unwrap().id, "bohemian");
    assert_eq!(
        m.reasoning,
        "High confidence match found using exact search"
    );
    assert_eq!(provider.queries().len(), 1, "高置信度匹配后不应继续搜索");
}

#[test_log::test(tokio::test)]
async fn test_no_results_anywhere_tries_all_strategies_in_order() {
    let provider = ScriptedProvider::new(|_| Ok(vec![]));
    let tracks = vec![SuggestedTrack::new("Queen", "Bohemian Rhapsody")];

    let response = matcher(provider.clone(), options()).match_tracks(&tracks).await;

    assert_invariants(&tracks, &response);
    let m = &response.matches[0];
    assert_eq!(m.status, MatchStatus::NotFound);
    assert_eq!(m.confidence, 0);
    assert!(m.matched_candidate.is_none());
    assert_eq!(m.reasoning, "No matches found with any search strategy");
    assert_eq!(m.search_query, r#"track:"Bohemian Rhapsody" artist:"Queen""#);

    assert_eq!(
        provider.queries(),
        vec![
            r#"track:"Bohemian Rhapsody" artist:"Queen""#,
            "Bohemian Rhapsody Queen",
            "track:Bohemian artist:Queen",
            r#"artist:"Queen""#,
        ]
    );
}

#[test_log::test(tokio::test)]
async fn test_name_mismatch_gives_reduced_confidence() {
    let provider =
        ScriptedProvider::new(|_| Ok(vec![candidate("bl", "Blinding Light", "Weeknd", 0)]));
    let tracks = vec![SuggestedTrack::new("The Weeknd", "Blinding Lights")];

    let response = matcher(provider.clone(), options()).match_tracks(&tracks).await;
    assert_invariants(&tracks, &response);
    let m = &response.matches[0];
    assert!(m.confidence > 0 && m.confidence < 90);
    assert_eq!(m.confidence, 71);
    assert_eq!(m.status, MatchStatus::Found);
    assert_eq!(
        m.reasoning,
        "Good match found, minor differences in artist/title"
    );
    // 每个策略都只拿到 71 分，所以全部四个策略都会被尝试
    assert_eq!(provider.queries().len(), 4);

    let strict = MatchingOptions {
        min_confidence: 75,
        ..options()
    };
    let response = matcher(provider, strict).match_tracks(&tracks).await;
    assert_eq!(response.matches[0].status, MatchStatus::LowConfidence);
    assert_eq!(response.summary.low_confidence, 1);
}

#[test_log::test(tokio::test)]
async fn test_multiple_results_below_high_confidence() {
    let provider = ScriptedProvider::new(|_| {
        Ok(vec![
            candidate("bl", "Blinding Light", "Weeknd", 0),
            candidate("other", "Save Your Tears", "The Weeknd", 0),
        ])
    });
    let tracks = vec![SuggestedTrack::new("The Weeknd", "Blinding Lights")];

    let response = matcher(provider, options()).match_tracks(&tracks).await;
    assert_invariants(&tracks, &response);

    let m = &response.matches[0];
    assert_eq!(m.status, MatchStatus::MultipleMatches);
    assert_eq!(m.matched_candidate.as_ref().unwrap().id, "bl");
    assert_eq!(
        m.alternatives.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
        vec!["other"]
    );
}

#[test_log::test(tokio::test)]
async fn test_one_failing_track_does_not_abort_batch() {
    let provider = ScriptedProvider::new(|query| {
        if query.contains("Nonexistent") {
            Err(MatchingError::ApiError {
                status: 500,
                message: "Internal Server Error".to_string(),
            })
        } else if query == r#"track:"Dancing Queen" artist:"ABBA""# {
            Ok(vec![candidate("dq", "Dancing Queen", "ABBA", 85)])
        } else {
            Ok(vec![])
        }
    });
    let tracks = vec![
        SuggestedTrack::new("Nonexistent Band", "Nonexistent Song"),
        SuggestedTrack::new("ABBA", "Dancing Queen"),
    ];

    let response = matcher(provider.clone(), options()).match_tracks(&tracks).await;

    assert_invariants(&tracks, &response);
    assert_eq!(response.matches[0].status, MatchStatus::NotFound);
    assert!(response.matches[0].reasoning.contains("500"));
    assert_eq!(response.matches[1].status, MatchStatus::Found);
    assert_eq!(response.summary.total, 2);
    assert_eq!(response.summary.found, 1);
    assert_eq!(response.summary.not_found, 1);

    let metrics = response.metrics.unwrap();
    assert_eq!(metrics.api_calls_used, 5);
    assert_eq!(provider.queries().len(), 5);

    let stats = MatchingStats::from_matches(&response.matches);
    insta::assert_yaml_snapshot!(stats, @r"
    byConfidence:
      high: 1
      medium: 0
      low: 0
      veryLow: 1
    byStatus:
      found: 1
      notFound: 1
      multipleMatches: 0
      lowConfidence: 0
    ");
}

#[test_log::test(tokio::test)]
async fn test_matching_is_deterministic() {
    let respond = |query: &str| -> Result<Vec<Candidate>> {
        Ok(if query.starts_with("artist:") {
            vec![
                candidate("a", "Hey Jude", "The Beatles", 70),
                candidate("b", "Let It Be", "The Beatles", 75),
                candidate("c", "Yesterday", "The Beatles", 72),
                candidate("d", "Help!", "The Beatles", 60),
            ]
        } else {
            vec![candidate("x", "Hey Jude (Remastered)", "Beatles", 40)]
        })
    };
    let tracks = vec![
        SuggestedTrack::new("The Beatles", "Hey Jude"),
        SuggestedTrack::new("The Beatles", "Something"),
    ];

    let first = matcher(ScriptedProvider::new(respond), options())
        .match_tracks(&tracks)
        .await;
    let second = matcher(ScriptedProvider::new(respond), options())
        .match_tracks(&tracks)
        .await;

    assert_invariants(&tracks, &first);
    assert_eq!(first.matches, second.matches);
    assert_eq!(first.summary, second.summary);
}

#[test_log::test(tokio::test)]
async fn test_concurrent_matching_preserves_input_order() {
    let tracks: Vec<SuggestedTrack> = (0..6)
        .map(|i| SuggestedTrack::new(format!("Artist {i}"), format!("Song {i}")))
        .collect();

    // 越靠前的歌曲响应越慢，让完成顺序与输入顺序相反
    let provider = ScriptedProvider::with_latency(
        |query| {
            let digit = query
                .chars()
                .find(char::is_ascii_digit)
                .unwrap_or('0');
            Ok(vec![candidate(
                &format!("id-{digit}"),
                &format!("Song {digit}"),
                &format!("Artist {digit}"),
                50,
            )])
        },
        |query| {
            let digit = query
                .chars()
                .find(char::is_ascii_digit)
                .and_then(|c| c.to_digit(10))
                .unwrap_or(0);
            Duration::from_millis(u64::from(6 - digit) * 10)
        },
    );
    let concurrent = MatchingOptions {
        concurrency: 3,
        ..options()
    };

    let response = matcher(provider, concurrent).match_tracks(&tracks).await;

    assert_invariants(&tracks, &response);
    for (i, m) in response.matches.iter().enumerate() {
        assert_eq!(m.matched_candidate.as_ref().unwrap().id, format!("id-{i}"));
        assert_eq!(m.status, MatchStatus::Found);
    }
}

#[test_log::test(tokio::test)]
async fn test_response_serializes_for_downstream() {
    let provider = ScriptedProvider::new(|_| Ok(vec![]));
    let tracks = vec![SuggestedTrack::new("Queen", "Bohemian Rhapsody")];

    let response = matcher(provider, options()).match_tracks(&tracks).await;
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["success"], true);
    assert_eq!(json["matches"][0]["status"], "not_found");
    assert!(json["matches"][0]["matchedCandidate"].is_null());
    assert_eq!(json["summary"]["notFound"], 1);
    assert!(json.get("errorCode").is_none());

    let failed = matcher(ScriptedProvider::new(|_| Ok(vec![])), options())
        .match_tracks(&[])
        .await;
    let json = serde_json::to_value(&failed).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["errorCode"], "NO_TRACKS");
    assert_eq!(json["matches"], serde_json::json!([]));
}
