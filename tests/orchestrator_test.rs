// tests/orchestrator_test.rs — Integration test: orchestrator with mock provider

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use tripkoi::core::orchestrator::{GenerationSettings, Orchestrator};
use tripkoi::core::route;
use tripkoi::core::trip::{TripContext, TripRequest};
use tripkoi::core::types::{Category, ProgressEvent};
use tripkoi::infra::errors::TripKoiError;
use tripkoi::provider::fallback::FallbackChain;
use tripkoi::provider::*;

/// What the mock answers on a given call.
#[derive(Clone)]
enum Reply {
    Text(String),
    Fail,
}

/// A mock provider that replays scripted replies without any network calls.
/// The last reply repeats once the script runs out.
struct MockProvider {
    script: Vec<Reply>,
    calls: AtomicU32,
    models_seen: Mutex<Vec<String>>,
}

impl MockProvider {
    fn new(script: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicU32::new(0),
            models_seen: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn id(&self) -> &str {
        "google"
    }

    fn name(&self) -> &str {
        "Mock Provider"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, TripKoiError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
        self.models_seen.lock().unwrap().push(request.model.clone());
        match &self.script[n.min(self.script.len() - 1)] {
            Reply::Text(content) => Ok(ChatResponse {
                content: content.clone(),
                usage: TokenUsage {
                    input_tokens: 100,
                    output_tokens: 50,
                },
                stop_reason: StopReason::EndTurn,
            }),
            Reply::Fail => Err(TripKoiError::Provider {
                provider: "google".into(),
                message: "503 Service Unavailable".into(),
                retriable: true,
            }),
        }
    }
}

fn orchestrator(provider: Arc<MockProvider>, fallback: Option<&str>) -> Orchestrator {
    let chain = FallbackChain::pair(
        provider,
        ModelRef::new("google", "gemini-2.5-flash"),
        fallback.map(|m| ModelRef::new("google", m)),
    );
    Orchestrator::new(
        chain,
        GenerationSettings {
            backoff: Duration::ZERO,
            ..Default::default()
        },
    )
}

/// 3-day trip, one traveler, 900,000 KRW: a 300,000 KRW day budget.
fn osaka_trip() -> TripContext {
    TripContext::from_request(&TripRequest {
        city: "오사카".into(),
        start_date: "2026-11-01".into(),
        end_date: "2026-11-03".into(),
        people: "1명".into(),
        budget: "900,000원".into(),
    })
    .unwrap()
}

fn stop(name: &str, category: &str, lat: f64, lng: f64) -> Value {
    json!({
        "placeName": name,
        "category": category,
        "lat": lat,
        "lng": lng,
        "estimatedCost": 15000,
        "summary": "오사카 대표 명소"
    })
}

/// Stops listed out of time order to exercise sequencing.
fn full_day(day: u32, last: bool) -> Value {
    let stops = if last {
        vec![
            stop("구로몬 시장", "lunch", 34.665, 135.506),
            stop("호텔 조식", "breakfast", 34.668, 135.501),
            stop("신사이바시", "shopping", 34.672, 135.501),
            stop("간사이 공항", "airport", 34.434, 135.244),
        ]
    } else {
        vec![
            stop("도톤보리 쿠시카츠", "dinner", 34.668, 135.501),
            stop("오사카성", "sightseeing", 34.687, 135.526),
            stop("카페 모닝", "breakfast", 34.670, 135.500),
            stop("우메다 라멘", "lunch", 34.702, 135.495),
        ]
    };
    json!({"day": day, "title": format!("{day}일차"), "stops": stops})
}

fn full_itinerary_json(days: &[u32]) -> String {
    let total = *days.iter().max().unwrap_or(&0);
    let plans: Vec<Value> = days.iter().map(|d| full_day(*d, *d == total)).collect();
    json!({
        "dayPlans": plans,
        "averageWeather": {
            "month": 11, "tempHigh": 18, "tempLow": 10, "precipitation": 60,
            "rainyDays": 7, "season": "가을", "tip": "얇은 겉옷을 챙기세요"
        }
    })
    .to_string()
}

// ─── Full itinerary ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_full_itinerary_covers_every_day() {
    let provider = MockProvider::new(vec![Reply::Text(full_itinerary_json(&[3, 1, 2]))]);
    let orch = orchestrator(provider.clone(), None);
    let itinerary = orch.generate_itinerary(&osaka_trip()).await.unwrap();

    let days: Vec<u32> = itinerary.day_plans.iter().map(|d| d.day).collect();
    assert_eq!(days, vec![1, 2, 3]);
    assert_eq!(itinerary.days, 3);
    assert_eq!(itinerary.currency_code, "JPY");
    assert_eq!(itinerary.average_weather.as_ref().unwrap().month, 11);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_full_itinerary_meals_and_time_order() {
    let provider = MockProvider::new(vec![Reply::Text(full_itinerary_json(&[1, 2, 3]))]);
    let itinerary = orchestrator(provider, None)
        .generate_itinerary(&osaka_trip())
        .await
        .unwrap();

    for plan in &itinerary.day_plans {
        assert!(plan.has_category(Category::Breakfast), "day {}", plan.day);
        assert!(plan.has_category(Category::Lunch), "day {}", plan.day);
        if plan.day < 3 {
            assert!(plan.has_category(Category::Dinner), "day {}", plan.day);
        }

        let ordinals: Vec<u8> = plan
            .stops
            .iter()
            .map(|s| route::effective_slot(s).ordinal())
            .collect();
        assert!(
            ordinals.windows(2).all(|w| w[0] <= w[1]),
            "day {} out of order: {ordinals:?}",
            plan.day
        );
        assert!(plan.stops.iter().all(|s| !s.reason.is_empty()));
    }
    assert_eq!(itinerary.day_plans[0].stops[0].category, Category::Breakfast);
}

#[tokio::test]
async fn test_full_itinerary_budget_converges() {
    let provider = MockProvider::new(vec![Reply::Text(full_itinerary_json(&[1, 2, 3]))]);
    let ctx = osaka_trip();
    let itinerary = orchestrator(provider, None)
        .generate_itinerary(&ctx)
        .await
        .unwrap();

    let day_budget = ctx.daily_budget;
    assert_eq!(day_budget, 300_000);
    for plan in &itinerary.day_plans {
        let drift = plan.day_total.abs_diff(day_budget);
        assert!(
            drift <= plan.stops.len() as u64 * 100,
            "day {} total {} drifted {drift}",
            plan.day,
            plan.day_total
        );
        assert_eq!(
            plan.day_total,
            plan.stops.iter().map(|s| s.estimated_cost).sum::<u64>()
        );
    }
    assert_eq!(
        itinerary.overall_total,
        itinerary.day_plans.iter().map(|d| d.day_total).sum::<u64>()
    );
}

// ─── Retry bound ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_succeeds_on_third_attempt() {
    let provider = MockProvider::new(vec![
        // Missing day 3
        Reply::Text(full_itinerary_json(&[1, 2])),
        Reply::Text("죄송합니다, 일정을 만들 수 없습니다.".into()),
        Reply::Text(format!(
            "여기 일정입니다:\n```json\n{}\n```",
            full_itinerary_json(&[1, 2, 3])
        )),
    ]);
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let orch = orchestrator(provider.clone(), None)
        .with_progress(move |e| sink.lock().unwrap().push(e));

    let itinerary = orch.generate_itinerary(&osaka_trip()).await.unwrap();
    assert_eq!(itinerary.day_plans.len(), 3);
    assert_eq!(provider.calls(), 3);

    let events = events.lock().unwrap();
    let failed = events
        .iter()
        .filter(|e| matches!(e, ProgressEvent::AttemptFailed { will_retry: true, .. }))
        .count();
    assert_eq!(failed, 2);
    assert!(matches!(
        events.last(),
        Some(ProgressEvent::UnitCompleted { attempts: 3, .. })
    ));
}

#[tokio::test]
async fn test_always_invalid_stops_after_three_attempts() {
    let provider = MockProvider::new(vec![Reply::Text(full_itinerary_json(&[1, 2]))]);
    let orch = orchestrator(provider.clone(), None);

    let err = orch.generate_itinerary(&osaka_trip()).await.unwrap_err();
    match err {
        TripKoiError::GenerationExhausted {
            attempts,
            last_error,
            ..
        } => {
            assert_eq!(attempts, 3);
            assert!(last_error.contains("expected 3"), "{last_error}");
        }
        other => panic!("expected GenerationExhausted, got {other:?}"),
    }
    assert_eq!(provider.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_default_backoff_waits_between_attempts() {
    let provider = MockProvider::new(vec![Reply::Text("죄송합니다, 일정을 만들 수 없습니다.".into())]);
    let chain = FallbackChain::pair(
        provider.clone(),
        ModelRef::new("google", "gemini-2.5-flash"),
        None,
    );
    let orch = Orchestrator::new(chain, GenerationSettings::default());
    assert_eq!(GenerationSettings::default().backoff, Duration::from_secs(1));

    let start = tokio::time::Instant::now();
    let err = orch.generate_itinerary(&osaka_trip()).await.unwrap_err();
    let waited = tokio::time::Instant::now() - start;

    assert!(matches!(
        err,
        TripKoiError::GenerationExhausted { attempts: 3, .. }
    ));
    assert_eq!(provider.calls(), 3);
    // Two sleeps between three attempts, none after the last.
    assert_eq!(waited, Duration::from_secs(2));
}

#[tokio::test]
async fn test_transport_failure_tries_fallback_each_attempt() {
    let provider = MockProvider::new(vec![Reply::Fail]);
    let orch = orchestrator(provider.clone(), Some("gemini-2.0-flash-001"));

    let err = orch.generate_day(&osaka_trip(), 2).await.unwrap_err();
    assert!(matches!(
        err,
        TripKoiError::GenerationExhausted { attempts: 3, .. }
    ));
    assert_eq!(provider.calls(), 6);

    let seen = provider.models_seen.lock().unwrap();
    assert_eq!(seen[0], "gemini-2.5-flash");
    assert_eq!(seen[1], "gemini-2.0-flash-001");
}

#[tokio::test]
async fn test_fallback_answer_accepted() {
    let day = json!({"stops": full_day(2, false)["stops"]}).to_string();
    let provider = MockProvider::new(vec![Reply::Fail, Reply::Text(day)]);
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let orch = orchestrator(provider.clone(), Some("gemini-2.0-flash-001"))
        .with_progress(move |e| sink.lock().unwrap().push(e));

    let generated = orch.generate_day(&osaka_trip(), 2).await.unwrap();
    assert_eq!(generated.day_plan.day, 2);
    assert!(generated.average_weather.is_none());
    assert_eq!(provider.calls(), 2);

    let events = events.lock().unwrap();
    match events.last() {
        Some(ProgressEvent::UnitCompleted {
            attempts, model, ..
        }) => {
            assert_eq!(*attempts, 1);
            assert_eq!(model, "google/gemini-2.0-flash-001");
        }
        other => panic!("unexpected last event: {other:?}"),
    }
}

// ─── Progressive ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_progressive_long_trip_uses_remaining_unit() {
    let ctx = TripContext::from_request(&TripRequest {
        city: "방콕".into(),
        start_date: "2026-12-01".into(),
        end_date: "2026-12-06".into(),
        people: "2".into(),
        budget: "3,000,000".into(),
    })
    .unwrap();
    assert_eq!(ctx.days, 6);

    let day_reply = |d: u32| {
        let mut v = json!({"stops": full_day(d, false)["stops"]});
        if d == 1 {
            v["averageWeather"] = json!({"month": 12, "tempHigh": 32, "tempLow": 23,
                                         "precipitation": 10, "rainyDays": 2,
                                         "season": "건기", "tip": "자외선 차단"});
        }
        Reply::Text(v.to_string())
    };
    let remaining = json!({"dayPlans": [full_day(5, false), full_day(6, true)]}).to_string();
    let provider = MockProvider::new(vec![
        day_reply(1),
        day_reply(2),
        day_reply(3),
        day_reply(4),
        Reply::Text(remaining),
    ]);

    let itinerary = orchestrator(provider.clone(), None)
        .generate_progressive(&ctx)
        .await
        .unwrap();
    assert_eq!(provider.calls(), 5);
    let days: Vec<u32> = itinerary.day_plans.iter().map(|d| d.day).collect();
    assert_eq!(days, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(itinerary.average_weather.unwrap().season, "건기");
    assert_eq!(itinerary.currency_code, "THB");
}
