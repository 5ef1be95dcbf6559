// src/core/orchestrator.rs — Bounded generate/parse/validate loop per generation unit

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use super::cost;
use super::parser::{self, ParseOutcome, ParseStage};
use super::prompt;
use super::route::{self, RouteLimits};
use super::trip::TripContext;
use super::types::{DayPlan, Itinerary, ProgressEvent};
use super::validate::{self, GenerationUnit, MealPolicy, REMAINING_FROM};
use super::weather::{self, AverageWeather};
use crate::infra::config::{Config, CostStrategy};
use crate::infra::errors::{OutputError, TripKoiError};
use crate::provider::fallback::FallbackChain;
use crate::provider::google::GoogleProvider;
use crate::provider::{ChatRequest, ModelProvider, ModelRef, StopReason};

/// Days generated one call at a time before switching to the remaining unit.
const PROGRESSIVE_SINGLE_DAYS: u32 = REMAINING_FROM - 1;

/// Knobs for the retry loop and post-processing.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub max_attempts: u32,
    pub backoff: Duration,
    pub route: RouteLimits,
    pub cost_strategy: CostStrategy,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(1_000),
            route: RouteLimits::default(),
            cost_strategy: CostStrategy::Normalize,
            temperature: None,
            max_output_tokens: None,
        }
    }
}

impl From<&Config> for GenerationSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_attempts: config.generation.max_attempts,
            backoff: Duration::from_millis(config.generation.retry_backoff_ms),
            route: RouteLimits::from(&config.route),
            cost_strategy: config.budget.strategy,
            temperature: config.models.temperature,
            max_output_tokens: config.models.max_output_tokens,
        }
    }
}

/// Result of a day-scoped request. `average_weather` is only asked for on day 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayGeneration {
    pub day_plan: DayPlan,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_weather: Option<AverageWeather>,
}

/// Request-scoped state carried between the calls of a progressive run.
#[derive(Debug, Clone, Default)]
pub struct GenerationSession {
    pub average_weather: Option<AverageWeather>,
    pub day_plans: Vec<DayPlan>,
    /// Per-person KRW spent by the accepted days.
    pub spent_so_far: u64,
}

impl GenerationSession {
    fn accept(&mut self, plan: DayPlan) {
        self.spent_so_far = self.spent_so_far.saturating_add(plan.day_total);
        self.day_plans.push(plan);
    }

    fn spent(&self) -> Option<u64> {
        (!self.day_plans.is_empty()).then_some(self.spent_so_far)
    }
}

/// What one successful unit produced.
struct UnitOutput {
    day_plans: Vec<DayPlan>,
    average_weather: Option<AverageWeather>,
}

/// Per-attempt state machine. Every failure funnels through `RetryPending`.
enum Step {
    Requesting,
    Parsing(ModelRef, String),
    Validating(ModelRef, Value, ParseStage),
    RetryPending(TripKoiError),
    Success(ModelRef, ParseStage, UnitOutput),
    Exhausted(TripKoiError),
}

/// Drives itinerary generation against a fallback model chain.
pub struct Orchestrator {
    chain: FallbackChain,
    settings: GenerationSettings,
    on_progress: Option<Box<dyn Fn(ProgressEvent) + Send + Sync>>,
}

impl Orchestrator {
    pub fn new(chain: FallbackChain, settings: GenerationSettings) -> Self {
        Self {
            chain,
            settings,
            on_progress: None,
        }
    }

    /// Gemini-backed orchestrator from the loaded config.
    pub fn from_config(config: &Config) -> Result<Self, TripKoiError> {
        let mut google = GoogleProvider::new(config.api_key()?);
        if let Some(ref base_url) = config.provider.base_url {
            google = google.with_base_url(base_url.clone());
        }
        let provider: Arc<dyn ModelProvider> = Arc::new(google);
        let chain = FallbackChain::from_config(&config.models, provider)?;
        Ok(Self::new(chain, GenerationSettings::from(config)))
    }

    /// Set a callback for real-time progress events.
    pub fn with_progress(mut self, cb: impl Fn(ProgressEvent) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Box::new(cb));
        self
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(ref cb) = self.on_progress {
            cb(event);
        }
    }

    // ─── Public operations ──────────────────────────────────────────────

    /// Whole trip in a single call.
    pub async fn generate_itinerary(&self, ctx: &TripContext) -> Result<Itinerary, TripKoiError> {
        let prompt = prompt::build_full_prompt(ctx);
        let output = self.run_unit(ctx, GenerationUnit::Full, &prompt).await?;

        let mut itinerary = Itinerary::new(
            &ctx.city,
            &ctx.currency,
            ctx.days,
            output.day_plans,
            output.average_weather,
        );
        match self.settings.cost_strategy {
            CostStrategy::Normalize => {
                cost::normalize_itinerary(&mut itinerary, ctx.budget_per_person, ctx.days)
            }
            CostStrategy::Quoted => cost::apply_quoted_costs(&mut itinerary, &ctx.currency),
        }
        Ok(itinerary)
    }

    /// One day of the trip. Day 1 also carries the monthly weather averages.
    pub async fn generate_day(&self, ctx: &TripContext, day: u32) -> Result<DayGeneration, TripKoiError> {
        self.generate_day_with(ctx, day, None).await
    }

    /// Days 5..N in one call. Only valid for trips longer than four days.
    pub async fn generate_remaining(&self, ctx: &TripContext) -> Result<Vec<DayPlan>, TripKoiError> {
        self.generate_remaining_with(ctx, None).await
    }

    /// Day 1, then each day up to day 4, then the rest in one call.
    ///
    /// Calls are strictly sequential; later prompts see the cost of the days
    /// already accepted.
    pub async fn generate_progressive(&self, ctx: &TripContext) -> Result<Itinerary, TripKoiError> {
        let mut session = GenerationSession::default();

        for day in 1..=ctx.days.min(PROGRESSIVE_SINGLE_DAYS) {
            let generated = self.generate_day_with(ctx, day, session.spent()).await?;
            if day == 1 {
                session.average_weather = generated.average_weather;
            }
            self.accept_progressive(&mut session, generated.day_plan);
        }

        if ctx.days > PROGRESSIVE_SINGLE_DAYS {
            for plan in self.generate_remaining_with(ctx, session.spent()).await? {
                self.accept_progressive(&mut session, plan);
            }
        }

        tracing::info!(
            city = %ctx.city,
            days = ctx.days,
            spent = session.spent_so_far,
            "Progressive itinerary complete"
        );
        Ok(Itinerary::new(
            &ctx.city,
            &ctx.currency,
            ctx.days,
            session.day_plans,
            session.average_weather,
        ))
    }

    // ─── Unit wrappers ──────────────────────────────────────────────────

    async fn generate_day_with(
        &self,
        ctx: &TripContext,
        day: u32,
        spent_so_far: Option<u64>,
    ) -> Result<DayGeneration, TripKoiError> {
        if day == 0 || day > ctx.days {
            return Err(TripKoiError::InvalidRequest(format!(
                "day must be between 1 and {}, got {day}",
                ctx.days
            )));
        }

        let prompt = prompt::build_day_prompt(ctx, day, spent_so_far);
        let mut output = self.run_unit(ctx, GenerationUnit::Day(day), &prompt).await?;
        self.settle_costs(ctx, &mut output.day_plans);

        let day_plan = output
            .day_plans
            .into_iter()
            .next()
            .ok_or(TripKoiError::Output(OutputError::DayCount {
                expected: 1,
                actual: 0,
            }))?;
        Ok(DayGeneration {
            day_plan,
            average_weather: if day == 1 {
                output.average_weather
            } else {
                None
            },
        })
    }

    async fn generate_remaining_with(
        &self,
        ctx: &TripContext,
        spent_so_far: Option<u64>,
    ) -> Result<Vec<DayPlan>, TripKoiError> {
        if ctx.days < REMAINING_FROM {
            return Err(TripKoiError::InvalidRequest(format!(
                "remaining days need a trip of at least {REMAINING_FROM} days, got {}",
                ctx.days
            )));
        }
        let prompt = prompt::build_remaining_prompt(ctx, spent_so_far);
        let mut output = self.run_unit(ctx, GenerationUnit::Remaining, &prompt).await?;
        self.settle_costs(ctx, &mut output.day_plans);
        Ok(output.day_plans)
    }

    fn accept_progressive(&self, session: &mut GenerationSession, plan: DayPlan) {
        let (day, stops, day_total) = (plan.day, plan.stops.len(), plan.day_total);
        session.accept(plan);
        self.emit(ProgressEvent::DayReady {
            day,
            stops,
            day_total,
            spent_so_far: session.spent_so_far,
        });
    }

    /// Cost pass for day-scoped units, mirroring the itinerary-level strategy.
    fn settle_costs(&self, ctx: &TripContext, plans: &mut [DayPlan]) {
        match self.settings.cost_strategy {
            CostStrategy::Normalize => {
                let budget = cost::day_budget(ctx.budget_per_person, ctx.days);
                for plan in plans.iter_mut() {
                    plan.day_total = cost::normalize_day(&mut plan.stops, budget);
                }
            }
            CostStrategy::Quoted => {
                let quotes = cost::QuoteReader::new(&ctx.currency);
                for plan in plans.iter_mut() {
                    cost::apply_quoted_day(plan, &quotes);
                }
            }
        }
    }

    // ─── Retry loop ─────────────────────────────────────────────────────

    async fn run_unit(
        &self,
        ctx: &TripContext,
        unit: GenerationUnit,
        prompt: &str,
    ) -> Result<UnitOutput, TripKoiError> {
        let label = unit.label(ctx.days);
        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 1u32;
        let mut step = Step::Requesting;

        loop {
            step = match step {
                Step::Requesting => {
                    tracing::info!(unit = %label, attempt, max_attempts, "Requesting plan");
                    self.emit(ProgressEvent::AttemptStarted {
                        unit: label.clone(),
                        attempt,
                        max_attempts,
                    });
                    match self.chain.chat(self.request(prompt)).await {
                        Ok((model, response)) => {
                            tracing::debug!(
                                unit = %label,
                                %model,
                                tokens = response.usage.total(),
                                stop_reason = ?response.stop_reason,
                                "Response received"
                            );
                            if response.stop_reason == StopReason::MaxTokens {
                                tracing::warn!(unit = %label, %model, "Response hit the output token limit");
                            }
                            Step::Parsing(model, response.content)
                        }
                        Err(e) => Step::RetryPending(e),
                    }
                }

                Step::Parsing(model, text) => match parser::parse(&text) {
                    ParseOutcome::Parsed { value, stage } => {
                        tracing::debug!(unit = %label, %stage, "Response parsed");
                        Step::Validating(model, value, stage)
                    }
                    ParseOutcome::Failed => {
                        tracing::debug!(
                            unit = %label,
                            "Unparseable response: {}",
                            crate::util::truncate_str(&text, 200)
                        );
                        Step::RetryPending(OutputError::Unparseable.into())
                    }
                },

                Step::Validating(model, value, stage) => match self.validate(ctx, unit, &value) {
                    Ok(day_plans) => Step::Success(
                        model,
                        stage,
                        UnitOutput {
                            day_plans,
                            average_weather: weather::extract_average(&value),
                        },
                    ),
                    Err(e) => Step::RetryPending(e.into()),
                },

                Step::RetryPending(error) => {
                    let will_retry = attempt < max_attempts;
                    tracing::warn!(
                        unit = %label,
                        attempt,
                        transport = error.is_transport(),
                        retriable = error.is_retriable(),
                        will_retry,
                        "Attempt failed: {}",
                        error
                    );
                    self.emit(ProgressEvent::AttemptFailed {
                        unit: label.clone(),
                        attempt,
                        error: error.to_string(),
                        will_retry,
                    });
                    if will_retry {
                        if !self.settings.backoff.is_zero() {
                            tokio::time::sleep(self.settings.backoff).await;
                        }
                        attempt += 1;
                        Step::Requesting
                    } else {
                        Step::Exhausted(error)
                    }
                }

                Step::Success(model, stage, output) => {
                    tracing::info!(unit = %label, attempts = attempt, %model, %stage, "Plan accepted");
                    self.emit(ProgressEvent::UnitCompleted {
                        unit: label,
                        attempts: attempt,
                        model: model.to_string(),
                        stage,
                    });
                    return Ok(output);
                }

                Step::Exhausted(error) => {
                    tracing::error!(unit = %label, attempts = attempt, "Generation exhausted: {}", error);
                    return Err(TripKoiError::GenerationExhausted {
                        unit: label,
                        attempts: attempt,
                        last_error: error.to_string(),
                    });
                }
            };
        }
    }

    fn request(&self, text: &str) -> ChatRequest {
        ChatRequest {
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_output_tokens,
            json_output: true,
            ..ChatRequest::new(text).with_system(prompt::SYSTEM_PROMPT)
        }
    }

    /// Shape and coverage checks, then sequencing, then the meal check on
    /// the sequenced day so distance pruning cannot hide a missing meal.
    fn validate(
        &self,
        ctx: &TripContext,
        unit: GenerationUnit,
        value: &Value,
    ) -> Result<Vec<DayPlan>, OutputError> {
        let mut plans = validate::extract_day_plans(value, unit, ctx.days)?;
        let policy = MealPolicy::new(unit, ctx.days);

        for plan in &mut plans {
            validate::fill_missing_reasons(plan);
            plan.stops = route::order_day(std::mem::take(&mut plan.stops), &self.settings.route);
            policy.check(plan)?;
        }
        Ok(plans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::trip::TripRequest;
    use crate::provider::{ChatResponse, TokenUsage};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Replays canned responses in order; the last one repeats.
    struct CannedProvider {
        replies: Vec<String>,
        calls: AtomicU32,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl CannedProvider {
        fn new(replies: Vec<String>) -> Arc<Self> {
            Arc::new(Self {
                replies,
                calls: AtomicU32::new(0),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ModelProvider for CannedProvider {
        fn id(&self) -> &str {
            "google"
        }
        fn name(&self) -> &str {
            "Canned"
        }
        async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, TripKoiError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            self.requests.lock().unwrap().push(request);
            let content = self.replies[n.min(self.replies.len() - 1)].clone();
            Ok(ChatResponse {
                content,
                usage: TokenUsage::default(),
                stop_reason: StopReason::EndTurn,
            })
        }
    }

    fn orchestrator(provider: Arc<CannedProvider>) -> Orchestrator {
        let chain = FallbackChain::pair(provider, ModelRef::new("google", "primary"), None);
        Orchestrator::new(
            chain,
            GenerationSettings {
                backoff: Duration::ZERO,
                ..Default::default()
            },
        )
    }

    fn ctx(end: &str) -> TripContext {
        TripContext::from_request(&TripRequest {
            city: "오사카".into(),
            start_date: "2026-11-01".into(),
            end_date: end.into(),
            people: "1".into(),
            budget: "1,000,000".into(),
        })
        .unwrap()
    }

    fn stop_json(name: &str, category: &str) -> Value {
        serde_json::json!({
            "placeName": name, "category": category,
            "lat": 34.69, "lng": 135.50, "estimatedCost": 10000
        })
    }

    fn day_json(day: u32, meals: &[&str]) -> Value {
        let mut stops: Vec<Value> = meals.iter().map(|m| stop_json(m, m)).collect();
        stops.push(stop_json("오사카성", "sightseeing"));
        serde_json::json!({"day": day, "title": format!("Day {day}"), "stops": stops})
    }

    #[tokio::test]
    async fn test_day_one_of_multi_day_needs_only_dinner() {
        let reply = serde_json::json!({
            "stops": [stop_json("간사이 공항", "airport"), stop_json("쿠시카츠", "dinner")],
            "averageWeather": {"month": 11, "tempHigh": 17, "tempLow": 9, "precipitation": 70,
                               "rainyDays": 6, "season": "늦가을", "tip": "겉옷"}
        });
        let provider = CannedProvider::new(vec![reply.to_string()]);
        let orch = orchestrator(provider.clone());
        let generated = orch.generate_day(&ctx("2026-11-03"), 1).await.unwrap();
        assert_eq!(generated.day_plan.day, 1);
        assert_eq!(generated.average_weather.unwrap().season, "늦가을");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_session_spend_saturates() {
        let mut session = GenerationSession::default();
        assert_eq!(session.spent(), None);
        for day in 1..=2 {
            session.accept(DayPlan {
                day,
                day_total: u64::MAX - 1,
                ..Default::default()
            });
        }
        assert_eq!(session.spent(), Some(u64::MAX));
        assert_eq!(session.day_plans.len(), 2);
    }

    #[tokio::test]
    async fn test_requests_carry_system_prompt_and_json_mode() {
        let reply = serde_json::json!({"stops": day_json(2, &["breakfast", "lunch", "dinner"])["stops"]});
        let provider = CannedProvider::new(vec![reply.to_string()]);
        let orch = orchestrator(provider.clone());
        orch.generate_day(&ctx("2026-11-03"), 2).await.unwrap();

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system.as_deref(), Some(prompt::SYSTEM_PROMPT));
        assert!(requests[0].json_output);
        assert!(requests[0].prompt.contains("**Day 2**"));
    }

    #[tokio::test]
    async fn test_day_out_of_range_rejected() {
        let orch = orchestrator(CannedProvider::new(vec!["{}".into()]));
        let err = orch.generate_day(&ctx("2026-11-03"), 4).await.unwrap_err();
        assert!(matches!(err, TripKoiError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_remaining_needs_five_days() {
        let provider = CannedProvider::new(vec!["{}".into()]);
        let orch = orchestrator(provider.clone());
        let err = orch.generate_remaining(&ctx("2026-11-04")).await.unwrap_err();
        assert!(matches!(err, TripKoiError::InvalidRequest(_)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_progressive_threads_spent_total() {
        let all = ["breakfast", "lunch", "dinner"];
        let replies = vec![
            serde_json::json!({"stops": day_json(1, &["dinner"])["stops"]}).to_string(),
            serde_json::json!({"stops": day_json(2, &all)["stops"]}).to_string(),
            serde_json::json!({"stops": day_json(3, &["breakfast", "lunch"])["stops"]}).to_string(),
        ];
        let provider = CannedProvider::new(replies);
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let orch = orchestrator(provider.clone())
            .with_progress(move |e| sink.lock().unwrap().push(e));

        let itinerary = orch.generate_progressive(&ctx("2026-11-03")).await.unwrap();
        assert_eq!(itinerary.day_plans.len(), 3);
        assert_eq!(
            itinerary.overall_total,
            itinerary.day_plans.iter().map(|d| d.day_total).sum::<u64>()
        );

        let requests = provider.requests.lock().unwrap();
        assert!(!requests[0].prompt.contains("지금까지 생성된 일정"));
        let first_total = itinerary.day_plans[0].day_total;
        assert!(requests[1].prompt.contains(&format!("1인 비용 합계: {first_total}원")));

        let ready = events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::DayReady { .. }))
            .count();
        assert_eq!(ready, 3);
    }

    #[tokio::test]
    async fn test_quoted_strategy_keeps_quotes() {
        let reply = serde_json::json!({
            "dayPlans": [{
                "day": 1,
                "stops": [
                    {"placeName": "이치란", "category": "breakfast", "lat": 34.67, "lng": 135.50,
                     "costReason": "라멘 1,000엔 → 1엔=9.5원 → 9,500원(1인)", "estimatedCost": 1},
                    {"placeName": "오코노미야키", "category": "lunch", "lat": 34.67, "lng": 135.50,
                     "estimatedCost": 12000}
                ]
            }]
        });
        let provider = CannedProvider::new(vec![reply.to_string()]);
        let chain = FallbackChain::pair(provider, ModelRef::new("google", "primary"), None);
        let orch = Orchestrator::new(
            chain,
            GenerationSettings {
                backoff: Duration::ZERO,
                cost_strategy: CostStrategy::Quoted,
                ..Default::default()
            },
        );
        let itinerary = orch.generate_itinerary(&ctx("2026-11-01")).await.unwrap();
        let costs: Vec<u64> = itinerary.day_plans[0]
            .stops
            .iter()
            .map(|s| s.estimated_cost)
            .collect();
        assert_eq!(costs, vec![9_500, 12_000]);
        assert_eq!(itinerary.overall_total, 21_500);
    }

    #[tokio::test]
    async fn test_missing_meal_after_pruning_is_retried() {
        // Lunch is the only stop past max_stops once sorted, so the day
        // loses it and the attempt must fail.
        let reply = serde_json::json!({
            "dayPlans": [{"day": 1, "stops": [
                stop_json("아침", "breakfast"),
                stop_json("점심", "lunch")
            ]}]
        });
        let provider = CannedProvider::new(vec![reply.to_string()]);
        let chain = FallbackChain::pair(provider.clone(), ModelRef::new("google", "primary"), None);
        let orch = Orchestrator::new(
            chain,
            GenerationSettings {
                backoff: Duration::ZERO,
                route: RouteLimits {
                    max_stops: 1,
                    max_travel_km: 25.0,
                },
                ..Default::default()
            },
        );
        let err = orch.generate_itinerary(&ctx("2026-11-01")).await.unwrap_err();
        assert!(matches!(err, TripKoiError::GenerationExhausted { attempts: 3, .. }));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }
}
