// src/core/prompt.rs — Builds the Korean generation prompts for each unit

use super::trip::TripContext;
use super::validate::{GenerationUnit, MealPolicy, REMAINING_FROM};

/// Standing instructions sent with every generation call, whatever the unit.
pub const SYSTEM_PROMPT: &str = "너는 전문 여행 플래너다. 요청된 일정을 JSON으로만 답한다.\n\n\
# JSON 형식\n\n\
- 유효한 JSON 객체 하나만 출력한다. 설명, 코드블록, 마크다운 금지.\n\
- estimatedCost, lat, lng는 숫자 타입 (문자열 금지).\n\
- lat과 lng는 별도 속성: \"lat\": 13.7563, \"lng\": 100.5018\n\
- 마지막 요소 뒤 쉼표 금지.\n";

/// Full trip in one call: `dayPlans` for every day plus `averageWeather`.
pub fn build_full_prompt(ctx: &TripContext) -> String {
    let mut prompt = String::with_capacity(6144);

    prompt.push_str(&format!(
        "\"{}\" {}일 여행({} ~ {}, {}명)의 전체 일정을 JSON으로 만들어라.\n\n",
        ctx.city, ctx.days, ctx.start_date, ctx.end_date, ctx.people
    ));

    append_budget_section(&mut prompt, ctx, None);
    append_time_order_section(&mut prompt);

    prompt.push_str("# 출력 스키마\n\n");
    prompt.push_str(&format!(
        "{{\"city\":\"{}\",\"days\":{},\"dayPlans\":[{{\"day\":1,\"title\":\"...\",\"dayReason\":\"...\",\"stops\":[STOP, ...]}}, ... {{\"day\":{},...}}],",
        ctx.city, ctx.days, ctx.days
    ));
    append_weather_schema(&mut prompt, ctx);
    prompt.push_str("}\n\n");
    append_stop_schema(&mut prompt, ctx);

    prompt.push_str("# 규칙\n\n");
    prompt.push_str(&format!(
        "- dayPlans 배열 길이는 정확히 {}이고 day는 1부터 {}까지 빠짐없이 한 번씩.\n",
        ctx.days, ctx.days
    ));
    append_meal_rules(&mut prompt, ctx, GenerationUnit::Full);
    prompt.push_str("- Day 1과 마지막 날에는 공항(airport)과 이동(transfer) 동선을 포함.\n");
    prompt.push_str("- 매일 shopping, activity, nightlife 중 1곳 이상.\n\n");

    append_weather_section(&mut prompt, ctx);
    prompt
}

/// One day of the trip. Day 1 also asks for `averageWeather`.
///
/// `spent_so_far` is the per-person KRW total of the days already generated.
pub fn build_day_prompt(ctx: &TripContext, day: u32, spent_so_far: Option<u64>) -> String {
    let mut prompt = String::with_capacity(4096);

    prompt.push_str(&format!(
        "\"{}\" {}일 여행 중 **Day {}** ({}) 일정만 JSON 한 줄로 만들어라.\n\n",
        ctx.city,
        ctx.days,
        day,
        ctx.date_of(day)
    ));

    append_budget_section(&mut prompt, ctx, spent_so_far);
    append_time_order_section(&mut prompt);

    prompt.push_str("# 출력 스키마\n\n");
    prompt.push_str(&format!(
        "{{\"day\":{day},\"title\":\"호기심을 자극하는 타이틀\",\"dayReason\":\"...\",\"stops\":[STOP, ...]"
    ));
    if day == 1 {
        prompt.push(',');
        append_weather_schema(&mut prompt, ctx);
    }
    prompt.push_str("}\n\n");
    append_stop_schema(&mut prompt, ctx);

    prompt.push_str("# 규칙\n\n");
    append_meal_rules(&mut prompt, ctx, GenerationUnit::Day(day));
    if day == 1 && ctx.days > 1 {
        prompt.push_str("- 도착일이다: airport → transfer 후 저녁 일정으로 마무리.\n");
    } else if ctx.is_final_day(day) {
        prompt.push_str("- 마지막 날이다: 점심 이후 시내 → 공항 이동(transfer) → 공항 체크인(airport).\n");
    } else {
        prompt.push_str("- 관광/쇼핑/액티비티 5~8곳 포함.\n");
    }
    prompt.push('\n');

    if day == 1 {
        append_weather_section(&mut prompt, ctx);
    }
    prompt
}

/// Days 5..N in a single call.
pub fn build_remaining_prompt(ctx: &TripContext, spent_so_far: Option<u64>) -> String {
    let mut prompt = String::with_capacity(6144);
    let count = ctx.days.saturating_sub(REMAINING_FROM - 1);

    prompt.push_str(&format!(
        "\"{}\" {}일 여행 중 **Day {}부터 Day {}까지** (총 {}일) 일정을 JSON으로 만들어라.\n\n",
        ctx.city, ctx.days, REMAINING_FROM, ctx.days, count
    ));

    append_budget_section(&mut prompt, ctx, spent_so_far);
    append_time_order_section(&mut prompt);

    prompt.push_str("# 출력 스키마\n\n");
    prompt.push_str(&format!(
        "{{\"dayPlans\":[{{\"day\":{},\"title\":\"...\",\"dayReason\":\"...\",\"stops\":[STOP, ...]}}, ... {{\"day\":{},...}}]}}\n\n",
        REMAINING_FROM, ctx.days
    ));
    append_stop_schema(&mut prompt, ctx);

    prompt.push_str("# 규칙\n\n");
    prompt.push_str(&format!(
        "- dayPlans에는 Day {}부터 Day {}까지 {}개가 빠짐없이 들어가야 한다.\n",
        REMAINING_FROM, ctx.days, count
    ));
    append_meal_rules(&mut prompt, ctx, GenerationUnit::Remaining);
    prompt.push_str("- 마지막 날은 점심 이후 공항 이동(transfer)과 체크인(airport)으로 마무리.\n");
    prompt.push_str("- 매일 8~11개 stop.\n\n");

    prompt
}

// ─── Section builders ───────────────────────────────────────────────────────

fn append_budget_section(prompt: &mut String, ctx: &TripContext, spent_so_far: Option<u64>) {
    let c = &ctx.currency;
    prompt.push_str("# 예산\n\n");
    prompt.push_str(&format!(
        "- 1인 기준 총 예산: {}원, 하루 평균 약 {}원.\n",
        ctx.budget_per_person, ctx.daily_budget
    ));
    if let Some(spent) = spent_so_far {
        let left = ctx.budget_per_person.saturating_sub(spent);
        prompt.push_str(&format!(
            "- 지금까지 생성된 일정의 1인 비용 합계: {spent}원 (남은 예산 약 {left}원).\n"
        ));
    }
    prompt.push_str(&format!(
        "- 현지 통화: {}({}, {}), 환율: 1{}={}원.\n\n",
        c.name, c.code, c.symbol, c.name, c.krw_rate
    ));
}

fn append_time_order_section(prompt: &mut String) {
    prompt.push_str("# 시간순 정렬\n\n");
    prompt.push_str(
        "stops는 실제 동선처럼 시간 순서대로 나열한다. timeSlot은 \
         morning → late_morning → afternoon → tea → evening → night 순으로만 증가한다.\n\
         - morning: breakfast, airport\n\
         - late_morning: transfer, sightseeing, shopping\n\
         - afternoon: lunch\n\
         - tea: activity, shopping, cafe, snack\n\
         - evening: dinner, sightseeing\n\
         - night: nightlife, shopping, activity\n\n",
    );
}

fn append_stop_schema(prompt: &mut String, ctx: &TripContext) {
    let c = &ctx.currency;
    let example_krw = c.to_krw(2_000.0);
    prompt.push_str("STOP 스키마 (모든 필드 필수):\n");
    prompt.push_str(&format!(
        "{{\"placeName\":\"정확한 한국어 표기\",\"summary\":\"50자 이내\",\"reason\":\"120자 이내 방문 이유\",\
         \"costReason\":\"입장료 1,500{name} + 가이드 500{name} = 2,000{name} → 1{name}={rate}원 → {krw}원(1인)\",\
         \"estimatedCost\":{krw},\"lat\":35.0,\"lng\":135.0,\
         \"category\":\"breakfast|lunch|dinner|snack|cafe|sightseeing|shopping|activity|nightlife|airport|transfer\",\
         \"timeSlot\":\"morning|late_morning|afternoon|tea|evening|night\",\"tags\":[\"must-visit\"]}}\n\n",
        name = c.name,
        rate = c.krw_rate,
        krw = example_krw
    ));
}

fn append_meal_rules(prompt: &mut String, ctx: &TripContext, unit: GenerationUnit) {
    let policy = MealPolicy::new(unit, ctx.days);
    for day in unit.expected_days(ctx.days) {
        let meals: Vec<&str> = policy.required(day).iter().map(|m| m.as_str()).collect();
        prompt.push_str(&format!(
            "- Day {day}: category가 {} 인 식사를 각각 최소 1개 반드시 포함.\n",
            meals.join(", ")
        ));
    }
}

fn append_weather_schema(prompt: &mut String, ctx: &TripContext) {
    prompt.push_str(&format!(
        "\"averageWeather\":{{\"month\":{},\"tempHigh\":22,\"tempLow\":16,\"precipitation\":110,\"rainyDays\":9,\"season\":\"초가을\",\"tip\":\"...\"}}",
        ctx.travel_month
    ));
}

fn append_weather_section(prompt: &mut String, ctx: &TripContext) {
    prompt.push_str("# 평균 날씨\n\n");
    prompt.push_str(&format!(
        "averageWeather에는 \"{}\"의 {}월 평년 기후를 넣는다: month, tempHigh/tempLow(°C 정수), \
         precipitation(mm 정수), rainyDays(일 정수), season(예: \"초가을\"), tip(옷차림 등 여행 팁).\n\n",
        ctx.city, ctx.travel_month
    ));
}
