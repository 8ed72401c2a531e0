//! Prompt construction and reply shaping for the two plan operations.
//!
//! The workout and meal operations keep separate contracts: the workout
//! reply is a three-field JSON object, the meal reply is free text that
//! callers split into days with [`split_meal_days`]. Neither operation ever
//! fails outright; upstream problems produce a degraded but well-formed
//! value plus the error in [`Generated::failure`].

use std::sync::{Arc, OnceLock};

use completion_client::{Completion, CompletionError, CompletionRequest};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::profile::UserProfile;

pub const NOT_AVAILABLE: &str = "N/A";
pub const WORKOUT_EMPTY_MESSAGE: &str = "Unable to generate response.";
pub const WORKOUT_FAILURE_MESSAGE: &str = "Something went wrong";
pub const MEAL_EMPTY_MESSAGE: &str = "Meal plan not available.";
pub const MEAL_FAILURE_MESSAGE: &str = "Could not generate meal plan. Please try again later.";

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPlan {
    pub activity: String,
    pub weekly_plan: String,
    pub message: String,
}

impl WorkoutPlan {
    /// Placeholder used when the reply could not be parsed or never arrived.
    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            activity: NOT_AVAILABLE.to_string(),
            weekly_plan: NOT_AVAILABLE.to_string(),
            message: message.into(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.activity == NOT_AVAILABLE && self.weekly_plan == NOT_AVAILABLE
    }
}

/// Meal-plan text plus its per-day split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealPlan {
    pub text: String,
    pub days: Vec<String>,
}

impl MealPlan {
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let days = split_meal_days(&text);
        Self { text, days }
    }
}

/// A value that is always usable, plus the upstream error if it is a stand-in.
#[derive(Debug)]
pub struct Generated<T> {
    pub value: T,
    pub failure: Option<CompletionError>,
}

impl<T> Generated<T> {
    fn ok(value: T) -> Self {
        Self {
            value,
            failure: None,
        }
    }

    fn failed(value: T, err: CompletionError) -> Self {
        Self {
            value,
            failure: Some(err),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

pub fn workout_prompt(profile: &UserProfile) -> String {
    format!(
        r#"You are a motivating fitness assistant. The user's name is {name}, height is {height}, weight is {weight}, goal is {goal}, and limitations are {limitations}.

Provide a personalized fitness plan with:
- A recommended activity tailored to the user's goal and limitations.
- A {days}-day workout plan summary.
- A short motivational message.

Respond in this strict JSON format (no extra text):

{{
  "activity": "personalized activity here",
  "weeklyPlan": "day-by-day workout summary",
  "message": "motivational message"
}}"#,
        name = profile.name,
        height = profile.height,
        weight = profile.weight,
        goal = profile.goal.phrase(),
        limitations = profile.limitations_or_none(),
        days = profile.plan_length,
    )
}

pub fn meal_prompt(profile: &UserProfile) -> String {
    format!(
        r#"You are a helpful and health-conscious AI assistant. The user is named {name} and their goal is to {goal}.
They are {height} inches tall, weigh {weight} lbs, and have this limitation: {limitations}.

Based on this, suggest a healthy 7-day meal plan. Make sure to provide:
- Breakfast
- Lunch
- Dinner

Format it like this:

Day 1 - Breakfast: ..., Lunch: ..., Dinner: ...
Day 2 - Breakfast: ..., Lunch: ..., Dinner: ...
... (repeat for 7 days)

Only return the meal plan text. Do not include anything else."#,
        name = profile.name,
        goal = profile.goal.phrase(),
        height = profile.height,
        weight = profile.weight,
        limitations = profile.limitations_or_none(),
    )
}

// ---------------------------------------------------------------------------
// Reply parsing
// ---------------------------------------------------------------------------

fn code_fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)^```[A-Za-z0-9_-]*\s*\n(.*?)\n?\s*```$").expect("valid regex")
    })
}

fn day_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // "Day N" only counts as a marker when followed by the format's separator,
    // so "leftovers from Day 1 dinner" stays inside its line.
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bday\s*\d+\s*[-:\x{2013}\x{2014}]").expect("valid regex")
    })
}

/// Remove one surrounding markdown code fence, if the whole reply is fenced.
fn strip_code_fence(text: &str) -> &str {
    match code_fence_re().captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => text,
    }
}

/// Flatten a JSON field into display text. Models sometimes return the
/// weekly plan as an array of days or a day -> text object instead of a string.
fn field_text(value: &serde_json::Value) -> Option<String> {
    use serde_json::Value;
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(field_text)
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        Value::Object(map) => Some(
            map.iter()
                .filter_map(|(k, v)| field_text(v).map(|t| format!("{k}: {t}")))
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        other => Some(other.to_string()),
    }
}

/// Parse a workout reply. Policy:
///
/// 1. trim, and strip one surrounding code fence;
/// 2. parse as a JSON object with `activity`, `weeklyPlan` and `message`
///    (non-string fields are flattened to text);
/// 3. otherwise return `N/A` / `N/A` with the raw reply as the message, or
///    a generic message when the reply is empty.
pub fn parse_workout_reply(raw: &str) -> WorkoutPlan {
    let trimmed = raw.trim();
    let body = strip_code_fence(trimmed);

    let parsed = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            let obj = v.as_object()?;
            Some(WorkoutPlan {
                activity: field_text(obj.get("activity")?)?,
                weekly_plan: field_text(obj.get("weeklyPlan")?)?,
                message: field_text(obj.get("message")?)?,
            })
        });

    match parsed {
        Some(plan) => plan,
        None => {
            tracing::warn!(raw = %raw, "workout reply is not the expected JSON object");
            if raw.is_empty() {
                WorkoutPlan::degraded(WORKOUT_EMPTY_MESSAGE)
            } else {
                WorkoutPlan::degraded(raw)
            }
        }
    }
}

/// Trimmed meal reply, or the "not available" sentinel when empty.
pub fn shape_meal_reply(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => MEAL_EMPTY_MESSAGE.to_string(),
    }
}

/// Split meal-plan text into per-day entries.
///
/// Every non-empty line is a segment, and a line holding several inline
/// "Day N -" (or "Day N:") markers is split before each of them. A bare
/// mention of another day inside a meal description is not a marker. Segments are trimmed and
/// empty ones dropped. Nothing is rejected: text with no markers and no
/// newlines comes back as a single segment.
pub fn split_meal_days(text: &str) -> Vec<String> {
    let mut days = Vec::new();
    for line in text.lines() {
        let mut cuts: Vec<usize> = day_marker_re()
            .find_iter(line)
            .map(|m| m.start())
            .filter(|&start| start > 0)
            .collect();
        cuts.push(line.len());

        let mut from = 0;
        for cut in cuts {
            let segment = line[from..cut].trim();
            if !segment.is_empty() {
                days.push(segment.to_string());
            }
            from = cut;
        }
    }
    days
}

// ---------------------------------------------------------------------------
// PlanGenerator
// ---------------------------------------------------------------------------

/// Builds prompts, calls the completion service and shapes the replies.
#[derive(Clone)]
pub struct PlanGenerator {
    client: Arc<dyn Completion>,
}

impl PlanGenerator {
    pub fn new(client: Arc<dyn Completion>) -> Self {
        Self { client }
    }

    pub async fn workout(&self, profile: &UserProfile) -> Generated<WorkoutPlan> {
        let request = CompletionRequest::json(workout_prompt(profile));
        match self.client.complete(request).await {
            Ok(reply) => Generated::ok(parse_workout_reply(reply.text())),
            Err(e) => {
                tracing::error!(error = %e, "workout completion failed");
                Generated::failed(WorkoutPlan::degraded(WORKOUT_FAILURE_MESSAGE), e)
            }
        }
    }

    pub async fn meal_plan(&self, profile: &UserProfile) -> Generated<String> {
        let request = CompletionRequest::text(meal_prompt(profile));
        match self.client.complete(request).await {
            Ok(reply) => Generated::ok(shape_meal_reply(reply.content.as_deref())),
            Err(e) => {
                tracing::error!(error = %e, "meal plan completion failed");
                Generated::failed(MEAL_FAILURE_MESSAGE.to_string(), e)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Goal;
    use completion_client::{CompletionFuture, CompletionResponse, ResponseShape};
    use std::sync::Mutex;

    /// Replays one canned outcome and records the requests it saw.
    struct Canned {
        reply: std::result::Result<Option<String>, u16>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl Canned {
        fn text(s: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(Some(s.to_string())),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn null() -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(None),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn status(code: u16) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(code),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl Completion for Canned {
        fn complete(&self, request: CompletionRequest) -> CompletionFuture<'_> {
            self.seen.lock().unwrap().push(request);
            let out = match &self.reply {
                Ok(content) => Ok(CompletionResponse {
                    content: content.clone(),
                    ..Default::default()
                }),
                Err(code) => Err(CompletionError::Status {
                    status: *code,
                    body: "upstream down".into(),
                }),
            };
            Box::pin(async move { out })
        }
    }

    fn sam() -> UserProfile {
        UserProfile {
            name: "Sam".into(),
            height: 70.0,
            weight: 180.0,
            goal: Goal::LoseWeight,
            limitations: Some(String::new()),
            plan_length: 7,
        }
    }

    #[test]
    fn workout_prompt_embeds_profile() {
        let mut p = sam();
        p.goal = Goal::IncreaseStamina;
        p.plan_length = 30;
        let prompt = workout_prompt(&p);
        assert!(prompt.contains("name is Sam"));
        assert!(prompt.contains("height is 70,"));
        assert!(prompt.contains("weight is 180,"));
        assert!(prompt.contains("goal is increase stamina"));
        assert!(prompt.contains("limitations are none."));
        assert!(prompt.contains("A 30-day workout plan summary"));
        assert!(prompt.contains(r#""weeklyPlan": "day-by-day workout summary""#));
    }

    #[test]
    fn meal_prompt_requests_day_format() {
        let mut p = sam();
        p.limitations = Some("lactose intolerant".into());
        let prompt = meal_prompt(&p);
        assert!(prompt.starts_with("You are a helpful and health-conscious AI assistant."));
        assert!(prompt.contains("their goal is to lose weight"));
        assert!(prompt.contains("70 inches tall, weigh 180 lbs"));
        assert!(prompt.contains("limitation: lactose intolerant"));
        assert!(prompt.contains("Day 1 - Breakfast: ..., Lunch: ..., Dinner: ..."));
    }

    #[test]
    fn parses_well_formed_reply() {
        let plan = parse_workout_reply(
            r#"{"activity":"Brisk walking","weeklyPlan":"Mon: walk 30m","message":"You got this!"}"#,
        );
        assert_eq!(plan.activity, "Brisk walking");
        assert_eq!(plan.weekly_plan, "Mon: walk 30m");
        assert_eq!(plan.message, "You got this!");
        assert!(!plan.is_degraded());
    }

    #[test]
    fn strips_code_fence() {
        let raw = "```json\n{\"activity\":\"Swim\",\"weeklyPlan\":\"Daily laps\",\"message\":\"Go\"}\n```";
        let plan = parse_workout_reply(raw);
        assert_eq!(plan.activity, "Swim");
    }

    #[test]
    fn flattens_structured_weekly_plan() {
        let raw = r#"{"activity":"Cycling","weeklyPlan":["Day 1: 20m","Day 2: rest"],"message":"Keep going"}"#;
        let plan = parse_workout_reply(raw);
        assert_eq!(plan.weekly_plan, "Day 1: 20m\nDay 2: rest");
    }

    #[test]
    fn invalid_json_falls_back_to_raw_text() {
        let raw = "Sure! Try yoga three times a week.";
        let plan = parse_workout_reply(raw);
        assert_eq!(plan.activity, "N/A");
        assert_eq!(plan.weekly_plan, "N/A");
        assert_eq!(plan.message, raw);
        assert!(plan.is_degraded());
    }

    #[test]
    fn missing_field_falls_back() {
        let raw = r#"{"activity":"Run"}"#;
        let plan = parse_workout_reply(raw);
        assert!(plan.is_degraded());
        assert_eq!(plan.message, raw);
    }

    #[test]
    fn empty_reply_uses_generic_message() {
        let plan = parse_workout_reply("");
        assert!(plan.is_degraded());
        assert_eq!(plan.message, WORKOUT_EMPTY_MESSAGE);
    }

    #[test]
    fn meal_reply_is_trimmed_or_sentinel() {
        assert_eq!(shape_meal_reply(Some("  Day 1 - x \n")), "Day 1 - x");
        assert_eq!(shape_meal_reply(Some("   ")), MEAL_EMPTY_MESSAGE);
        assert_eq!(shape_meal_reply(None), MEAL_EMPTY_MESSAGE);
    }

    #[test]
    fn split_on_newlines_drops_blank_lines() {
        let text = "Day 1 - Breakfast: oats, Lunch: salad, Dinner: fish\n\n  \nDay 2 - Breakfast: eggs, Lunch: soup, Dinner: tofu\n";
        let days = split_meal_days(text);
        assert_eq!(days.len(), 2);
        assert!(days[0].starts_with("Day 1"));
        assert!(days[1].starts_with("Day 2"));
    }

    #[test]
    fn split_on_inline_markers() {
        let text = "Day 1 - Breakfast: oats Day 2 - Breakfast: eggs day 3 - Breakfast: toast";
        let days = split_meal_days(text);
        assert_eq!(
            days,
            vec![
                "Day 1 - Breakfast: oats",
                "Day 2 - Breakfast: eggs",
                "day 3 - Breakfast: toast"
            ]
        );
    }

    #[test]
    fn day_mentioned_inside_a_meal_is_not_a_marker() {
        let text = "Day 1 - Breakfast: oats, Lunch: salad, Dinner: stew\nDay 2 - Breakfast: eggs, Lunch: leftovers from Day 1 dinner, Dinner: fish";
        assert_eq!(
            split_meal_days(text),
            vec![
                "Day 1 - Breakfast: oats, Lunch: salad, Dinner: stew",
                "Day 2 - Breakfast: eggs, Lunch: leftovers from Day 1 dinner, Dinner: fish",
            ]
        );
    }

    #[test]
    fn inline_colon_markers_split() {
        let days = split_meal_days("Day 1: oats and fruit Day 2: eggs, then Day 1 soup again");
        assert_eq!(
            days,
            vec!["Day 1: oats and fruit", "Day 2: eggs, then Day 1 soup again"]
        );
    }

    #[test]
    fn split_without_markers_is_one_segment() {
        assert_eq!(
            split_meal_days("Eat more vegetables."),
            vec!["Eat more vegetables."]
        );
        assert!(split_meal_days("   \n\n").is_empty());
    }

    #[test]
    fn split_ignores_words_containing_day() {
        let days = split_meal_days("Monday 1 cup of tea, Day 2 - rest");
        assert_eq!(days, vec!["Monday 1 cup of tea,", "Day 2 - rest"]);
    }

    #[test]
    fn meal_plan_from_text_keeps_raw_and_days() {
        let plan = MealPlan::from_text("Day 1 - a\nDay 2 - b");
        assert_eq!(plan.text, "Day 1 - a\nDay 2 - b");
        assert_eq!(plan.days.len(), 2);
    }

    #[tokio::test]
    async fn generator_workout_success_requests_json() {
        let client = Canned::text(
            r#"{"activity":"Walking","weeklyPlan":"Walk daily","message":"Nice work, Sam"}"#,
        );
        let generator = PlanGenerator::new(client.clone());
        let out = generator.workout(&sam()).await;
        assert!(!out.is_failure());
        assert!(!out.value.activity.is_empty());
        assert!(!out.value.weekly_plan.is_empty());
        assert!(!out.value.message.is_empty());

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].shape, ResponseShape::Json);
    }

    #[tokio::test]
    async fn generator_workout_invalid_json_is_not_a_failure() {
        let generator = PlanGenerator::new(Canned::text("not json"));
        let out = generator.workout(&sam()).await;
        assert!(!out.is_failure());
        assert_eq!(out.value, WorkoutPlan::degraded("not json"));
    }

    #[tokio::test]
    async fn generator_workout_null_content_uses_generic_message() {
        let generator = PlanGenerator::new(Canned::null());
        let out = generator.workout(&sam()).await;
        assert_eq!(out.value.message, WORKOUT_EMPTY_MESSAGE);
    }

    #[tokio::test]
    async fn generator_workout_upstream_failure_is_degraded() {
        let generator = PlanGenerator::new(Canned::status(503));
        let out = generator.workout(&sam()).await;
        assert!(out.is_failure());
        assert_eq!(out.value, WorkoutPlan::degraded(WORKOUT_FAILURE_MESSAGE));
    }

    #[tokio::test]
    async fn generator_meal_requests_text_and_trims() {
        let client = Canned::text("\nDay 1 - Breakfast: oats\n");
        let generator = PlanGenerator::new(client.clone());
        let out = generator.meal_plan(&sam()).await;
        assert_eq!(out.value, "Day 1 - Breakfast: oats");
        assert_eq!(client.seen.lock().unwrap()[0].shape, ResponseShape::Text);
    }

    #[tokio::test]
    async fn generator_meal_upstream_failure_is_sentinel() {
        let generator = PlanGenerator::new(Canned::status(500));
        let out = generator.meal_plan(&sam()).await;
        assert!(out.is_failure());
        assert_eq!(out.value, MEAL_FAILURE_MESSAGE);
    }
}
