use crate::error::{MissionError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Height bounds (inches) accepted by the profile form.
pub const HEIGHT_RANGE: std::ops::RangeInclusive<f64> = 54.0..=90.0;
/// Weight bounds (lbs) accepted by the profile form.
pub const WEIGHT_RANGE: std::ops::RangeInclusive<f64> = 85.0..=400.0;

pub const DEFAULT_PLAN_LENGTH: u32 = 7;

// ---------------------------------------------------------------------------
// Goal
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    LoseWeight,
    GainMuscle,
    IncreaseStamina,
    #[serde(alias = "move_with_limitations")]
    MoveBetter,
}

impl Goal {
    pub fn as_str(self) -> &'static str {
        match self {
            Goal::LoseWeight => "lose_weight",
            Goal::GainMuscle => "gain_muscle",
            Goal::IncreaseStamina => "increase_stamina",
            Goal::MoveBetter => "move_better",
        }
    }

    /// The identifier with separators turned into spaces, as embedded in prompts.
    pub fn phrase(self) -> String {
        self.as_str().replace('_', " ")
    }

    pub fn label(self) -> &'static str {
        match self {
            Goal::LoseWeight => "Lose Weight",
            Goal::GainMuscle => "Gain Muscle",
            Goal::IncreaseStamina => "Increase Stamina",
            Goal::MoveBetter => "Move with Limitations",
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Goal {
    type Err = MissionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lose_weight" => Ok(Goal::LoseWeight),
            "gain_muscle" => Ok(Goal::GainMuscle),
            "increase_stamina" => Ok(Goal::IncreaseStamina),
            "move_better" | "move_with_limitations" => Ok(Goal::MoveBetter),
            other => Err(MissionError::InvalidGoal(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// UserProfile
// ---------------------------------------------------------------------------

/// Biometrics and goal for one planning session. Never persisted.
///
/// Form submissions carry numbers as strings, so `height`, `weight` and
/// `planLength` accept either JSON numbers or numeric strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub name: String,
    #[serde(deserialize_with = "number_or_string")]
    pub height: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub weight: f64,
    pub goal: Goal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limitations: Option<String>,
    #[serde(
        default = "default_plan_length",
        deserialize_with = "plan_length_number_or_string"
    )]
    pub plan_length: u32,
}

fn default_plan_length() -> u32 {
    DEFAULT_PLAN_LENGTH
}

impl UserProfile {
    /// Limitations text for prompts: "none" when absent or blank.
    pub fn limitations_or_none(&self) -> &str {
        match self.limitations.as_deref().map(str::trim) {
            Some(l) if !l.is_empty() => l,
            _ => "none",
        }
    }

    /// Form-level sanity bounds on height and weight.
    pub fn validate(&self) -> Result<()> {
        if !HEIGHT_RANGE.contains(&self.height) {
            return Err(MissionError::InvalidProfile(format!(
                "height {} is outside {}-{} inches",
                self.height,
                HEIGHT_RANGE.start(),
                HEIGHT_RANGE.end()
            )));
        }
        if !WEIGHT_RANGE.contains(&self.weight) {
            return Err(MissionError::InvalidProfile(format!(
                "weight {} is outside {}-{} lbs; please consult a physician before following generated advice",
                self.weight,
                WEIGHT_RANGE.start(),
                WEIGHT_RANGE.end()
            )));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

fn number_or_string<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let n = match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => n,
        NumberOrString::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("expected a number, got '{s}'")))?,
    };
    if !n.is_finite() {
        return Err(serde::de::Error::custom("expected a finite number"));
    }
    Ok(n)
}

fn plan_length_number_or_string<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let n = number_or_string(deserializer)?;
    if n < 1.0 || n.fract() != 0.0 || n > f64::from(u32::MAX) {
        return Err(serde::de::Error::custom(format!(
            "planLength must be a positive whole number of days, got {n}"
        )));
    }
    Ok(n as u32)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
