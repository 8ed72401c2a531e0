//! Planning session state machine.
//!
//! ```text
//! AwaitingProfile ──ProfileSubmitted──▶ AwaitingWorkoutResult
//!        ▲                                   │ WorkoutReceived
//!        │                                   ▼
//!      Reset (from any state)          AwaitingMealChoice
//!                                       │ yes          │ no
//!                                       ▼              ▼
//!                              AwaitingMealResult ──▶ Done
//!                                      MealReceived
//! ```
//!
//! Rendering-agnostic: the CLI drives it today, any other front end can
//! feed it the same events. Nothing here survives the process.

use serde::Serialize;
use std::fmt;

use crate::error::{MissionError, Result};
use crate::plan::{MealPlan, WorkoutPlan};
use crate::profile::UserProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    AwaitingProfile,
    AwaitingWorkoutResult,
    AwaitingMealChoice,
    AwaitingMealResult,
    Done,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::AwaitingProfile => "awaiting_profile",
            SessionState::AwaitingWorkoutResult => "awaiting_workout_result",
            SessionState::AwaitingMealChoice => "awaiting_meal_choice",
            SessionState::AwaitingMealResult => "awaiting_meal_result",
            SessionState::Done => "done",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    ProfileSubmitted(UserProfile),
    WorkoutReceived(WorkoutPlan),
    MealChoice { wants_meal_plan: bool },
    MealReceived(String),
    Reset,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::ProfileSubmitted(_) => "profile_submitted",
            SessionEvent::WorkoutReceived(_) => "workout_received",
            SessionEvent::MealChoice { .. } => "meal_choice",
            SessionEvent::MealReceived(_) => "meal_received",
            SessionEvent::Reset => "reset",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanSession {
    state: SessionState,
    profile: Option<UserProfile>,
    workout: Option<WorkoutPlan>,
    meal_plan: Option<MealPlan>,
}

impl Default for PlanSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::AwaitingProfile,
            profile: None,
            workout: None,
            meal_plan: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn workout(&self) -> Option<&WorkoutPlan> {
        self.workout.as_ref()
    }

    pub fn meal_plan(&self) -> Option<&MealPlan> {
        self.meal_plan.as_ref()
    }

    /// Apply one event. On error the session is left exactly as it was.
    pub fn apply(&mut self, event: SessionEvent) -> Result<SessionState> {
        use SessionEvent as E;
        use SessionState as S;

        let next = match (self.state, event) {
            (_, E::Reset) => {
                *self = Self::new();
                return Ok(self.state);
            }
            (S::AwaitingProfile, E::ProfileSubmitted(profile)) => {
                profile.validate()?;
                self.profile = Some(profile);
                S::AwaitingWorkoutResult
            }
            (S::AwaitingWorkoutResult, E::WorkoutReceived(plan)) => {
                self.workout = Some(plan);
                S::AwaitingMealChoice
            }
            (S::AwaitingMealChoice, E::MealChoice { wants_meal_plan }) => {
                if wants_meal_plan {
                    S::AwaitingMealResult
                } else {
                    S::Done
                }
            }
            (S::AwaitingMealResult, E::MealReceived(text)) => {
                self.meal_plan = Some(MealPlan::from_text(text));
                S::Done
            }
            (state, event) => {
                return Err(MissionError::InvalidTransition {
                    state: state.to_string(),
                    event: event.name().to_string(),
                })
            }
        };

        tracing::debug!(from = %self.state, to = %next, "planning session transition");
        self.state = next;
        Ok(next)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
