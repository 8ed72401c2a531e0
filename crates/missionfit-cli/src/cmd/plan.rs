use crate::output::print_json;
use anyhow::Context;
use clap::{Args, ValueEnum};
use completion_client::OpenAiClient;
use missionfit_core::config::Config;
use missionfit_core::plan::{PlanGenerator, WorkoutPlan};
use missionfit_core::profile::{Goal, UserProfile, DEFAULT_PLAN_LENGTH};
use missionfit_core::session::{PlanSession, SessionEvent};
use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

#[derive(Args)]
pub struct PlanArgs {
    #[arg(long)]
    pub name: String,
    /// Height in inches (54-90)
    #[arg(long)]
    pub height: f64,
    /// Weight in lbs (85-400)
    #[arg(long)]
    pub weight: f64,
    /// lose_weight, gain_muscle, increase_stamina or move_better
    #[arg(long)]
    pub goal: Goal,
    /// Injuries or other limitations to plan around
    #[arg(long)]
    pub limitations: Option<String>,
    /// Plan length in days
    #[arg(long, default_value_t = DEFAULT_PLAN_LENGTH, value_parser = clap::value_parser!(u32).range(1..))]
    pub days: u32,
    /// Also generate a meal plan (asks on stdin when omitted)
    #[arg(long, value_enum)]
    pub meal: Option<MealAnswer>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum MealAnswer {
    Yes,
    No,
}

impl PlanArgs {
    fn profile(&self) -> UserProfile {
        UserProfile {
            name: self.name.clone(),
            height: self.height,
            weight: self.weight,
            goal: self.goal,
            limitations: self.limitations.clone(),
            plan_length: self.days,
        }
    }
}

pub fn run(root: &Path, args: PlanArgs, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let client = OpenAiClient::new(config.completion.client_settings())
        .context("failed to build completion client")?;
    let planner = PlanGenerator::new(Arc::new(client));

    let profile = args.profile();
    let mut session = PlanSession::new();
    session.apply(SessionEvent::ProfileSubmitted(profile.clone()))?;

    let rt = tokio::runtime::Runtime::new()?;

    let workout = rt.block_on(planner.workout(&profile));
    session.apply(SessionEvent::WorkoutReceived(workout.value))?;
    if let Some(err) = workout.failure {
        render(&session, json)?;
        return Err(anyhow::Error::new(err).context("workout plan generation failed"));
    }
    if session.workout().is_some_and(WorkoutPlan::is_degraded) {
        eprintln!("note: the reply was not a structured plan; it is shown as the message");
    }

    let wants_meal_plan = match args.meal {
        Some(answer) => matches!(answer, MealAnswer::Yes),
        None => ask_for_meal_plan()?,
    };
    session.apply(SessionEvent::MealChoice { wants_meal_plan })?;

    if wants_meal_plan {
        let meal = rt.block_on(planner.meal_plan(&profile));
        session.apply(SessionEvent::MealReceived(meal.value))?;
        if let Some(err) = meal.failure {
            render(&session, json)?;
            return Err(anyhow::Error::new(err).context("meal plan generation failed"));
        }
    }

    render(&session, json)
}

fn ask_for_meal_plan() -> anyhow::Result<bool> {
    eprint!("Would you like a 7-day meal plan too? [y/N] ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(is_yes(&line))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn render(session: &PlanSession, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&serde_json::json!({
            "state": session.state(),
            "profile": session.profile(),
            "workout": session.workout(),
            "mealPlan": session.meal_plan(),
        }));
    }

    if let Some(profile) = session.profile() {
        let who = if profile.name.trim().is_empty() {
            "you"
        } else {
            profile.name.as_str()
        };
        println!(
            "Plan for {who}: {}, {} days",
            profile.goal.label(),
            profile.plan_length
        );
    }
    if let Some(workout) = session.workout() {
        println!("  Activity:     {}", workout.activity);
        println!("  Weekly plan:  {}", workout.weekly_plan);
        println!("  Message:      {}", workout.message);
    }
    if let Some(meal) = session.meal_plan() {
        println!();
        println!("Meal plan:");
        for day in &meal.days {
            println!("  {day}");
        }
    }
    Ok(())
}
