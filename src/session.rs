use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::timers::{RunningFlags, TimerBank};
use crate::workout::{Section, WorkoutDefinition};

pub const DEFAULT_REST_SECONDS: u32 = 90;
pub const DEFAULT_DWELL_SECONDS: u32 = 2;

/// Knobs fixed for the lifetime of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub rounds: u32,
    pub rest_seconds: u32,
    /// delay before untimed warmup/cooldown exercises complete themselves
    pub dwell_seconds: u32,
    pub total_seconds: u32,
    pub main_circuit_seconds: u32,
    pub amrap_seconds: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rounds: crate::timeline::DEFAULT_ROUNDS,
            rest_seconds: DEFAULT_REST_SECONDS,
            dwell_seconds: DEFAULT_DWELL_SECONDS,
            total_seconds: 0,
            main_circuit_seconds: 20 * 60,
            amrap_seconds: 10 * 60,
        }
    }
}

impl SessionConfig {
    /// Definition values win over the user's config where both exist.
    pub fn for_workout(def: &WorkoutDefinition, cfg: &Config) -> Self {
        Self {
            rounds: def.rounds.unwrap_or(cfg.rounds).max(1),
            rest_seconds: cfg.rest_seconds,
            dwell_seconds: cfg.auto_complete_dwell_secs,
            total_seconds: def.planned_total_seconds(),
            main_circuit_seconds: def
                .main_time_cap_minutes
                .unwrap_or(cfg.main_circuit_minutes)
                .saturating_mul(60),
            amrap_seconds: def
                .secondary_minutes
                .unwrap_or(cfg.amrap_minutes)
                .saturating_mul(60),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    Warmup,
    SkillWork,
    Main,
    Secondary,
    Cooldown,
    Rest,
    Complete,
}

impl From<Section> for Phase {
    fn from(section: Section) -> Self {
        match section {
            Section::Warmup => Phase::Warmup,
            Section::SkillWork => Phase::SkillWork,
            Section::Main => Phase::Main,
            Section::Secondary => Phase::Secondary,
            Section::Cooldown => Phase::Cooldown,
        }
    }
}

/// Everything that changes while a session runs. Owned by the machine;
/// the slot store only reads it out and writes fresh copies back in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub workout_id: String,
    pub phase: Phase,
    pub current_index: usize,
    pub current_round: u32,
    pub completed: Vec<bool>,
    pub exercise_remaining: Vec<u32>,
    pub timers: TimerBank,
    pub elapsed_seconds: u32,
    pub amrap_rounds_completed: u32,
    /// 0 until the main-circuit clock is started
    pub main_circuit_round: u32,
    pub main_circuit_elapsed: Option<u32>,
    pub amrap_elapsed: Option<u32>,
    pub is_paused: bool,
    pub paused_flags: Option<RunningFlags>,
    pub started: bool,
    pub is_complete: bool,
    #[serde(skip)]
    pub auto_complete_in: Option<u32>,
}

impl SessionState {
    pub fn fresh(
        workout_id: &str,
        phase: Phase,
        exercise_remaining: Vec<u32>,
        config: &SessionConfig,
    ) -> Self {
        let mut timers = TimerBank::default();
        timers.total.remaining = config.total_seconds;
        timers.rest.remaining = config.rest_seconds;
        timers.amrap.remaining = config.amrap_seconds;
        timers.main_circuit.remaining = config.main_circuit_seconds;

        Self {
            workout_id: workout_id.to_string(),
            phase,
            current_index: 0,
            current_round: 1,
            completed: vec![false; exercise_remaining.len()],
            exercise_remaining,
            timers,
            elapsed_seconds: 0,
            amrap_rounds_completed: 0,
            main_circuit_round: 0,
            main_circuit_elapsed: None,
            amrap_elapsed: None,
            is_paused: false,
            paused_flags: None,
            started: false,
            is_complete: false,
            auto_complete_in: None,
        }
    }

    pub fn completed_count(&self) -> usize {
        self.completed.iter().filter(|done| **done).count()
    }

    pub fn progress(&self) -> f64 {
        if self.completed.is_empty() {
            return 0.0;
        }
        self.completed_count() as f64 / self.completed.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_starts_at_origin() {
        let config = SessionConfig {
            total_seconds: 1800,
            ..Default::default()
        };
        let state = SessionState::fresh("wod", Phase::Warmup, vec![30, 0, 0], &config);

        assert_eq!(state.current_index, 0);
        assert_eq!(state.current_round, 1);
        assert_eq!(state.completed, vec![false; 3]);
        assert_eq!(state.timers.total.remaining, 1800);
        assert_eq!(state.timers.rest.remaining, 90);
        assert!(!state.timers.running_flags().any());
        assert!(!state.is_paused);
        assert!(!state.started);
        assert_eq!(state.progress(), 0.0);
    }

    #[test]
    fn config_prefers_definition_values() {
        let def = WorkoutDefinition::from_json(
            r#"{"id": "w", "title": "W", "duration_minutes": 45, "rounds": 3,
                "secondary_minutes": 12, "main_time_cap_minutes": 18}"#,
        )
        .unwrap();
        let cfg = Config::default();
        let sc = SessionConfig::for_workout(&def, &cfg);

        assert_eq!(sc.rounds, 3);
        assert_eq!(sc.total_seconds, 2700);
        assert_eq!(sc.amrap_seconds, 720);
        assert_eq!(sc.main_circuit_seconds, 1080);
        assert_eq!(sc.rest_seconds, cfg.rest_seconds);
    }

    #[test]
    fn zero_rounds_clamped_to_one() {
        let def =
            WorkoutDefinition::from_json(r#"{"id": "w", "title": "W", "rounds": 0}"#).unwrap();
        assert_eq!(SessionConfig::for_workout(&def, &Config::default()).rounds, 1);
    }

    #[test]
    fn phase_display_matches_storage_names() {
        assert_eq!(Phase::SkillWork.to_string(), "skill_work");
        assert_eq!(Phase::from(Section::Cooldown), Phase::Cooldown);
    }
}
