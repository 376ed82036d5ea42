//! Session state machine.
//!
//! Every transition is `apply(Command) -> Vec<Effect>`: the machine mutates
//! its own `SessionState` and reports what the outside world has to do
//! (mirror the state to the slot, deliver results). Ticks are ordinary
//! commands, so tests drive the clock synthetically.

use chrono::Utc;
use tracing::{debug, info};

use crate::exercise::Exercise;
use crate::plan::WorkoutPlan;
use crate::results::{ExerciseResult, ResultsSummary};
use crate::session::{Phase, SessionConfig, SessionState};
use crate::timeline::Position;
use crate::timers::TimerKind;
use crate::workout::Section;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Command {
    Start,
    CompleteExercise,
    SkipRest,
    TogglePause,
    StartMainWorkout,
    CompleteMainRound,
    FinishMainWorkoutEarly,
    StartAmrap,
    CompleteAmrapRound,
    FinishAmrapEarly,
    Tick,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// state changed; mirror it to the durable slot
    Persist,
    /// terminal state reached; deliver results and clear the slot
    Completed(ResultsSummary),
}

#[derive(Debug)]
pub struct SessionMachine {
    plan: WorkoutPlan,
    config: SessionConfig,
    state: SessionState,
    outbox: Vec<Effect>,
}

impl SessionMachine {
    pub fn new(plan: WorkoutPlan, config: SessionConfig) -> Self {
        let phase = plan.first_section().map(Phase::from).unwrap_or(Phase::Complete);
        let state = SessionState::fresh(&plan.id, phase, plan.initial_remaining(), &config);
        Self {
            plan,
            config,
            state,
            outbox: Vec::new(),
        }
    }

    /// Rebuild a machine around a previously saved state. Returns `None` when
    /// the state does not fit this plan.
    pub fn resume(plan: WorkoutPlan, config: SessionConfig, state: SessionState) -> Option<Self> {
        if !Self::fits(&plan, &state) {
            return None;
        }
        let mut machine = Self {
            plan,
            config,
            state,
            outbox: Vec::new(),
        };
        // the dwell is not persisted; re-arm it for the exercise on screen
        machine.arm_current();
        Some(machine)
    }

    fn fits(plan: &WorkoutPlan, state: &SessionState) -> bool {
        let len = plan.timeline().len();
        state.workout_id == plan.id
            && state.completed.len() == len
            && state.exercise_remaining.len() == len
            && !state.is_complete
            && state.current_index < len
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn plan(&self) -> &WorkoutPlan {
        &self.plan
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn position(&self) -> Option<Position> {
        self.plan.timeline().resolve(self.state.current_index)
    }

    pub fn current_exercise(&self) -> Option<&Exercise> {
        self.plan.exercise_at(self.state.current_index)
    }

    pub fn next_exercise(&self) -> Option<&Exercise> {
        self.plan.exercise_at(self.state.current_index + 1)
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_complete
    }

    pub fn apply(&mut self, command: Command) -> Vec<Effect> {
        let before = self.state.clone();

        match command {
            Command::Start => self.start_session(),
            Command::CompleteExercise => self.complete_exercise(),
            Command::SkipRest => self.skip_rest_now(),
            Command::TogglePause => self.toggle_pause_now(),
            Command::StartMainWorkout => self.start_main_clock(),
            Command::CompleteMainRound => self.log_main_round(),
            Command::FinishMainWorkoutEarly => self.finish_main_clock(),
            Command::StartAmrap => self.start_amrap_clock(),
            Command::CompleteAmrapRound => self.log_amrap_round(),
            Command::FinishAmrapEarly => self.finish_amrap_clock(),
            Command::Tick => self.tick(),
        }

        let mut effects = Vec::new();
        if !self.state.is_complete && self.state != before {
            effects.push(Effect::Persist);
        }
        effects.append(&mut self.outbox);
        if command != Command::Tick && !effects.is_empty() {
            debug!(%command, phase = %self.state.phase, index = self.state.current_index, "transition");
        }
        effects
    }

    pub fn start(&mut self) -> Vec<Effect> {
        self.apply(Command::Start)
    }

    pub fn complete_current_exercise(&mut self) -> Vec<Effect> {
        self.apply(Command::CompleteExercise)
    }

    pub fn skip_rest(&mut self) -> Vec<Effect> {
        self.apply(Command::SkipRest)
    }

    pub fn toggle_pause(&mut self) -> Vec<Effect> {
        self.apply(Command::TogglePause)
    }

    pub fn start_main_workout(&mut self) -> Vec<Effect> {
        self.apply(Command::StartMainWorkout)
    }

    pub fn complete_main_round(&mut self) -> Vec<Effect> {
        self.apply(Command::CompleteMainRound)
    }

    pub fn finish_main_workout_early(&mut self) -> Vec<Effect> {
        self.apply(Command::FinishMainWorkoutEarly)
    }

    pub fn start_amrap(&mut self) -> Vec<Effect> {
        self.apply(Command::StartAmrap)
    }

    pub fn complete_amrap_round(&mut self) -> Vec<Effect> {
        self.apply(Command::CompleteAmrapRound)
    }

    pub fn finish_amrap_early(&mut self) -> Vec<Effect> {
        self.apply(Command::FinishAmrapEarly)
    }

    pub fn on_tick(&mut self) -> Vec<Effect> {
        self.apply(Command::Tick)
    }

    /// Forces the terminal state, e.g. when the user abandons the session.
    pub fn complete(&mut self) -> Vec<Effect> {
        self.finish();
        std::mem::take(&mut self.outbox)
    }

    /// Routes a running flag through the pause snapshot while paused, so a
    /// resume restores exactly what transitions left behind.
    fn set_running(&mut self, kind: TimerKind, running: bool) {
        match self.state.paused_flags.as_mut() {
            Some(flags) => {
                flags.set(kind, running);
                self.state.timers.get_mut(kind).running = false;
            }
            None => self.state.timers.get_mut(kind).running = running,
        }
    }

    /// Running, or running before the current pause.
    fn clock_active(&self, kind: TimerKind) -> bool {
        self.state.timers.get(kind).running
            || self
                .state
                .paused_flags
                .map(|flags| flags.get(kind))
                .unwrap_or(false)
    }

    /// The total clock only runs for a workout with a duration. A zero
    /// countdown never expires, so leaving it stopped changes nothing else.
    fn start_session(&mut self) {
        if self.state.started || self.state.is_complete {
            return;
        }
        self.state.started = true;
        if self.config.total_seconds > 0 {
            self.set_running(TimerKind::Total, true);
        }
        self.arm_current();
        info!(workout = %self.plan.id, "session started");
    }

    /// Starts whatever drives the current exercise to completion: its
    /// countdown, or the dwell for untimed warmup/cooldown entries.
    fn arm_current(&mut self) {
        self.state.auto_complete_in = None;
        if !self.state.started || self.state.is_complete || self.state.phase == Phase::Rest {
            return;
        }
        let idx = self.state.current_index;
        if self.state.completed.get(idx).copied().unwrap_or(true) {
            return;
        }
        let Some(exercise) = self.plan.exercise_at(idx) else {
            return;
        };
        let countdown = exercise.countdown_seconds();
        let untimed = !exercise.is_timed;
        let section = exercise.section;

        let remaining = self.state.exercise_remaining[idx];
        if countdown.is_some() && remaining > 0 {
            self.state.timers.exercise.remaining = remaining;
            self.set_running(TimerKind::Exercise, true);
        } else if untimed && matches!(section, Section::Warmup | Section::Cooldown) {
            self.state.auto_complete_in = Some(self.config.dwell_seconds);
        }
    }

    fn complete_exercise(&mut self) {
        if self.state.is_complete || self.state.phase == Phase::Rest {
            return;
        }
        let idx = self.state.current_index;
        match self.state.completed.get(idx) {
            Some(false) => {}
            _ => return,
        }

        self.state.completed[idx] = true;
        self.state.auto_complete_in = None;
        self.set_running(TimerKind::Exercise, false);

        let timeline = *self.plan.timeline();
        if timeline.is_last_in_round(idx) && self.state.current_round < timeline.rounds() {
            self.enter_rest();
            return;
        }

        if idx + 1 < timeline.len() {
            self.move_to(idx + 1);
        } else {
            self.finish();
        }
    }

    fn enter_rest(&mut self) {
        if self.config.rest_seconds == 0 {
            self.state.phase = Phase::Rest;
            self.end_rest();
            return;
        }
        self.state.phase = Phase::Rest;
        self.state.timers.rest.remaining = self.config.rest_seconds;
        self.set_running(TimerKind::Rest, true);
        debug!(round = self.state.current_round, "rest started");
    }

    fn end_rest(&mut self) {
        if self.state.phase != Phase::Rest {
            return;
        }
        self.set_running(TimerKind::Rest, false);
        self.state.timers.rest.remaining = 0;

        let timeline = *self.plan.timeline();
        let next_round = self.state.current_round + 1;
        let target = if self.state.current_round < timeline.rounds() {
            timeline.index_for_round_start(Section::Main, next_round)
        } else {
            None
        };

        match target {
            Some(start) => self.move_to(start),
            None => self.move_to(timeline.first_index_after_main()),
        }
    }

    fn skip_rest_now(&mut self) {
        self.end_rest();
    }

    /// Moves forward to `target` (never backwards) and arms the new entry.
    /// Past the end of the timeline the session completes.
    fn move_to(&mut self, target: usize) {
        let len = self.plan.timeline().len();
        if target >= len {
            self.finish();
            return;
        }
        if target <= self.state.current_index && self.state.phase != Phase::Rest {
            return;
        }

        self.set_running(TimerKind::Exercise, false);
        self.state.current_index = target.max(self.state.current_index);

        if let Some(pos) = self.position() {
            self.state.phase = Phase::from(pos.section);
            if let Some(round) = pos.round {
                self.state.current_round = round;
            }
        }
        self.arm_current();
    }

    fn toggle_pause_now(&mut self) {
        if self.state.is_complete {
            return;
        }
        match self.state.paused_flags.take() {
            Some(flags) => {
                self.state.timers.apply_running_flags(flags);
                self.state.is_paused = false;
                debug!("resumed");
            }
            None => {
                self.state.paused_flags = Some(self.state.timers.running_flags());
                self.state.timers.stop_all();
                self.state.is_paused = true;
                debug!("paused");
            }
        }
    }

    fn start_main_clock(&mut self) {
        if self.state.is_complete || self.clock_active(TimerKind::MainCircuit) {
            return;
        }
        self.state.main_circuit_round = 1;
        self.state.main_circuit_elapsed = None;
        self.state.timers.main_circuit.remaining = self.config.main_circuit_seconds;
        self.set_running(TimerKind::MainCircuit, true);
        info!(seconds = self.config.main_circuit_seconds, "main workout clock started");
    }

    fn log_main_round(&mut self) {
        if !self.clock_active(TimerKind::MainCircuit) {
            return;
        }
        self.state.main_circuit_round += 1;
        if self.state.main_circuit_round > self.plan.timeline().rounds() {
            self.finish_main_clock();
        }
    }

    fn finish_main_clock(&mut self) {
        if !self.clock_active(TimerKind::MainCircuit) {
            return;
        }
        let remaining = self.state.timers.main_circuit.remaining;
        self.state.main_circuit_elapsed =
            Some(self.config.main_circuit_seconds.saturating_sub(remaining));
        self.set_running(TimerKind::MainCircuit, false);
        self.stop_rest_clock();
        info!(elapsed = ?self.state.main_circuit_elapsed, "main workout finished");
        let target = self.plan.timeline().first_index_after_main();
        self.move_to(target);
    }

    /// An early finish that cuts a rest short leaves no rest time behind.
    fn stop_rest_clock(&mut self) {
        if self.state.phase == Phase::Rest {
            self.set_running(TimerKind::Rest, false);
            self.state.timers.rest.remaining = 0;
        }
    }

    fn start_amrap_clock(&mut self) {
        if self.state.is_complete || self.clock_active(TimerKind::Amrap) {
            return;
        }
        self.state.amrap_rounds_completed = 0;
        self.state.amrap_elapsed = None;
        self.state.timers.amrap.remaining = self.config.amrap_seconds;
        self.set_running(TimerKind::Amrap, true);
        info!(seconds = self.config.amrap_seconds, "AMRAP clock started");
    }

    fn log_amrap_round(&mut self) {
        if !self.clock_active(TimerKind::Amrap) {
            return;
        }
        self.state.amrap_rounds_completed += 1;
    }

    fn finish_amrap_clock(&mut self) {
        if !self.clock_active(TimerKind::Amrap) {
            return;
        }
        let remaining = self.state.timers.amrap.remaining;
        self.state.amrap_elapsed = Some(self.config.amrap_seconds.saturating_sub(remaining));
        self.set_running(TimerKind::Amrap, false);
        self.stop_rest_clock();
        info!(
            rounds = self.state.amrap_rounds_completed,
            elapsed = ?self.state.amrap_elapsed,
            "AMRAP finished"
        );
        let target = self.plan.timeline().first_index_after(Section::Secondary);
        self.move_to(target);
    }

    fn tick(&mut self) {
        if self.state.is_complete || self.state.is_paused {
            return;
        }
        let idx = self.state.current_index;
        if self.state.started {
            self.state.elapsed_seconds += 1;
        }

        let expired = self.state.timers.tick(false);
        if self.state.timers.exercise.running {
            self.state.exercise_remaining[idx] = self.state.timers.exercise.remaining;
        }

        let dwell_due = match self.state.auto_complete_in {
            Some(left) if left <= 1 => {
                self.state.auto_complete_in = None;
                true
            }
            Some(left) => {
                self.state.auto_complete_in = Some(left - 1);
                false
            }
            None => false,
        };

        if expired.contains(&TimerKind::Total) {
            info!("total time elapsed");
            self.finish();
            return;
        }

        for kind in expired {
            if self.state.is_complete {
                return;
            }
            match kind {
                TimerKind::Exercise if self.state.current_index == idx => self.complete_exercise(),
                TimerKind::Rest => self.end_rest(),
                TimerKind::Amrap => self.finish_amrap_clock(),
                TimerKind::MainCircuit => self.finish_main_clock(),
                _ => {}
            }
        }

        if dwell_due && !self.state.is_complete && self.state.current_index == idx {
            self.complete_exercise();
        }
    }

    fn finish(&mut self) {
        if self.state.is_complete {
            return;
        }
        self.state.is_complete = true;
        self.state.phase = Phase::Complete;
        self.state.timers.stop_all();
        self.state.paused_flags = None;
        self.state.is_paused = false;
        self.state.auto_complete_in = None;

        let summary = self.summary();
        info!(
            workout = %summary.workout_id,
            completed = summary.exercises.len(),
            total = summary.total_exercises,
            elapsed = summary.total_elapsed_seconds,
            "session complete"
        );
        self.outbox.push(Effect::Completed(summary));
    }

    fn summary(&self) -> ResultsSummary {
        let timeline = self.plan.timeline();
        let exercises = self
            .state
            .completed
            .iter()
            .enumerate()
            .filter(|(_, done)| **done)
            .filter_map(|(idx, _)| {
                let pos = timeline.resolve(idx)?;
                let exercise = self.plan.exercise_at(idx)?;
                let planned = exercise.countdown_seconds();
                Some(ExerciseResult {
                    index: idx,
                    section: pos.section,
                    round: pos.round,
                    name: exercise.name.clone(),
                    planned_seconds: planned,
                    spent_seconds: planned
                        .map(|p| p.saturating_sub(self.state.exercise_remaining[idx])),
                })
            })
            .collect();

        ResultsSummary {
            workout_id: self.plan.id.clone(),
            title: self.plan.title.clone(),
            user_id: None,
            exercises,
            total_exercises: timeline.len(),
            total_elapsed_seconds: self.state.elapsed_seconds,
            main_rounds_completed: self.full_main_rounds(),
            main_circuit_rounds: (self.state.main_circuit_round > 0)
                .then(|| self.state.main_circuit_round - 1),
            main_circuit_elapsed: self.state.main_circuit_elapsed,
            amrap_rounds_completed: self.state.amrap_rounds_completed,
            amrap_elapsed: self.state.amrap_elapsed,
            completed_at: Utc::now(),
        }
    }

    /// Main rounds whose every exercise was completed.
    fn full_main_rounds(&self) -> u32 {
        let timeline = self.plan.timeline();
        let per_round = timeline.counts().main;
        (1..=timeline.rounds())
            .filter(|round| {
                timeline
                    .index_for_round_start(Section::Main, *round)
                    .map(|start| self.state.completed[start..start + per_round].iter().all(|d| *d))
                    .unwrap_or(false)
            })
            .count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workout::WorkoutDefinition;
    use assert_matches::assert_matches;

    fn machine(json: &str, config: SessionConfig) -> SessionMachine {
        let def = WorkoutDefinition::from_json(json).unwrap();
        let plan = WorkoutPlan::from_definition(&def, config.rounds).unwrap();
        SessionMachine::new(plan, config)
    }

    fn basic() -> SessionMachine {
        machine(
            r#"{"id": "basic", "title": "Basic", "duration_minutes": 30,
                "warmup": ["Jumping jacks", "Arm circles"],
                "main": ["Push up", "Squat", "Sit up"],
                "cooldown": ["Stretch"]}"#,
            SessionConfig {
                total_seconds: 1800,
                ..Default::default()
            },
        )
    }

    #[test]
    fn initial_state_starts_in_first_nonempty_section() {
        let m = machine(
            r#"{"id": "s", "title": "S", "skill_work": ["Pistol practice"], "main": ["Row"]}"#,
            SessionConfig::default(),
        );
        assert_eq!(m.state().phase, Phase::SkillWork);
        assert_eq!(m.state().current_index, 0);
        assert!(!m.state().is_paused);
    }

    #[test]
    fn start_runs_total_and_arms_dwell_for_untimed_warmup() {
        let mut m = basic();
        let effects = m.start();

        assert_eq!(effects, vec![Effect::Persist]);
        assert!(m.state().timers.total.running);
        assert!(!m.state().timers.exercise.running);
        assert_eq!(m.state().auto_complete_in, Some(2));

        assert!(m.start().is_empty());
    }

    #[test]
    fn dwell_completes_warmup_after_two_ticks() {
        let mut m = basic();
        m.start();
        m.on_tick();
        assert_eq!(m.state().current_index, 0);
        m.on_tick();
        assert_eq!(m.state().current_index, 1);
        assert!(m.state().completed[0]);
        assert_eq!(m.state().auto_complete_in, Some(2));
    }

    #[test]
    fn timed_exercise_completes_when_countdown_expires() {
        let mut m = machine(
            r#"{"id": "t", "title": "T", "main": ["3 seg plank", "Burpee"]}"#,
            SessionConfig {
                rounds: 1,
                ..Default::default()
            },
        );
        m.start();
        assert!(m.state().timers.exercise.running);
        m.on_tick();
        m.on_tick();
        assert_eq!(m.state().exercise_remaining[0], 1);
        m.on_tick();

        assert!(m.state().completed[0]);
        assert_eq!(m.state().current_index, 1);
        assert!(!m.state().timers.exercise.running);
        assert_eq!(m.state().exercise_remaining[0], 0);
    }

    #[test]
    fn completing_during_rest_is_a_no_op() {
        let mut m = basic();
        m.start();
        // two warmup entries plus a full main round
        for _ in 0..5 {
            m.complete_current_exercise();
        }
        assert_eq!(m.state().phase, Phase::Rest);
        assert_eq!(m.state().completed_count(), 5);

        let resting = m.state().clone();
        assert!(m.complete_current_exercise().is_empty());
        assert!(m.complete_current_exercise().is_empty());
        assert_eq!(m.state(), &resting);
    }

    #[test]
    fn index_never_moves_backwards() {
        let mut m = basic();
        m.start();
        let mut last = 0;
        for _ in 0..12 {
            m.complete_current_exercise();
            m.skip_rest();
            assert!(m.state().current_index >= last);
            last = m.state().current_index;
        }
        m.finish_main_workout_early();
        assert!(m.state().current_index >= last);
    }

    #[test]
    fn pause_forces_flags_off_and_resume_restores() {
        let mut m = basic();
        m.start();
        m.start_amrap();
        let flags = m.state().timers.running_flags();

        m.toggle_pause();
        assert!(m.state().is_paused);
        assert!(!m.state().timers.running_flags().any());

        let frozen = m.state().timers;
        m.on_tick();
        assert_eq!(m.state().timers, frozen);

        m.toggle_pause();
        assert!(!m.state().is_paused);
        assert_eq!(m.state().timers.running_flags(), flags);
    }

    #[test]
    fn resume_does_not_resurrect_ended_rest() {
        let mut m = basic();
        m.start();
        for _ in 0..5 {
            m.complete_current_exercise();
        }
        assert_eq!(m.state().phase, Phase::Rest);
        m.toggle_pause();
        m.skip_rest();
        m.toggle_pause();

        assert_eq!(m.state().phase, Phase::Main);
        assert!(!m.state().timers.rest.running);
        assert!(m.state().timers.total.running);
    }

    #[test]
    fn rest_expiry_starts_next_round() {
        let mut m = machine(
            r#"{"id": "r", "title": "R", "main": ["Pull up"]}"#,
            SessionConfig {
                rounds: 2,
                rest_seconds: 3,
                ..Default::default()
            },
        );
        m.start();
        m.complete_current_exercise();
        assert_eq!(m.state().phase, Phase::Rest);
        for _ in 0..3 {
            m.on_tick();
        }
        assert_eq!(m.state().phase, Phase::Main);
        assert_eq!(m.state().current_round, 2);
        assert_eq!(m.state().current_index, 1);
    }

    #[test]
    fn main_round_counter_past_last_round_finishes_early() {
        let mut m = basic();
        m.start();
        m.start_main_workout();
        assert_eq!(m.state().main_circuit_round, 1);
        for _ in 0..4 {
            m.complete_main_round();
        }
        assert!(m.state().timers.main_circuit.running);
        m.complete_main_round();

        assert!(!m.state().timers.main_circuit.running);
        assert_eq!(m.state().main_circuit_round, 6);
        assert_eq!(m.state().main_circuit_elapsed, Some(0));
        assert_eq!(m.state().phase, Phase::Cooldown);
        assert_eq!(m.state().current_index, 17);
    }

    #[test]
    fn finish_amrap_records_elapsed_and_jumps_to_cooldown() {
        let mut m = machine(
            r#"{"id": "a", "title": "A", "main": ["Clean"],
                "secondary": ["AMRAP: 5 burpees, 10 KB swings"],
                "secondary_time_mode": "AMRAP",
                "cooldown": ["Walk"]}"#,
            SessionConfig {
                rounds: 1,
                amrap_seconds: 600,
                ..Default::default()
            },
        );
        m.start();
        m.complete_current_exercise();
        assert_eq!(m.state().phase, Phase::Secondary);
        m.start_amrap();
        for _ in 0..42 {
            m.on_tick();
        }
        m.complete_amrap_round();
        m.complete_amrap_round();
        m.finish_amrap_early();

        assert_eq!(m.state().amrap_elapsed, Some(42));
        assert_eq!(m.state().amrap_rounds_completed, 2);
        assert_eq!(m.state().phase, Phase::Cooldown);
        assert_eq!(m.state().current_index, 2);
    }

    #[test]
    fn for_time_warmup_without_duration_waits_for_user() {
        let mut m = machine(
            r#"{"id": "ft", "title": "FT",
                "warmup": [{"name": "Row 500m", "time_mode": "For Time"}],
                "main": ["Squat"]}"#,
            SessionConfig::default(),
        );
        m.start();
        assert_eq!(m.state().auto_complete_in, None);
        assert!(!m.state().timers.exercise.running);

        for _ in 0..5 {
            m.on_tick();
        }
        assert!(!m.state().completed[0]);
        assert_eq!(m.state().current_index, 0);

        m.complete_current_exercise();
        assert!(m.state().completed[0]);
        assert_eq!(m.state().current_index, 1);
    }

    #[test]
    fn main_clock_expiry_finishes_main_workout() {
        let mut m = machine(
            r#"{"id": "m", "title": "M", "duration_minutes": 30,
                "warmup": ["Jumping jacks", "Arm circles"],
                "main": ["Push up", "Squat", "Sit up"],
                "cooldown": ["Stretch"]}"#,
            SessionConfig {
                total_seconds: 1800,
                main_circuit_seconds: 3,
                ..Default::default()
            },
        );
        m.start();
        m.start_main_workout();
        for _ in 0..3 {
            m.on_tick();
        }

        assert_eq!(m.state().main_circuit_elapsed, Some(3));
        assert!(!m.state().timers.main_circuit.running);
        assert_eq!(m.state().phase, Phase::Cooldown);
        assert_eq!(m.state().current_index, 17);
        assert!(!m.is_complete());
    }

    #[test]
    fn finishing_early_during_rest_clears_rest_clock() {
        let mut m = basic();
        m.start();
        m.start_main_workout();
        for _ in 0..5 {
            m.complete_current_exercise();
        }
        assert_eq!(m.state().phase, Phase::Rest);
        assert!(m.state().timers.rest.remaining > 0);

        m.finish_main_workout_early();
        assert!(!m.state().timers.rest.running);
        assert_eq!(m.state().timers.rest.remaining, 0);
        assert_eq!(m.state().phase, Phase::Cooldown);
    }

    #[test]
    fn amrap_expiry_behaves_like_finish() {
        let mut m = machine(
            r#"{"id": "a", "title": "A", "secondary": ["Row"], "cooldown": ["Walk"]}"#,
            SessionConfig {
                amrap_seconds: 2,
                ..Default::default()
            },
        );
        m.start();
        m.start_amrap();
        m.on_tick();
        m.on_tick();
        assert_eq!(m.state().amrap_elapsed, Some(2));
        assert_eq!(m.state().phase, Phase::Cooldown);
    }

    #[test]
    fn finishing_last_exercise_emits_summary() {
        let mut m = machine(
            r#"{"id": "one", "title": "One", "main": ["Deadlift"]}"#,
            SessionConfig {
                rounds: 1,
                ..Default::default()
            },
        );
        m.start();
        let effects = m.complete_current_exercise();

        assert_eq!(effects.len(), 1);
        assert_matches!(&effects[0], Effect::Completed(summary) => {
            assert_eq!(summary.workout_id, "one");
            assert_eq!(summary.exercises.len(), 1);
            assert_eq!(summary.main_rounds_completed, 1);
            assert_eq!(summary.main_circuit_rounds, None);
        });
        assert!(m.is_complete());
        assert_eq!(m.state().phase, Phase::Complete);
        assert!(!m.state().timers.running_flags().any());
    }

    #[test]
    fn nothing_happens_after_completion() {
        let mut m = machine(
            r#"{"id": "one", "title": "One", "main": ["Deadlift"]}"#,
            SessionConfig {
                rounds: 1,
                ..Default::default()
            },
        );
        m.complete_current_exercise();
        let done = m.state().clone();
        for command in [
            Command::Start,
            Command::TogglePause,
            Command::StartAmrap,
            Command::StartMainWorkout,
            Command::Tick,
        ] {
            assert!(m.apply(command).is_empty());
        }
        assert_eq!(m.state(), &done);
    }

    #[test]
    fn resume_rejects_state_from_other_plan() {
        let m = basic();
        let mut state = m.state().clone();
        state.completed.pop();
        let plan = m.plan().clone();
        assert!(SessionMachine::resume(plan, *m.config(), state).is_none());
    }

    #[test]
    fn resume_rearms_dwell() {
        let mut m = basic();
        m.start();
        let mut saved = m.state().clone();
        saved.auto_complete_in = None;

        let resumed = SessionMachine::resume(m.plan().clone(), *m.config(), saved).unwrap();
        assert_eq!(resumed.state().auto_complete_in, Some(2));
    }
}
