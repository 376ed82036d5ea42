use tracing::{info, warn};

use crate::machine::{Command, Effect, SessionMachine};
use crate::persistence::{self, SlotStore};
use crate::plan::WorkoutPlan;
use crate::results::{ResultsSink, ResultsSummary};
use crate::session::SessionConfig;

/// Couples a `SessionMachine` with its slot and results sink, carrying out
/// the effects of every command.
pub struct SessionRuntime<S: SlotStore, R: ResultsSink> {
    machine: SessionMachine,
    slot: S,
    sink: R,
    user_id: Option<String>,
    summary: Option<ResultsSummary>,
    resumed: bool,
}

impl<S: SlotStore, R: ResultsSink> SessionRuntime<S, R> {
    /// Restores the saved session for this workout unless `fresh` is set,
    /// in which case any saved slot is dropped first.
    pub fn open(
        plan: WorkoutPlan,
        config: SessionConfig,
        slot: S,
        sink: R,
        user_id: Option<String>,
        fresh: bool,
    ) -> Self {
        if fresh {
            persistence::discard(&slot, &plan.id);
        }

        let saved = if fresh {
            None
        } else {
            persistence::restore(&slot, &plan.id)
        };

        let (machine, resumed) = match saved {
            Some(state) => match SessionMachine::resume(plan.clone(), config, state) {
                Some(machine) => {
                    info!(workout = %plan.id, index = machine.state().current_index, "resumed session");
                    (machine, true)
                }
                None => {
                    warn!(workout = %plan.id, "saved session does not match workout, starting fresh");
                    persistence::discard(&slot, &plan.id);
                    (SessionMachine::new(plan, config), false)
                }
            },
            None => (SessionMachine::new(plan, config), false),
        };

        Self {
            machine,
            slot,
            sink,
            user_id,
            summary: None,
            resumed,
        }
    }

    pub fn dispatch(&mut self, command: Command) {
        let effects = self.machine.apply(command);
        self.run(effects);
    }

    /// Ends the session where it stands, delivering partial results.
    pub fn abandon(&mut self) {
        if self.machine.is_complete() {
            return;
        }
        let effects = self.machine.complete();
        self.run(effects);
    }

    fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Persist => {
                    if let Err(err) = self.slot.save(self.machine.state()) {
                        warn!(%err, "failed to save session slot");
                    }
                }
                Effect::Completed(mut summary) => {
                    summary.user_id = self.user_id.clone();
                    if summary.user_id.is_some() {
                        if let Err(err) = self.sink.record(&summary) {
                            warn!(%err, "failed to record session results");
                        }
                    } else {
                        info!("no user identity; results not recorded");
                    }
                    persistence::discard(&self.slot, &summary.workout_id);
                    self.summary = Some(summary);
                }
            }
        }
    }

    pub fn machine(&self) -> &SessionMachine {
        &self.machine
    }

    pub fn summary(&self) -> Option<&ResultsSummary> {
        self.summary.as_ref()
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    pub fn sink(&self) -> &R {
        &self.sink
    }

    pub fn is_complete(&self) -> bool {
        self.machine.is_complete()
    }

    pub fn was_resumed(&self) -> bool {
        self.resumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use crate::persistence::MemorySlotStore;
    use crate::workout::WorkoutDefinition;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingSink {
        recorded: RefCell<Vec<ResultsSummary>>,
    }

    impl ResultsSink for RecordingSink {
        fn record(&self, summary: &ResultsSummary) -> Result<(), SinkError> {
            self.recorded.borrow_mut().push(summary.clone());
            Ok(())
        }
    }

    fn plan() -> WorkoutPlan {
        let def = WorkoutDefinition::from_json(
            r#"{"id": "rt", "title": "Runtime", "main": ["Squat", "Press"]}"#,
        )
        .unwrap();
        WorkoutPlan::from_definition(&def, 1).unwrap()
    }

    fn config() -> SessionConfig {
        SessionConfig {
            rounds: 1,
            ..Default::default()
        }
    }

    #[test]
    fn transitions_are_mirrored_to_slot() {
        let mut rt = SessionRuntime::open(
            plan(),
            config(),
            MemorySlotStore::new(),
            RecordingSink::default(),
            None,
            false,
        );
        assert!(!rt.slot().contains("rt"));

        rt.dispatch(Command::Start);
        rt.dispatch(Command::CompleteExercise);

        let saved = rt.slot().load("rt").unwrap().unwrap();
        assert_eq!(&saved, rt.machine().state());
    }

    #[test]
    fn completion_records_for_identified_user_and_clears_slot() {
        let mut rt = SessionRuntime::open(
            plan(),
            config(),
            MemorySlotStore::new(),
            RecordingSink::default(),
            Some("ana".into()),
            false,
        );
        rt.dispatch(Command::Start);
        rt.dispatch(Command::CompleteExercise);
        rt.dispatch(Command::CompleteExercise);

        assert!(rt.is_complete());
        assert!(!rt.slot().contains("rt"));
        let recorded = rt.sink().recorded.borrow();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].user_id.as_deref(), Some("ana"));
        assert_eq!(rt.summary().map(|s| s.exercises.len()), Some(2));
    }

    #[test]
    fn abandon_delivers_partial_results() {
        let mut rt = SessionRuntime::open(
            plan(),
            config(),
            MemorySlotStore::new(),
            RecordingSink::default(),
            Some("ana".into()),
            false,
        );
        rt.dispatch(Command::Start);
        rt.dispatch(Command::CompleteExercise);
        rt.abandon();

        let summary = rt.summary().unwrap();
        assert_eq!(summary.exercises.len(), 1);
        assert_eq!(summary.total_exercises, 2);
        assert_eq!(rt.sink().recorded.borrow().len(), 1);
    }

    #[test]
    fn reopening_resumes_saved_session() {
        let slot = MemorySlotStore::new();
        {
            let mut rt =
                SessionRuntime::open(plan(), config(), &slot, RecordingSink::default(), None, false);
            rt.dispatch(Command::Start);
            rt.dispatch(Command::CompleteExercise);
        }

        let rt = SessionRuntime::open(plan(), config(), &slot, RecordingSink::default(), None, false);
        assert!(rt.was_resumed());
        assert_eq!(rt.machine().state().current_index, 1);

        let fresh = SessionRuntime::open(plan(), config(), &slot, RecordingSink::default(), None, true);
        assert!(!fresh.was_resumed());
        assert_eq!(fresh.machine().state().current_index, 0);
        assert!(!slot.contains("rt"));
    }
}
