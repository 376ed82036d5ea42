use crate::error::WorkoutError;
use crate::exercise::{normalize_section, Exercise};
use crate::timeline::{SectionCounts, Timeline};
use crate::workout::{Section, TimeMode, WorkoutDefinition};

/// A definition after normalization: immutable exercises per section plus
/// the timeline derived from them.
#[derive(Debug, Clone)]
pub struct WorkoutPlan {
    pub id: String,
    pub title: String,
    pub difficulty: Option<String>,
    pub discipline: Option<String>,
    pub secondary_time_mode: Option<TimeMode>,
    warmup: Vec<Exercise>,
    skill_work: Vec<Exercise>,
    main: Vec<Exercise>,
    secondary: Vec<Exercise>,
    cooldown: Vec<Exercise>,
    timeline: Timeline,
}

impl WorkoutPlan {
    pub fn from_definition(def: &WorkoutDefinition, rounds: u32) -> Result<Self, WorkoutError> {
        if def.is_empty() {
            return Err(WorkoutError::Empty(def.id.clone()));
        }

        let warmup = normalize_section(&def.warmup, Section::Warmup);
        let skill_work = normalize_section(&def.skill_work, Section::SkillWork);
        let main = normalize_section(&def.main, Section::Main);
        let secondary = normalize_section(&def.secondary, Section::Secondary);
        let cooldown = normalize_section(&def.cooldown, Section::Cooldown);

        let counts = SectionCounts {
            warmup: warmup.len(),
            skill_work: skill_work.len(),
            main: main.len(),
            secondary: secondary.len(),
            cooldown: cooldown.len(),
        };

        Ok(Self {
            id: def.id.clone(),
            title: def.title.clone(),
            difficulty: def.difficulty.clone(),
            discipline: def.discipline.clone(),
            secondary_time_mode: def.secondary_time_mode,
            warmup,
            skill_work,
            main,
            secondary,
            cooldown,
            timeline: Timeline::build(counts, rounds.max(1)),
        })
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn exercises(&self, section: Section) -> &[Exercise] {
        match section {
            Section::Warmup => &self.warmup,
            Section::SkillWork => &self.skill_work,
            Section::Main => &self.main,
            Section::Secondary => &self.secondary,
            Section::Cooldown => &self.cooldown,
        }
    }

    pub fn exercise_at(&self, global: usize) -> Option<&Exercise> {
        let pos = self.timeline.resolve(global)?;
        self.exercises(pos.section).get(pos.exercise_in_round)
    }

    /// Countdown value for every timeline position (0 for untimed entries).
    pub fn initial_remaining(&self) -> Vec<u32> {
        (0..self.timeline.len())
            .map(|idx| {
                self.exercise_at(idx)
                    .and_then(Exercise::countdown_seconds)
                    .unwrap_or(0)
            })
            .collect()
    }

    pub fn first_section(&self) -> Option<Section> {
        self.timeline.resolve(0).map(|pos| pos.section)
    }

    pub fn is_amrap(&self) -> bool {
        self.secondary_time_mode == Some(TimeMode::Amrap)
    }
}
