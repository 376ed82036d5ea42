use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::WorkoutError;

/// The five exercise collections of a workout, in timeline order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Section {
    Warmup,
    SkillWork,
    Main,
    Secondary,
    Cooldown,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Warmup,
        Section::SkillWork,
        Section::Main,
        Section::Secondary,
        Section::Cooldown,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Section::Warmup => "Warmup",
            Section::SkillWork => "Skill work",
            Section::Main => "Main",
            Section::Secondary => "Secondary",
            Section::Cooldown => "Cooldown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeMode {
    #[serde(rename = "For Time", alias = "for_time")]
    ForTime,
    #[serde(rename = "AMRAP", alias = "amrap")]
    Amrap,
    #[serde(rename = "EMOM", alias = "emom")]
    Emom,
    #[serde(other)]
    Other,
}

/// Repetitions as stored: a count or a free-form prescription ("max", "8-12").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reps {
    Count(u32),
    Text(String),
}

impl std::fmt::Display for Reps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reps::Count(n) => write!(f, "{n}"),
            Reps::Text(text) => write!(f, "{text}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawExerciseRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
    #[serde(default)]
    pub sets: Option<u32>,
    #[serde(default)]
    pub reps: Option<Reps>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub scaling_note: Option<String>,
    #[serde(default, alias = "image_ref")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub time_mode: Option<TimeMode>,
}

/// One stored exercise entry. Definitions mix free-text lines with records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawExercise {
    PlainText(String),
    Structured(RawExerciseRecord),
}

/// A workout of the day as supplied by the definition source. Read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutDefinition {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub date: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default, alias = "type")]
    pub discipline: Option<String>,
    #[serde(default)]
    pub warmup: Vec<RawExercise>,
    #[serde(default)]
    pub skill_work: Vec<RawExercise>,
    #[serde(default)]
    pub main: Vec<RawExercise>,
    #[serde(default)]
    pub secondary: Vec<RawExercise>,
    #[serde(default)]
    pub cooldown: Vec<RawExercise>,
    #[serde(default)]
    pub secondary_time_mode: Option<TimeMode>,
    #[serde(default)]
    pub secondary_minutes: Option<u32>,
    #[serde(default)]
    pub main_time_cap_minutes: Option<u32>,
    #[serde(default)]
    pub rounds: Option<u32>,
}

impl WorkoutDefinition {
    pub fn from_json(json: &str) -> Result<Self, WorkoutError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, WorkoutError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn raw_section(&self, section: Section) -> &[RawExercise] {
        match section {
            Section::Warmup => &self.warmup,
            Section::SkillWork => &self.skill_work,
            Section::Main => &self.main,
            Section::Secondary => &self.secondary,
            Section::Cooldown => &self.cooldown,
        }
    }

    pub fn is_empty(&self) -> bool {
        Section::ALL
            .iter()
            .all(|section| self.raw_section(*section).is_empty())
    }

    pub fn planned_total_seconds(&self) -> u32 {
        self.duration_minutes.saturating_mul(60)
    }

    /// Nonempty sections with their sizes, e.g. `Warmup 3 / Main 4x5`.
    pub fn outline(&self) -> String {
        Section::ALL
            .iter()
            .filter(|section| !self.raw_section(**section).is_empty())
            .map(|section| {
                let count = self.raw_section(*section).len();
                match (section, self.rounds) {
                    (Section::Main, Some(rounds)) => format!("{} {count}x{rounds}", section.label()),
                    _ => format!("{} {count}", section.label()),
                }
            })
            .join(" / ")
    }
}
