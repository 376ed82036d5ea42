use serde::{Deserialize, Serialize};

use crate::workout::{RawExercise, RawExerciseRecord, Reps, Section, TimeMode};

pub const UNKNOWN_EXERCISE_NAME: &str = "Ejercicio desconocido";

const NOTES_DELIMITER: &str = " - ";

/// Canonical exercise record, built once at session load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    /// position within its un-repeated section
    pub id: usize,
    pub name: String,
    pub is_timed: bool,
    pub duration_seconds: Option<u32>,
    pub sets: Option<u32>,
    pub reps: Option<Reps>,
    pub notes: Option<String>,
    pub scaling_note: Option<String>,
    pub image_ref: Option<String>,
    pub section: Section,
}

impl Exercise {
    /// Seconds for the per-exercise countdown. Only exercises with a
    /// duration run the countdown; everything else completes by user action.
    pub fn countdown_seconds(&self) -> Option<u32> {
        if self.is_timed {
            self.duration_seconds
        } else {
            None
        }
    }

    pub fn prescription(&self) -> Option<String> {
        match (self.sets, &self.reps) {
            (Some(sets), Some(reps)) if sets > 1 => Some(format!("{sets} x {reps}")),
            (_, Some(reps)) => Some(format!("{reps} reps")),
            (Some(sets), None) if sets > 1 => Some(format!("{sets} sets")),
            _ => None,
        }
    }
}

pub fn normalize(raw: &RawExercise, position: usize, section: Section) -> Exercise {
    match raw {
        RawExercise::PlainText(text) => normalize_text(text, position, section),
        RawExercise::Structured(record) => normalize_record(record, position, section),
    }
}

/// Normalizes every entry of a section, assigning positional ids.
pub fn normalize_section(raw: &[RawExercise], section: Section) -> Vec<Exercise> {
    raw.iter()
        .enumerate()
        .map(|(position, entry)| normalize(entry, position, section))
        .collect()
}

fn normalize_text(text: &str, position: usize, section: Section) -> Exercise {
    let text = text.trim();
    let (name, notes) = match text.split_once(NOTES_DELIMITER) {
        Some((name, notes)) => (name.trim(), Some(notes.trim().to_string())),
        None => (text, None),
    };

    let duration_seconds = parse_leading_duration(text);
    let reps = parse_trailing_reps(text);
    let is_timed = duration_seconds.is_some();

    Exercise {
        id: position,
        name: name.to_string(),
        is_timed,
        duration_seconds,
        sets: if is_timed { None } else { Some(1) },
        reps,
        notes: notes.filter(|n| !n.is_empty()),
        scaling_note: None,
        image_ref: None,
        section,
    }
}

fn normalize_record(record: &RawExerciseRecord, position: usize, section: Section) -> Exercise {
    Exercise {
        id: position,
        name: record
            .name
            .clone()
            .unwrap_or_else(|| UNKNOWN_EXERCISE_NAME.to_string()),
        is_timed: record.duration_seconds.is_some()
            || record.time_mode == Some(TimeMode::ForTime),
        duration_seconds: record.duration_seconds,
        sets: record.sets,
        reps: record.reps.clone(),
        notes: record.notes.clone(),
        scaling_note: record.scaling_note.clone(),
        image_ref: record.image_url.clone(),
        section,
    }
}

/// `<int> min` or `<int> seg` at the start of the text, unit optionally
/// attached to the number.
fn parse_leading_duration(text: &str) -> Option<u32> {
    let mut tokens = text.split_whitespace();
    let first = tokens.next()?;

    let digits_end = first
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(first.len());
    if digits_end == 0 {
        return None;
    }
    let value: u32 = first[..digits_end].parse().ok()?;

    let unit = if digits_end < first.len() {
        first[digits_end..].to_string()
    } else {
        tokens.next()?.to_string()
    };
    let unit = unit.to_lowercase();

    if unit.starts_with("min") {
        value.checked_mul(60)
    } else if unit.starts_with("seg") {
        Some(value)
    } else {
        None
    }
}

/// `N reps` at the end of the text.
fn parse_trailing_reps(text: &str) -> Option<Reps> {
    let mut tokens = text.split_whitespace().rev();
    let unit = tokens.next()?.to_lowercase();
    if unit != "reps" && unit != "rep" {
        return None;
    }
    let count: u32 = tokens.next()?.parse().ok()?;
    Some(Reps::Count(count))
}
