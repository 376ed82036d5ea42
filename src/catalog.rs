use chrono::{Datelike, NaiveDate};
use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;

use crate::error::WorkoutError;
use crate::workout::WorkoutDefinition;

static WOD_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/wods");

/// Workout definitions compiled into the binary, sorted by id.
#[derive(Debug, Clone)]
pub struct Catalog {
    workouts: Vec<WorkoutDefinition>,
}

impl Catalog {
    pub fn bundled() -> Result<Self, WorkoutError> {
        let mut workouts = WOD_DIR
            .files()
            .filter(|file| file.path().extension().is_some_and(|ext| ext == "json"))
            .map(|file| {
                let json = file.contents_utf8().unwrap_or_default();
                WorkoutDefinition::from_json(json)
            })
            .collect::<Result<Vec<_>, _>>()?;
        workouts.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(Self { workouts })
    }

    pub fn from_definitions(mut workouts: Vec<WorkoutDefinition>) -> Self {
        workouts.sort_by(|a, b| a.id.cmp(&b.id));
        Self { workouts }
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkoutDefinition> {
        self.workouts.iter()
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }

    pub fn find(&self, id: &str) -> Result<&WorkoutDefinition, WorkoutError> {
        self.workouts
            .iter()
            .find(|wod| wod.id == id)
            .ok_or_else(|| WorkoutError::NotFound(id.to_string()))
    }

    /// The workout scheduled for `date`, else one picked by day of year.
    pub fn for_date(&self, date: NaiveDate) -> Option<&WorkoutDefinition> {
        self.workouts
            .iter()
            .find(|wod| wod.date == Some(date))
            .or_else(|| {
                if self.workouts.is_empty() {
                    return None;
                }
                let slot = date.ordinal0() as usize % self.workouts.len();
                self.workouts.get(slot)
            })
    }

    pub fn random(&self) -> Option<&WorkoutDefinition> {
        self.workouts.choose(&mut rand::thread_rng())
    }
}
