use serde::{Deserialize, Serialize};

use crate::workout::Section;

pub const DEFAULT_ROUNDS: u32 = 5;

/// Number of exercises per section, before the main section is repeated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionCounts {
    pub warmup: usize,
    pub skill_work: usize,
    pub main: usize,
    pub secondary: usize,
    pub cooldown: usize,
}

impl SectionCounts {
    pub fn get(&self, section: Section) -> usize {
        match section {
            Section::Warmup => self.warmup,
            Section::SkillWork => self.skill_work,
            Section::Main => self.main,
            Section::Secondary => self.secondary,
            Section::Cooldown => self.cooldown,
        }
    }
}

/// Where a global timeline index lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub section: Section,
    /// 1-based, only for the main section
    pub round: Option<u32>,
    pub exercise_in_round: usize,
}

/// Flat ordering: warmup, skill work, main x rounds, secondary, cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeline {
    counts: SectionCounts,
    rounds: u32,
}

impl Timeline {
    pub fn build(counts: SectionCounts, rounds: u32) -> Self {
        Self { counts, rounds }
    }

    pub fn counts(&self) -> SectionCounts {
        self.counts
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Length a section contributes to the timeline.
    pub fn span(&self, section: Section) -> usize {
        match section {
            Section::Main => self.counts.main * self.rounds as usize,
            other => self.counts.get(other),
        }
    }

    pub fn len(&self) -> usize {
        Section::ALL.iter().map(|s| self.span(*s)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index where a section begins, whether or not it has entries.
    fn offset(&self, section: Section) -> usize {
        Section::ALL
            .iter()
            .take_while(|s| **s != section)
            .map(|s| self.span(*s))
            .sum()
    }

    /// First index of a nonempty section.
    pub fn section_start(&self, section: Section) -> Option<usize> {
        if self.span(section) == 0 {
            None
        } else {
            Some(self.offset(section))
        }
    }

    /// First index past the given section. Equals `len()` when nothing follows.
    pub fn first_index_after(&self, section: Section) -> usize {
        self.offset(section) + self.span(section)
    }

    pub fn first_index_after_main(&self) -> usize {
        self.first_index_after(Section::Main)
    }

    /// First index of main round `round` (1-based). Other sections ignore
    /// `round` and return their start.
    pub fn index_for_round_start(&self, section: Section, round: u32) -> Option<usize> {
        match section {
            Section::Main => {
                if self.counts.main == 0 || round == 0 || round > self.rounds {
                    return None;
                }
                Some(self.offset(Section::Main) + (round as usize - 1) * self.counts.main)
            }
            other => self.section_start(other),
        }
    }

    pub fn resolve(&self, global: usize) -> Option<Position> {
        let mut start = 0;
        for section in Section::ALL {
            let span = self.span(section);
            if global < start + span {
                let local = global - start;
                return Some(match section {
                    Section::Main => Position {
                        section,
                        round: Some((local / self.counts.main) as u32 + 1),
                        exercise_in_round: local % self.counts.main,
                    },
                    _ => Position {
                        section,
                        round: None,
                        exercise_in_round: local,
                    },
                });
            }
            start += span;
        }
        None
    }

    pub fn is_last_in_round(&self, global: usize) -> bool {
        matches!(
            self.resolve(global),
            Some(Position { section: Section::Main, exercise_in_round, .. })
                if exercise_in_round + 1 == self.counts.main
        )
    }
}
