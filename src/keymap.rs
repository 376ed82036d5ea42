use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::machine::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Command(Command),
    Quit,
}

/// Maps a key press to what it means for a session. `started` decides
/// whether space/enter starts the session or completes the exercise.
pub fn action_for(key: KeyEvent, started: bool) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }

    let command = match key.code {
        KeyCode::Esc | KeyCode::Char('q') => return Some(Action::Quit),
        KeyCode::Char(' ') | KeyCode::Enter if started => Command::CompleteExercise,
        KeyCode::Char(' ') | KeyCode::Enter => Command::Start,
        KeyCode::Char('p') => Command::TogglePause,
        KeyCode::Char('s') => Command::SkipRest,
        KeyCode::Char('m') => Command::StartMainWorkout,
        KeyCode::Char('r') => Command::CompleteMainRound,
        KeyCode::Char('f') => Command::FinishMainWorkoutEarly,
        KeyCode::Char('a') => Command::StartAmrap,
        KeyCode::Char('+') => Command::CompleteAmrapRound,
        KeyCode::Char('e') => Command::FinishAmrapEarly,
        _ => return None,
    };
    Some(Action::Command(command))
}

/// Key legend shown under the session screen.
pub const LEGEND: &[(&str, &str)] = &[
    ("space", "start/done"),
    ("p", "pause"),
    ("s", "skip rest"),
    ("m/r/f", "main clock"),
    ("a/+/e", "amrap"),
    ("q", "quit"),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn space_starts_then_completes() {
        assert_eq!(
            action_for(key(KeyCode::Char(' ')), false),
            Some(Action::Command(Command::Start))
        );
        assert_eq!(
            action_for(key(KeyCode::Enter), true),
            Some(Action::Command(Command::CompleteExercise))
        );
    }

    #[test]
    fn clock_keys() {
        let cases = [
            ('m', Command::StartMainWorkout),
            ('r', Command::CompleteMainRound),
            ('f', Command::FinishMainWorkoutEarly),
            ('a', Command::StartAmrap),
            ('+', Command::CompleteAmrapRound),
            ('e', Command::FinishAmrapEarly),
            ('p', Command::TogglePause),
            ('s', Command::SkipRest),
        ];
        for (c, command) in cases {
            assert_eq!(
                action_for(key(KeyCode::Char(c)), true),
                Some(Action::Command(command)),
                "{c}"
            );
        }
    }

    #[test]
    fn quit_keys() {
        assert_eq!(action_for(key(KeyCode::Esc), true), Some(Action::Quit));
        assert_eq!(action_for(key(KeyCode::Char('q')), false), Some(Action::Quit));
        assert_eq!(
            action_for(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), true),
            Some(Action::Quit)
        );
        assert_eq!(action_for(key(KeyCode::Char('x')), true), None);
    }
}
