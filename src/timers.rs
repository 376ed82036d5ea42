use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TimerKind {
    Total,
    Exercise,
    Rest,
    Amrap,
    MainCircuit,
}

impl TimerKind {
    pub const ALL: [TimerKind; 5] = [
        TimerKind::Total,
        TimerKind::Exercise,
        TimerKind::Rest,
        TimerKind::Amrap,
        TimerKind::MainCircuit,
    ];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    pub remaining: u32,
    pub running: bool,
}

impl Countdown {
    pub fn new(remaining: u32) -> Self {
        Self {
            remaining,
            running: false,
        }
    }

    pub fn start(&mut self, seconds: u32) {
        self.remaining = seconds;
        self.running = true;
    }

    /// Returns true on the tick that brings the countdown to zero.
    fn tick(&mut self) -> bool {
        if !self.running || self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.remaining == 0
    }
}

/// Running flags of every timer, captured while paused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningFlags {
    pub total: bool,
    pub exercise: bool,
    pub rest: bool,
    pub amrap: bool,
    pub main_circuit: bool,
}

impl RunningFlags {
    pub fn get(&self, kind: TimerKind) -> bool {
        match kind {
            TimerKind::Total => self.total,
            TimerKind::Exercise => self.exercise,
            TimerKind::Rest => self.rest,
            TimerKind::Amrap => self.amrap,
            TimerKind::MainCircuit => self.main_circuit,
        }
    }

    pub fn set(&mut self, kind: TimerKind, running: bool) {
        match kind {
            TimerKind::Total => self.total = running,
            TimerKind::Exercise => self.exercise = running,
            TimerKind::Rest => self.rest = running,
            TimerKind::Amrap => self.amrap = running,
            TimerKind::MainCircuit => self.main_circuit = running,
        }
    }

    pub fn any(&self) -> bool {
        TimerKind::ALL.iter().any(|kind| self.get(*kind))
    }
}

/// Passive multiplexed countdowns driven by one tick per second. Expiry is
/// reported to the caller; the bank never acts on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerBank {
    pub total: Countdown,
    pub exercise: Countdown,
    pub rest: Countdown,
    pub amrap: Countdown,
    pub main_circuit: Countdown,
}

impl TimerBank {
    pub fn get(&self, kind: TimerKind) -> &Countdown {
        match kind {
            TimerKind::Total => &self.total,
            TimerKind::Exercise => &self.exercise,
            TimerKind::Rest => &self.rest,
            TimerKind::Amrap => &self.amrap,
            TimerKind::MainCircuit => &self.main_circuit,
        }
    }

    pub fn get_mut(&mut self, kind: TimerKind) -> &mut Countdown {
        match kind {
            TimerKind::Total => &mut self.total,
            TimerKind::Exercise => &mut self.exercise,
            TimerKind::Rest => &mut self.rest,
            TimerKind::Amrap => &mut self.amrap,
            TimerKind::MainCircuit => &mut self.main_circuit,
        }
    }

    pub fn running_flags(&self) -> RunningFlags {
        let mut flags = RunningFlags::default();
        for kind in TimerKind::ALL {
            flags.set(kind, self.get(kind).running);
        }
        flags
    }

    pub fn apply_running_flags(&mut self, flags: RunningFlags) {
        for kind in TimerKind::ALL {
            self.get_mut(kind).running = flags.get(kind);
        }
    }

    pub fn stop_all(&mut self) {
        self.apply_running_flags(RunningFlags::default());
    }

    /// Advances every running timer by one second unless paused and returns
    /// the timers that expired on this tick, in `TimerKind::ALL` order.
    pub fn tick(&mut self, paused: bool) -> Vec<TimerKind> {
        if paused {
            return Vec::new();
        }
        TimerKind::ALL
            .into_iter()
            .filter(|kind| self.get_mut(*kind).tick())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_running_timers_decrement() {
        let mut bank = TimerBank::default();
        bank.total.start(10);
        bank.rest = Countdown::new(90);

        let expired = bank.tick(false);

        assert!(expired.is_empty());
        assert_eq!(bank.total.remaining, 9);
        assert_eq!(bank.rest.remaining, 90);
    }

    #[test]
    fn paused_tick_changes_nothing() {
        let mut bank = TimerBank::default();
        bank.total.start(10);
        bank.exercise.start(3);
        let before = bank;

        assert!(bank.tick(true).is_empty());
        assert_eq!(bank, before);
    }

    #[test]
    fn expiry_reported_once() {
        let mut bank = TimerBank::default();
        bank.exercise.start(2);
        bank.total.start(5);

        assert!(bank.tick(false).is_empty());
        assert_eq!(bank.tick(false), vec![TimerKind::Exercise]);
        assert!(bank.tick(false).is_empty());
        assert_eq!(bank.exercise.remaining, 0);
        assert_eq!(bank.total.remaining, 2);
    }

    #[test]
    fn simultaneous_expiry_in_fixed_order() {
        let mut bank = TimerBank::default();
        bank.main_circuit.start(1);
        bank.total.start(1);

        assert_eq!(
            bank.tick(false),
            vec![TimerKind::Total, TimerKind::MainCircuit]
        );
    }

    #[test]
    fn running_flags_roundtrip() {
        let mut bank = TimerBank::default();
        bank.total.start(100);
        bank.amrap.start(60);
        let flags = bank.running_flags();
        assert!(flags.total && flags.amrap && !flags.rest);

        bank.stop_all();
        assert!(!bank.running_flags().any());

        bank.apply_running_flags(flags);
        assert_eq!(bank.running_flags(), flags);
    }
}
