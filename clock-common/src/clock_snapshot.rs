use crate::{
    bundles::WhiteBlackBundle, drawing_support::MAX_STRINGABLE_SECS, preset::Preset, side::Side,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The countdown for one side
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub remaining: Duration,
    pub is_running: bool,
    /// Set once when `remaining` reaches zero, cleared only by a restart
    pub is_expired: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerPhase {
    Idle,
    Running,
    Expired,
}

impl TimerState {
    pub fn new(total: Duration) -> Self {
        Self {
            remaining: total,
            is_running: false,
            is_expired: false,
        }
    }

    pub fn remaining_millis(&self) -> u64 {
        self.remaining.as_millis().try_into().unwrap_or(u64::MAX)
    }

    pub fn phase(&self) -> TimerPhase {
        if self.is_expired {
            TimerPhase::Expired
        } else if self.is_running {
            TimerPhase::Running
        } else {
            TimerPhase::Idle
        }
    }

    pub fn time_string(&self) -> String {
        secs_to_time_string(self.remaining.as_secs())
    }
}

/// Snapshot of the whole clock, produced after every engine operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockState {
    pub timers: WhiteBlackBundle<TimerState>,
    /// Whose turn it is, and therefore which timer a resume starts
    pub active_side: Side,
    pub reset_confirmation_pending: bool,
    pub preset: Preset,
    /// Incremented by every restart or preset change
    pub game_number: u32,
}

impl ClockState {
    pub fn new(preset: Preset) -> Self {
        Self {
            timers: WhiteBlackBundle::splat(TimerState::new(preset.duration())),
            active_side: Side::White,
            reset_confirmation_pending: false,
            preset,
            game_number: 0,
        }
    }

    pub fn timer(&self, side: Side) -> &TimerState {
        &self.timers[side]
    }

    pub fn running_side(&self) -> Option<Side> {
        self.timers
            .iter()
            .find(|(_, t)| t.is_running)
            .map(|(side, _)| side)
    }

    pub fn expired_side(&self) -> Option<Side> {
        self.timers
            .iter()
            .find(|(_, t)| t.is_expired)
            .map(|(side, _)| side)
    }

    pub fn is_game_over(&self) -> bool {
        self.expired_side().is_some()
    }

    /// Lists the user-visible changes between `self` and `next`.
    ///
    /// A restart or preset change is reported on its own, the timer changes it causes are not.
    pub fn transitions_to(&self, next: &ClockState) -> Vec<ClockTransition> {
        let mut transitions = vec![];

        if next.game_number != self.game_number {
            if next.preset != self.preset {
                transitions.push(ClockTransition::PresetChanged(next.preset));
            }
            transitions.push(ClockTransition::Reset);
            return transitions;
        }

        for (side, timer) in next.timers.iter() {
            if timer.is_expired && !self.timers[side].is_expired {
                transitions.push(ClockTransition::Expired(side));
            }
        }

        match (self.running_side(), next.running_side()) {
            (Some(from), Some(to)) if from != to => {
                transitions.push(ClockTransition::TurnSwitched { from, to })
            }
            (None, Some(side)) => transitions.push(ClockTransition::Started(side)),
            (Some(side), None) if !next.timers[side].is_expired => {
                transitions.push(ClockTransition::Paused(side))
            }
            _ => {}
        }

        match (
            self.reset_confirmation_pending,
            next.reset_confirmation_pending,
        ) {
            (false, true) => transitions.push(ClockTransition::RestartRequested),
            (true, false) => transitions.push(ClockTransition::RestartCancelled),
            _ => {}
        }

        transitions
    }
}

impl Default for ClockState {
    fn default() -> Self {
        Self::new(Preset::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTransition {
    Started(Side),
    Paused(Side),
    TurnSwitched { from: Side, to: Side },
    Expired(Side),
    RestartRequested,
    RestartCancelled,
    PresetChanged(Preset),
    Reset,
}

/// Formats as `MM:SS`, rounding down to the whole second
pub fn secs_to_time_string(secs: u64) -> String {
    let secs = secs.min(MAX_STRINGABLE_SECS);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
