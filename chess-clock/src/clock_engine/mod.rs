use clock_common::{clock_snapshot::ClockState, preset::Preset, side::Side};
use log::*;
use tokio::{sync::watch, time::Duration};

/// The two-sided countdown state machine.
///
/// The engine never measures time itself, it only reacts to [`ClockEngine::on_tick`]. Whenever
/// the side that should be ticking changes, the new value is published on the running channel
/// so that a [`crate::ticker::Ticker`] can follow along.
#[derive(Debug)]
pub struct ClockEngine {
    state: ClockState,
    running_tx: watch::Sender<Option<Side>>,
    running_rx: watch::Receiver<Option<Side>>,
    flag_tx: watch::Sender<Option<Side>>,
    flag_rx: watch::Receiver<Option<Side>>,
}

impl ClockEngine {
    pub fn new(preset: Preset) -> Self {
        let (running_tx, running_rx) = watch::channel(None);
        let (flag_tx, flag_rx) = watch::channel(None);
        Self {
            state: ClockState::new(preset),
            running_tx,
            running_rx,
            flag_tx,
            flag_rx,
        }
    }

    pub fn snapshot(&self) -> ClockState {
        self.state
    }

    /// Which side the ticker should be driving, `None` when both clocks are stopped
    pub fn get_running_rx(&self) -> watch::Receiver<Option<Side>> {
        self.running_rx.clone()
    }

    /// Becomes `Some(side)` when that side runs out of time
    pub fn get_flag_rx(&self) -> watch::Receiver<Option<Side>> {
        self.flag_rx.clone()
    }

    pub fn toggle_play_pause(&mut self) -> ClockState {
        if let Some(side) = self.state.expired_side() {
            debug!(
                "{} Ignoring play/pause, {side} is out of time",
                self.status_string()
            );
        } else if let Some(side) = self.state.running_side() {
            self.state.timers[side].is_running = false;
            self.send_running(None);
            info!("{} Paused {side}", self.status_string());
        } else {
            let side = self.state.active_side;
            self.state.timers[side].is_running = true;
            self.state.reset_confirmation_pending = false;
            self.send_running(Some(side));
            info!("{} Started {side}", self.status_string());
        }

        self.state
    }

    /// Hands the turn from `from` to the opponent. Does nothing unless `from` is running.
    pub fn switch_turn(&mut self, from: Side) -> ClockState {
        if !self.state.timers[from].is_running {
            debug!(
                "{} Ignoring switch from {from}, its clock is not running",
                self.status_string()
            );
            return self.state;
        }

        let to = from.other();
        self.state.timers[from].is_running = false;
        self.state.timers[to].is_running = true;
        self.state.active_side = to;
        self.send_running(Some(to));
        info!("{} Turn passed from {from} to {to}", self.status_string());

        self.state
    }

    pub fn on_tick(&mut self, side: Side, elapsed: Duration) -> ClockState {
        let expired = {
            let timer = &mut self.state.timers[side];
            if !timer.is_running {
                debug!("Ignoring a tick of {elapsed:?} for {side}, its clock is not running");
                return self.state;
            }

            timer.remaining = timer.remaining.saturating_sub(elapsed);
            if timer.remaining.is_zero() {
                timer.is_running = false;
                timer.is_expired = true;
                true
            } else {
                false
            }
        };

        trace!("{} Applied a tick of {elapsed:?} to {side}", self.status_string());

        if expired {
            self.send_running(None);
            self.flag_tx.send_replace(Some(side));
            info!("{} {side} ran out of time", self.status_string());
        }

        self.state
    }

    pub fn request_restart(&mut self) -> ClockState {
        self.state.reset_confirmation_pending = true;
        info!("{} Restart requested", self.status_string());
        self.state
    }

    pub fn confirm_restart(&mut self) -> ClockState {
        self.reset();
        info!("{} Restarted", self.status_string());
        self.state
    }

    pub fn cancel_restart(&mut self) -> ClockState {
        self.state.reset_confirmation_pending = false;
        info!("{} Restart cancelled", self.status_string());
        self.state
    }

    pub fn set_preset(&mut self, preset: Preset) -> ClockState {
        self.state.preset = preset;
        self.reset();
        info!("{} Preset changed to {preset}", self.status_string());
        self.state
    }

    fn reset(&mut self) {
        let game_number = self.state.game_number.wrapping_add(1);
        self.state = ClockState {
            game_number,
            ..ClockState::new(self.state.preset)
        };
        self.send_running(None);
        self.flag_tx.send_replace(None);
    }

    fn send_running(&self, running: Option<Side>) {
        self.running_tx.send_replace(running);
    }

    fn status_string(&self) -> String {
        format!(
            "[W {} B {}]",
            self.state.timers.white.time_string(),
            self.state.timers.black.time_string()
        )
    }
}

impl Default for ClockEngine {
    fn default() -> Self {
        Self::new(Preset::default())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use clock_common::clock_snapshot::TimerPhase;
    use crate::initialize_test_logging as initialize;
    use more_asserts::assert_le;

    const SEC: Duration = Duration::from_secs(1);

    fn check_invariants(state: &ClockState) {
        let running = state.timers.iter().filter(|(_, t)| t.is_running).count();
        assert_le!(running, 1);
        if state.is_game_over() {
            assert_eq!(running, 0);
        }
        for (_, timer) in state.timers.iter() {
            assert_le!(timer.remaining, state.preset.duration());
        }
    }

    #[test]
    fn test_start_and_tick() {
        initialize();
        let mut engine = ClockEngine::new(Preset::Blitz);

        let state = engine.toggle_play_pause();
        assert_eq!(state.timers.white.phase(), TimerPhase::Running);
        assert_eq!(state.timers.black.phase(), TimerPhase::Idle);
        assert_eq!(state.timers.white.remaining_millis(), 300_000);

        let mut state = state;
        for _ in 0..10 {
            state = engine.on_tick(Side::White, SEC);
        }
        assert_eq!(state.timers.white.remaining_millis(), 290_000);
        assert!(state.timers.white.is_running);
        assert_eq!(state.timers.black.remaining_millis(), 300_000);
    }

    #[test]
    fn test_pause_and_resume_active_side() {
        initialize();
        let mut engine = ClockEngine::default();
        engine.toggle_play_pause();
        engine.switch_turn(Side::White);

        let state = engine.toggle_play_pause();
        assert_eq!(state.running_side(), None);
        assert_eq!(state.active_side, Side::Black);

        let state = engine.toggle_play_pause();
        assert_eq!(state.running_side(), Some(Side::Black));
    }

    #[test]
    fn test_switch_turn() {
        initialize();
        let mut engine = ClockEngine::default();
        engine.toggle_play_pause();

        let state = engine.switch_turn(Side::White);
        assert_eq!(state.timers.white.phase(), TimerPhase::Idle);
        assert_eq!(state.timers.black.phase(), TimerPhase::Running);
        assert_eq!(state.active_side, Side::Black);

        let state = engine.switch_turn(Side::Black);
        assert_eq!(state.running_side(), Some(Side::White));
        assert_eq!(state.active_side, Side::White);
    }

    #[test]
    fn test_switch_from_idle_side_is_ignored() {
        initialize();
        let mut engine = ClockEngine::default();

        let before = engine.snapshot();
        assert_eq!(engine.switch_turn(Side::White), before);
        assert_eq!(engine.switch_turn(Side::Black), before);

        engine.toggle_play_pause();
        let before = engine.snapshot();
        assert_eq!(engine.switch_turn(Side::Black), before);
        assert_eq!(before.running_side(), Some(Side::White));
    }

    #[test]
    fn test_expiry() {
        initialize();
        let mut engine = ClockEngine::new(Preset::Bullet);
        let flag_rx = engine.get_flag_rx();
        engine.toggle_play_pause();
        engine.switch_turn(Side::White);

        let state = engine.on_tick(Side::Black, Duration::from_millis(119_000));
        assert_eq!(state.timers.black.remaining_millis(), 1_000);
        assert_eq!(*flag_rx.borrow(), None);

        let state = engine.on_tick(Side::Black, SEC);
        assert_eq!(state.timers.black.remaining_millis(), 0);
        assert!(state.timers.black.is_expired);
        assert!(!state.timers.black.is_running);
        assert_eq!(*flag_rx.borrow(), Some(Side::Black));
        assert_eq!(*engine.get_running_rx().borrow(), None);

        let state = engine.toggle_play_pause();
        assert_eq!(state.running_side(), None);
        let state = engine.switch_turn(Side::Black);
        assert_eq!(state.running_side(), None);
        assert!(state.timers.black.is_expired);
    }

    #[test]
    fn test_tick_floors_at_zero() {
        initialize();
        let mut engine = ClockEngine::new(Preset::Bullet);
        engine.toggle_play_pause();

        let state = engine.on_tick(Side::White, Duration::from_secs(500));
        assert_eq!(state.timers.white.remaining, Duration::ZERO);
        assert_eq!(state.timers.white.phase(), TimerPhase::Expired);
        assert_eq!(state.expired_side(), Some(Side::White));
    }

    #[test]
    fn test_ticks_for_stopped_side_are_ignored() {
        initialize();
        let mut engine = ClockEngine::default();

        let before = engine.snapshot();
        assert_eq!(engine.on_tick(Side::White, SEC), before);

        engine.toggle_play_pause();
        engine.switch_turn(Side::White);
        let before = engine.snapshot();
        assert_eq!(engine.on_tick(Side::White, SEC), before);

        let mut engine = ClockEngine::new(Preset::Bullet);
        engine.toggle_play_pause();
        engine.on_tick(Side::White, Duration::from_secs(120));
        let expired = engine.snapshot();
        assert_eq!(engine.on_tick(Side::White, SEC), expired);
    }

    #[test]
    fn test_restart_prompt() {
        initialize();
        let mut engine = ClockEngine::default();
        engine.toggle_play_pause();
        engine.on_tick(Side::White, Duration::from_secs(7));
        let before = engine.snapshot();

        let state = engine.request_restart();
        assert!(state.reset_confirmation_pending);
        assert_eq!(state.timers, before.timers);

        let state = engine.cancel_restart();
        assert!(!state.reset_confirmation_pending);
        assert_eq!(state, before);
    }

    #[test]
    fn test_confirm_restart() {
        initialize();
        let mut engine = ClockEngine::new(Preset::Bullet);
        let running_rx = engine.get_running_rx();
        engine.toggle_play_pause();
        engine.switch_turn(Side::White);
        engine.on_tick(Side::Black, Duration::from_secs(120));
        assert_eq!(*engine.get_flag_rx().borrow(), Some(Side::Black));

        engine.request_restart();
        let state = engine.confirm_restart();
        for (_, timer) in state.timers.iter() {
            assert_eq!(timer.remaining_millis(), 120_000);
            assert!(!timer.is_running);
            assert!(!timer.is_expired);
        }
        assert_eq!(state.active_side, Side::White);
        assert!(!state.reset_confirmation_pending);
        assert_eq!(state.preset, Preset::Bullet);
        assert_eq!(state.game_number, 1);
        assert_eq!(*running_rx.borrow(), None);
        assert_eq!(*engine.get_flag_rx().borrow(), None);
    }

    #[test]
    fn test_set_preset_while_running() {
        initialize();
        let mut engine = ClockEngine::new(Preset::Bullet);
        engine.toggle_play_pause();
        engine.on_tick(Side::White, Duration::from_secs(70));
        assert_eq!(engine.snapshot().timers.white.remaining_millis(), 50_000);
        engine.request_restart();

        let state = engine.set_preset(Preset::Bullet);
        for (_, timer) in state.timers.iter() {
            assert_eq!(timer.remaining_millis(), 120_000);
            assert_eq!(timer.phase(), TimerPhase::Idle);
        }
        assert_eq!(state.active_side, Side::White);
        assert!(!state.reset_confirmation_pending);

        let state = engine.set_preset(Preset::Rapid);
        assert_eq!(state.preset, Preset::Rapid);
        assert_eq!(state.timers.black.remaining_millis(), 1_500_000);
        assert_eq!(state.game_number, 2);
    }

    #[test]
    fn test_resume_dismisses_restart_prompt() {
        initialize();
        let mut engine = ClockEngine::default();
        engine.request_restart();
        let state = engine.toggle_play_pause();
        assert!(!state.reset_confirmation_pending);
        assert_eq!(state.running_side(), Some(Side::White));

        engine.request_restart();
        let state = engine.toggle_play_pause();
        assert_eq!(state.running_side(), None);
        assert!(state.reset_confirmation_pending);
    }

    #[test]
    fn test_running_channel_follows_engine() {
        initialize();
        let mut engine = ClockEngine::default();
        let mut running_rx = engine.get_running_rx();
        assert_eq!(*running_rx.borrow_and_update(), None);

        engine.toggle_play_pause();
        assert!(running_rx.has_changed().unwrap());
        assert_eq!(*running_rx.borrow_and_update(), Some(Side::White));

        engine.switch_turn(Side::White);
        assert_eq!(*running_rx.borrow_and_update(), Some(Side::Black));

        engine.switch_turn(Side::White);
        assert!(!running_rx.has_changed().unwrap());

        engine.toggle_play_pause();
        assert_eq!(*running_rx.borrow_and_update(), None);
    }

    #[test]
    fn test_invariants_hold_over_mixed_operations() {
        initialize();
        let mut engine = ClockEngine::new(Preset::Bullet);
        let mut flags_seen = 0;
        let mut flag_rx = engine.get_flag_rx();

        for step in 0u64..2_000 {
            let state = match step % 11 {
                0 | 5 => engine.toggle_play_pause(),
                1 => engine.switch_turn(Side::White),
                2 => engine.switch_turn(Side::Black),
                3 | 4 | 6 | 8 => {
                    let side = engine.snapshot().running_side().unwrap_or(Side::White);
                    engine.on_tick(side, Duration::from_millis(700 + step % 3_000))
                }
                7 => engine.request_restart(),
                9 => engine.cancel_restart(),
                10 if step < 11 || (1_500..1_512).contains(&step) => engine.confirm_restart(),
                _ => engine.on_tick(Side::Black, SEC),
            };
            check_invariants(&state);

            if flag_rx.has_changed().unwrap() && flag_rx.borrow_and_update().is_some() {
                flags_seen += 1;
            }
        }

        assert_eq!(flags_seen, 2);
    }
}
