use clock_common::{
    clock_snapshot::{ClockState, TimerPhase, TimerState},
    preset::Preset,
    side::Side,
};

fn phase_label(phase: TimerPhase) -> &'static str {
    match phase {
        TimerPhase::Idle => "idle",
        TimerPhase::Running => "running",
        TimerPhase::Expired => "flag",
    }
}

fn timer_text(side: Side, timer: &TimerState) -> String {
    format!(
        "{side} {} [{}]",
        timer.time_string(),
        phase_label(timer.phase())
    )
}

/// e.g. `White 04:58 [running] | Black 05:00 [idle] | Blitz (05:00)`
pub fn build_status_line(snapshot: &ClockState) -> String {
    format!(
        "{} | {} | {}",
        timer_text(Side::White, snapshot.timer(Side::White)),
        timer_text(Side::Black, snapshot.timer(Side::Black)),
        snapshot.preset.label()
    )
}

pub fn build_game_over_text(side: Side) -> String {
    format!("{side} ran out of time. Type `r` to start a new game.")
}

pub const RESTART_PROMPT: &str = "Restart the game? [y/n]";

pub fn build_preset_list(current: Preset) -> String {
    Preset::all()
        .map(|p| {
            let marker = if p == current { '*' } else { ' ' };
            format!("{marker} {}", p.label())
        })
        .collect::<Vec<_>>()
        .join("\n")
}
