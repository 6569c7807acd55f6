use crate::{clock_engine::ClockEngine, config::Config, sound_controller::*, ticker::*};
use clock_common::{
    clock_snapshot::{ClockState, ClockTransition},
    preset::Preset,
    side::Side,
};
use log::*;
use message::{HELP_TEXT, Message};
use thiserror::Error;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt},
    sync::{
        mpsc::{UnboundedReceiver, unbounded_channel},
        watch,
    },
};

pub(crate) mod message;

mod view;
use view::*;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to read input: {0}")]
    Input(#[source] std::io::Error),
    #[error("Failed to write output: {0}")]
    Output(#[source] std::io::Error),
}

#[derive(Debug)]
pub struct ChessClockAppFlags {
    pub config: Config,
    /// Overrides `config.clock.default_preset` for this run
    pub preset: Option<Preset>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

enum Input {
    Line(Option<String>),
    Tick(Option<Tick>),
}

pub struct ChessClockApp {
    engine: ClockEngine,
    snapshot: ClockState,
    sound: SoundController,
    ticker: Ticker,
    tick_rx: UnboundedReceiver<Tick>,
    flag_rx: watch::Receiver<Option<Side>>,
    last_status: String,
    output: Vec<String>,
}

impl ChessClockApp {
    /// Must be called from within a tokio runtime
    pub fn new<S>(flags: ChessClockAppFlags, sound_out: S) -> Self
    where
        S: AsyncWrite + Unpin + Send + 'static,
    {
        let ChessClockAppFlags { config, preset } = flags;
        let preset = preset.unwrap_or(config.clock.default_preset);
        info!(
            "Creating clock with preset {preset} and a tick every {:?}",
            config.clock.tick_interval
        );

        let engine = ClockEngine::new(preset);
        let (tick_tx, tick_rx) = unbounded_channel();
        let ticker = Ticker::spawn(engine.get_running_rx(), config.clock.tick_interval, tick_tx);
        let sound = SoundController::new(config.sound, sound_out);
        let mut flag_rx = engine.get_flag_rx();
        flag_rx.borrow_and_update();
        let snapshot = engine.snapshot();
        let last_status = build_status_line(&snapshot);

        Self {
            engine,
            snapshot,
            sound,
            ticker,
            tick_rx,
            flag_rx,
            output: vec![HELP_TEXT.to_string(), last_status.clone()],
            last_status,
        }
    }

    fn apply_snapshot(&mut self, new_snapshot: ClockState) {
        let transitions = self.snapshot.transitions_to(&new_snapshot);
        self.maybe_play_sound(&transitions);

        for transition in &transitions {
            match transition {
                ClockTransition::Expired(side) => self.output.push(build_game_over_text(*side)),
                ClockTransition::RestartRequested => self.output.push(RESTART_PROMPT.to_string()),
                ClockTransition::PresetChanged(preset) => self
                    .output
                    .push(format!("Time control set to {}", preset.label())),
                ClockTransition::Reset => self.output.push("New game".to_string()),
                ClockTransition::Started(_)
                | ClockTransition::Paused(_)
                | ClockTransition::TurnSwitched { .. }
                | ClockTransition::RestartCancelled => {}
            }
        }

        let status = build_status_line(&new_snapshot);
        if status != self.last_status {
            self.output.push(status.clone());
            self.last_status = status;
        }

        self.snapshot = new_snapshot;
    }

    fn maybe_play_sound(&mut self, transitions: &[ClockTransition]) {
        let play_click = transitions.iter().any(|t| {
            matches!(
                t,
                ClockTransition::Started(_)
                    | ClockTransition::Paused(_)
                    | ClockTransition::TurnSwitched { .. }
            )
        });
        let play_buzzer = matches!(self.flag_rx.has_changed(), Ok(true))
            && self.flag_rx.borrow_and_update().is_some();

        if play_buzzer {
            info!("Triggering buzzer");
            self.sound.trigger_buzzer();
        } else if play_click {
            trace!("Triggering click");
            self.sound.trigger_click();
        }
    }

    fn update(&mut self, message: Message) -> Flow {
        trace!("Handling message: {message:?}");

        let new_snapshot = match message {
            Message::TogglePlayPause => self.engine.toggle_play_pause(),
            Message::SwitchTurn(side) => self.engine.switch_turn(side),
            Message::RequestRestart => {
                // There is nothing to protect once a flag has fallen
                if self.snapshot.is_game_over() {
                    self.engine.confirm_restart()
                } else {
                    self.engine.request_restart()
                }
            }
            Message::ConfirmRestart | Message::CancelRestart
                if !self.snapshot.reset_confirmation_pending =>
            {
                debug!("Ignoring {message:?}, no restart was requested");
                return Flow::Continue;
            }
            Message::ConfirmRestart => self.engine.confirm_restart(),
            Message::CancelRestart => self.engine.cancel_restart(),
            Message::SetPreset(preset) => self.engine.set_preset(preset),
            Message::Tick(Tick { side, elapsed }) => self.engine.on_tick(side, elapsed),
            Message::ShowPresets => {
                self.output.push(build_preset_list(self.snapshot.preset));
                return Flow::Continue;
            }
            Message::ShowHelp => {
                self.output.push(HELP_TEXT.to_string());
                return Flow::Continue;
            }
            Message::Quit => {
                info!("Quitting");
                return Flow::Quit;
            }
            Message::NoAction => return Flow::Continue,
        };

        self.apply_snapshot(new_snapshot);
        Flow::Continue
    }

    async fn flush<W: AsyncWrite + Unpin>(&mut self, out: &mut W) -> Result<(), AppError> {
        for line in self.output.drain(..) {
            out.write_all(line.as_bytes())
                .await
                .map_err(AppError::Output)?;
            out.write_all(b"\n").await.map_err(AppError::Output)?;
        }
        out.flush().await.map_err(AppError::Output)
    }

    /// Reads one intent per line from `input` until it ends or the user quits
    pub async fn run<R, W>(mut self, input: R, mut out: W) -> Result<(), AppError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();

        let result = loop {
            if let Err(e) = self.flush(&mut out).await {
                break Err(e);
            }

            let input = tokio::select! {
                line = lines.next_line() => match line {
                    Ok(line) => Input::Line(line),
                    Err(e) => break Err(AppError::Input(e)),
                },
                tick = self.tick_rx.recv() => Input::Tick(tick),
            };

            let message = match input {
                Input::Line(None) => Message::Quit,
                Input::Line(Some(line)) => match line.parse::<Message>() {
                    Ok(message) => message,
                    Err(e) => {
                        warn!("Bad input {line:?}: {e}");
                        self.output.push(e.to_string());
                        continue;
                    }
                },
                Input::Tick(Some(tick)) => Message::Tick(tick),
                Input::Tick(None) => {
                    error!("Ticker stopped unexpectedly");
                    Message::Quit
                }
            };

            if self.update(message) == Flow::Quit {
                break self.flush(&mut out).await;
            }
        };

        let Self { ticker, sound, .. } = self;
        ticker.stop().await;
        sound.stop().await;

        result
    }
}
