use crate::ticker::Tick;
use clock_common::{
    preset::{Preset, PresetError},
    side::Side,
};
use std::str::FromStr;
use thiserror::Error;

pub const HELP_TEXT: &str = "\
Commands:
  w, white        White finished a move, start Black's clock
  b, black        Black finished a move, start White's clock
  p, play, pause  Pause the running clock, or resume whoever's turn it is
  r, restart      Restart the game (asks for confirmation)
  y, yes / n, no  Answer the restart question
  mode <name>     Change the time control and restart: rapid, blitz or bullet
  modes           List the time controls
  h, help         Show this text
  q, quit         Exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    TogglePlayPause,
    SwitchTurn(Side),
    RequestRestart,
    ConfirmRestart,
    CancelRestart,
    SetPreset(Preset),
    ShowPresets,
    ShowHelp,
    Tick(Tick),
    Quit,
    NoAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseMessageError {
    #[error("Unknown command {0:?}, type `help` for a list of commands")]
    UnknownCommand(String),
    #[error("`mode` needs the name of a time control, type `modes` to list them")]
    MissingPreset,
    #[error(transparent)]
    Preset(#[from] PresetError),
}

impl FromStr for Message {
    type Err = ParseMessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim().to_ascii_lowercase();
        let mut words = line.split_whitespace();

        let Some(command) = words.next() else {
            return Ok(Self::NoAction);
        };

        let message = match command {
            "w" | "white" => Self::SwitchTurn(Side::White),
            "b" | "black" => Self::SwitchTurn(Side::Black),
            "p" | "play" | "pause" => Self::TogglePlayPause,
            "r" | "restart" => Self::RequestRestart,
            "y" | "yes" => Self::ConfirmRestart,
            "n" | "no" => Self::CancelRestart,
            "mode" => {
                let name = words.next().ok_or(ParseMessageError::MissingPreset)?;
                Self::SetPreset(name.parse()?)
            }
            "modes" => Self::ShowPresets,
            "h" | "help" | "?" => Self::ShowHelp,
            "q" | "quit" | "exit" => Self::Quit,
            _ => return Err(ParseMessageError::UnknownCommand(s.trim().to_string())),
        };

        Ok(message)
    }
}
