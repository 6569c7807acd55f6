use derivative::Derivative;
use log::*;
use serde::{Deserialize, Serialize};
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::{
        mpsc::{UnboundedSender, unbounded_channel},
        watch::{self, Sender},
    },
    task::{self, JoinHandle},
    time::{Duration, sleep},
};
use toml::Table;

const BELL: &[u8] = b"\x07";
const BUZZER_REPEATS: usize = 3;
const BUZZER_GAP: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Derivative)]
#[derivative(Default)]
pub struct SoundSettings {
    #[derivative(Default(value = "true"))]
    pub sound_enabled: bool,
    #[derivative(Default(value = "true"))]
    pub click_enabled: bool,
    #[derivative(Default(value = "true"))]
    pub buzzer_enabled: bool,
}

impl SoundSettings {
    pub fn migrate(old: &Table) -> Self {
        let Self {
            mut sound_enabled,
            mut click_enabled,
            mut buzzer_enabled,
        } = Default::default();

        if let Some(old_sound_enabled) = old.get("sound_enabled") {
            if let Some(old_sound_enabled) = old_sound_enabled.as_bool() {
                sound_enabled = old_sound_enabled;
            }
        }
        if let Some(old_click_enabled) = old.get("click_enabled") {
            if let Some(old_click_enabled) = old_click_enabled.as_bool() {
                click_enabled = old_click_enabled;
            }
        }
        if let Some(old_buzzer_enabled) = old.get("buzzer_enabled") {
            if let Some(old_buzzer_enabled) = old_buzzer_enabled.as_bool() {
                buzzer_enabled = old_buzzer_enabled;
            }
        }

        Self {
            sound_enabled,
            click_enabled,
            buzzer_enabled,
        }
    }

    fn allows(&self, msg: &SoundMessage) -> bool {
        self.sound_enabled
            && match msg {
                SoundMessage::TriggerClick => self.click_enabled,
                SoundMessage::TriggerBuzzer => self.buzzer_enabled,
            }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SoundMessage {
    TriggerClick,
    TriggerBuzzer,
}

/// Plays cues by ringing the terminal bell on `out`
pub struct SoundController {
    msg_tx: UnboundedSender<SoundMessage>,
    stop_tx: Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SoundController {
    pub fn new<W>(settings: SoundSettings, mut out: W) -> Self
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (msg_tx, mut msg_rx) = unbounded_channel();

        let (stop_tx, mut stop_rx) = watch::channel(false);
        stop_rx.borrow_and_update();

        let handler = task::spawn(async move {
            loop {
                tokio::select! {
                    msg = msg_rx.recv() => {
                        let Some(msg) = msg else { break };

                        if !settings.allows(&msg) {
                            trace!("Sound disabled, skipping {msg:?}");
                            continue;
                        }

                        let repeats = match msg {
                            SoundMessage::TriggerClick => {
                                debug!("Playing click");
                                1
                            }
                            SoundMessage::TriggerBuzzer => {
                                info!("Playing buzzer");
                                BUZZER_REPEATS
                            }
                        };

                        for i in 0..repeats {
                            if i > 0 {
                                sleep(BUZZER_GAP).await;
                            }
                            if let Err(e) = ring(&mut out).await {
                                warn!("Failed to play sound: {e}");
                                break;
                            }
                        }
                    }
                    _ = stop_rx.changed() => {
                        break;
                    }
                }
            }
        });

        Self {
            msg_tx,
            stop_tx,
            tasks: vec![handler],
        }
    }

    pub fn trigger_click(&self) {
        if self.msg_tx.send(SoundMessage::TriggerClick).is_err() {
            warn!("Sound task is gone, dropping click");
        }
    }

    pub fn trigger_buzzer(&self) {
        if self.msg_tx.send(SoundMessage::TriggerBuzzer).is_err() {
            warn!("Sound task is gone, dropping buzzer");
        }
    }

    pub async fn stop(mut self) {
        if self.stop_tx.send(true).is_err() {
            return;
        }

        for join_handle in self.tasks.drain(..) {
            if let Err(e) = join_handle.await {
                error!("Sound task failed: {e}");
            }
        }
    }
}

async fn ring<W: AsyncWrite + Unpin>(out: &mut W) -> std::io::Result<()> {
    out.write_all(BELL).await?;
    out.flush().await
}
