use clock_common::side::Side;
use log::*;
use tokio::{
    sync::{mpsc::UnboundedSender, watch},
    task::{self, JoinHandle},
    time::{Duration, Instant, sleep_until},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub side: Side,
    pub elapsed: Duration,
}

/// Delivers a [`Tick`] every `interval` for whichever side the running channel names.
///
/// The interval restarts from zero whenever the running side changes, so a tick never spans
/// two sides.
pub struct Ticker {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Ticker {
    pub fn spawn(
        mut running_rx: watch::Receiver<Option<Side>>,
        interval: Duration,
        tick_tx: UnboundedSender<Tick>,
    ) -> Self {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        stop_rx.borrow_and_update();

        let task = task::spawn(async move {
            let mut running = *running_rx.borrow_and_update();
            let mut last_time = Instant::now();
            debug!("Ticker started, running side: {running:?}");

            loop {
                let next_time = last_time + interval;

                tokio::select! {
                    biased;

                    _ = stop_rx.changed() => break,
                    changed = running_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        running = *running_rx.borrow_and_update();
                        last_time = Instant::now();
                        debug!("Ticker now following {running:?}");
                    }
                    _ = sleep_until(next_time), if running.is_some() => {
                        let Some(side) = running else { continue };
                        let now = Instant::now();
                        let tick = Tick {
                            side,
                            elapsed: now.duration_since(last_time),
                        };
                        last_time = now;

                        trace!("Sending {tick:?}");
                        if tick_tx.send(tick).is_err() {
                            break;
                        }
                    }
                }
            }

            debug!("Ticker stopped");
        });

        Self { stop_tx, task }
    }

    pub async fn stop(self) {
        if self.stop_tx.send(true).is_err() {
            return;
        }

        if let Err(e) = self.task.await {
            error!("Ticker task failed: {e}");
        }
    }
}
