use std::time::Duration;

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{
        interval_at,
        Instant,
        MissedTickBehavior,
    },
};

use super::{
    Phase,
    SpellingGame,
};

const TICK: Duration = Duration::from_secs(1);

/// Owns a one-second ticker task. Dropping the handle aborts the task, so a
/// torn-down screen never receives another tick.
pub struct Countdown {
    ticks: mpsc::UnboundedReceiver<u32>,
    join_handle: JoinHandle<()>,
}

impl Countdown {
    /// Emits the remaining count once per second: `seconds - 1` down to 0.
    /// Must be called inside a tokio runtime.
    pub fn start(seconds: u32) -> Self {
        let (sender, ticks) = mpsc::unbounded_channel();
        let join_handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + TICK, TICK);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut remaining = seconds;
            while remaining > 0 {
                interval.tick().await;
                remaining -= 1;
                if sender.send(remaining).is_err() {
                    break;
                }
            }
        });
        Self { ticks, join_handle }
    }

    /// Next remaining count, or `None` once the countdown ends or is cancelled.
    pub async fn next_tick(&mut self) -> Option<u32> {
        self.ticks.recv().await
    }

    pub fn cancel(&self) {
        self.join_handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.join_handle.is_finished()
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.join_handle.abort();
    }
}

/// Drives the reveal phase in real time and returns the phase it ends in.
pub async fn run_reveal(game: &mut SpellingGame) -> Phase {
    let Phase::Revealing { remaining } = game.phase() else {
        return game.phase();
    };

    let mut countdown = Countdown::start(remaining);
    while countdown.next_tick().await.is_some() {
        if !matches!(game.tick(), Phase::Revealing { .. }) {
            break;
        }
    }
    game.phase()
}
