//! Tick driver — the polling loop behind a [`PlayerEngine`].
//!
//! One driver runs per loaded material.  It is a tokio task calling
//! `engine.tick()` on a fixed cadence; dropping the [`PlayerDriver`]
//! aborts the task, so a driver can never outlive its material and
//! mutate state after the session moved on.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::engine::PlayerEngine;

/// Cadence for media-backed clocks — roughly one animation frame, for
/// sub-100ms boundary precision.
pub const MEDIA_TICK: Duration = Duration::from_millis(16);

/// Cadence for the simulated clock.
pub const TIMER_TICK: Duration = Duration::from_millis(100);

/// RAII guard around the tick task.  Dropping it cancels the loop.
pub struct PlayerDriver {
    handle: JoinHandle<()>,
}

impl PlayerDriver {
    /// Spawn a tick loop over `engine` with the given `period`.
    ///
    /// Must be called from within a tokio runtime.  The engine lock is
    /// held only for the duration of a single `tick()`.
    pub fn spawn(engine: Arc<Mutex<PlayerEngine>>, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                match engine.lock() {
                    Ok(mut engine) => {
                        engine.tick();
                    }
                    Err(_) => {
                        log::error!("player driver: engine lock poisoned, stopping");
                        break;
                    }
                }
            }
        });
        Self { handle }
    }

    /// Stop the loop explicitly (drop does the same).
    pub fn shutdown(self) {
        self.handle.abort();
    }
}

impl Drop for PlayerDriver {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::clock::TimerClock;
    use crate::player::engine::{LoopSetting, PlaybackMode};
    use crate::segment::Segment;

    fn engine() -> Arc<Mutex<PlayerEngine>> {
        let segments = vec![Segment::new("a unit of text", 0.0, 30.0)];
        Arc::new(Mutex::new(PlayerEngine::new(
            segments,
            Box::new(TimerClock::new(30.0)),
            PlaybackMode::Sentence,
            LoopSetting::Count(1),
        )))
    }

    #[tokio::test]
    async fn driver_ticks_the_engine() {
        let engine = engine();
        engine.lock().unwrap().play();

        let driver = PlayerDriver::spawn(Arc::clone(&engine), Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(40)).await;
        driver.shutdown();

        // Ticks resolved the active segment from the running clock.
        assert_eq!(engine.lock().unwrap().cursor().active_index, 0);
    }

    #[tokio::test]
    async fn drop_tears_the_loop_down() {
        let engine = engine();
        {
            let _driver = PlayerDriver::spawn(Arc::clone(&engine), Duration::from_millis(5));
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        // After drop, no further ticks: the Arc is again uniquely held
        // once the aborted task has been reaped.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(Arc::strong_count(&engine), 1);
    }
}
